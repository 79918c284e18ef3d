//! Linking work items to pull requests through `vstfs:` artifact URLs.

use serde_json::{Value, json};

use super::models::PullRequest;

/// Parse `--work-items=1,2,3`.
///
/// Entries are read as numbers, so `1.0` and `1e2` count as 1 and 100.
/// Non-numeric, fractional and non-positive entries are dropped, duplicates
/// removed, first-seen order kept.
pub fn parse_work_item_ids(raw: Option<&str>) -> Vec<u64> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let mut ids = Vec::new();
    for part in raw.split(',') {
        let Some(id) = whole_positive(part) else {
            continue;
        };
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn whole_positive(raw: &str) -> Option<u64> {
    let numeric = raw.trim().parse::<f64>().ok()?;
    if !numeric.is_finite() || numeric < 1.0 || numeric.fract() != 0.0 || numeric > u64::MAX as f64 {
        return None;
    }
    Some(numeric as u64)
}

/// `vstfs:///Git/PullRequestId/<projectId>%2F<repoId>%2F<prId>`, or `None`
/// when any of the three ids is missing.
pub fn build_pull_request_artifact_url(pr: Option<&PullRequest>) -> Option<String> {
    let pr = pr?;
    let repository = pr.repository.as_ref()?;
    let repo_id = repository.id.as_deref().filter(|s| !s.is_empty())?;
    let project_id = repository
        .project
        .as_ref()?
        .id
        .as_deref()
        .filter(|s| !s.is_empty())?;
    let pr_id = pr.pull_request_id.filter(|id| *id > 0)?;

    Some(format!(
        "vstfs:///Git/PullRequestId/{project_id}%2F{repo_id}%2F{pr_id}"
    ))
}

/// JSON-patch document adding an `ArtifactLink` relation to a work item.
pub fn artifact_link_patch(artifact_url: &str) -> Value {
    json!([
        {
            "op": "add",
            "path": "/relations/-",
            "value": {
                "rel": "ArtifactLink",
                "url": artifact_url,
                "attributes": { "name": "Pull Request" }
            }
        }
    ])
}
