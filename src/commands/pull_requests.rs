use anyhow::{Context, Result, bail};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::{display_id, require_id};
use crate::azure_devops::cherry_pick::{
    cherry_pick_request_body, parse_cherry_pick_args, to_ref_name,
};
use crate::azure_devops::links::{
    artifact_link_patch, build_pull_request_artifact_url, parse_work_item_ids,
};
use crate::azure_devops::models::{CherryPick, ListResponse, PolicyConfiguration, PullRequest};
use crate::azure_devops::policy::optional_work_item_policy_ids;
use crate::azure_devops::{
    AzureDevOpsClient, JSON_PATCH, RequestOptions, encode_path_segment, encode_query_value,
};
use crate::config::Config;
use crate::error::UsageError;
use crate::options::{bounded_top, parse_option_args};
use crate::ui::output::print_json;

const PR_GET_USAGE: &str = "pr-get <id> [repo]";
const PR_APPROVE_USAGE: &str = "pr-approve <id> [repo]";
const PR_AUTOCOMPLETE_USAGE: &str = "pr-autocomplete <id> [repo]";
const PR_CREATE_USAGE: &str = "pr-create --title=... --source=feature/x --target=develop [--description=...] [--repo=...] [--work-items=123,456]";
const PR_UPDATE_USAGE: &str =
    "pr-update <id> [--title=...] [--description=...] [--repo=...] [--work-items=123,456]";

const PRS_DEFAULT_STATUS: &str = "active";
const PRS_DEFAULT_TOP: u32 = 10;
const PRS_MAX_TOP: u32 = 50;

/// Reviewer vote meaning "approved".
const VOTE_APPROVED: i32 = 10;

pub async fn prs(
    client: &AzureDevOpsClient,
    config: &Config,
    status: Option<&str>,
    top: Option<&str>,
    repo: Option<&str>,
) -> Result<()> {
    let status = status
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(PRS_DEFAULT_STATUS);
    let top = bounded_top(top, PRS_DEFAULT_TOP, PRS_MAX_TOP);
    let repo = config.pick_repo(repo);

    let path = client.repo_path(
        repo,
        &format!(
            "/pullrequests?searchCriteria.status={}&$top={top}",
            encode_query_value(status)
        ),
    );
    let result: ListResponse<PullRequest> = client.get(&path).await?.unwrap_or_default();

    for pr in &result.value {
        println!("{}", format_pr_line(pr));
    }
    Ok(())
}

pub fn format_pr_line(pr: &PullRequest) -> String {
    format!(
        "#{}\t[{}]\t{}\t({})",
        display_id(pr.pull_request_id),
        pr.status.as_deref().unwrap_or("unknown"),
        pr.title.as_deref().unwrap_or("(no title)"),
        pr.created_by_name().unwrap_or("unknown"),
    )
}

async fn fetch_pull_request(client: &AzureDevOpsClient, repo: &str, id: u64) -> Result<Option<PullRequest>> {
    let path = client.repo_path(repo, &format!("/pullrequests/{id}"));
    Ok(client.get(&path).await?)
}

pub async fn pr_get(client: &AzureDevOpsClient, config: &Config, id_raw: &str, repo: Option<&str>) -> Result<()> {
    let id = require_id(id_raw, PR_GET_USAGE)?;
    let repo = config.pick_repo(repo);

    let pr = fetch_pull_request(client, repo, u64::from(id))
        .await?
        .unwrap_or_default();
    print_json(&pull_request_summary(&pr))
}

pub fn pull_request_summary(pr: &PullRequest) -> Value {
    json!({
        "id": pr.pull_request_id,
        "title": pr.title,
        "status": pr.status,
        "createdBy": pr.created_by_name(),
        "createdById": pr.created_by_id(),
        "sourceRef": pr.source_ref_name,
        "targetRef": pr.target_ref_name,
        "url": pr.url,
    })
}

pub async fn pr_create(client: &AzureDevOpsClient, config: &Config, args: &[String]) -> Result<()> {
    let parsed = parse_option_args(args);
    parsed
        .ensure_allowed(
            &["title", "source", "target", "description", "repo", "work-items"],
            "pr-create",
        )
        .map_err(|e| e.with_usage(PR_CREATE_USAGE))?;
    parsed
        .ensure_max_positionals(0)
        .map_err(|e| e.with_usage(PR_CREATE_USAGE))?;

    let (Some(title), Some(source), Some(target)) = (
        parsed.non_empty_text("title"),
        parsed.non_empty_text("source"),
        parsed.non_empty_text("target"),
    ) else {
        return Err(UsageError::usage(PR_CREATE_USAGE).into());
    };

    let repo = config.pick_repo(parsed.text("repo"));
    let work_item_ids = parse_work_item_ids(parsed.text("work-items"));

    let body = json!({
        "title": title,
        "description": parsed.text("description").unwrap_or_default(),
        "sourceRefName": to_ref_name(source),
        "targetRefName": to_ref_name(target),
    });

    let path = client.repo_path(repo, "/pullrequests");
    let created: PullRequest = client
        .request_as(&path, RequestOptions::post(body))
        .await?
        .unwrap_or_default();

    println!(
        "Created PR #{}: {}",
        display_id(created.pull_request_id),
        created.title.as_deref().unwrap_or(title)
    );

    if !work_item_ids.is_empty() {
        let id = created
            .pull_request_id
            .context("Azure DevOps did not return an id for the created pull request")?;
        // The create response does not always carry the project id.
        let fetched = fetch_pull_request(client, repo, id).await?;
        link_work_items_to_pr(client, fetched.as_ref(), &work_item_ids).await?;
    }

    Ok(())
}

pub async fn pr_update(client: &AzureDevOpsClient, config: &Config, id_raw: &str, args: &[String]) -> Result<()> {
    let id = require_id(id_raw, PR_UPDATE_USAGE)?;

    let parsed = parse_option_args(args);
    parsed
        .ensure_allowed(&["title", "description", "repo", "work-items"], "pr-update")
        .map_err(|e| e.with_usage(PR_UPDATE_USAGE))?;
    parsed
        .ensure_max_positionals(0)
        .map_err(|e| e.with_usage(PR_UPDATE_USAGE))?;

    let repo = config.pick_repo(parsed.text("repo"));
    let work_item_ids = parse_work_item_ids(parsed.text("work-items"));

    let mut body = Map::new();
    for key in ["title", "description"] {
        if let Some(value) = parsed.text(key) {
            body.insert(key.to_string(), Value::String(value.to_string()));
        }
    }

    if body.is_empty() && work_item_ids.is_empty() {
        return Err(UsageError::usage(PR_UPDATE_USAGE).into());
    }

    let updated = if body.is_empty() {
        fetch_pull_request(client, repo, u64::from(id)).await?
    } else {
        let path = client.repo_path(repo, &format!("/pullrequests/{id}"));
        let updated: Option<PullRequest> = client
            .request_as(&path, RequestOptions::patch(Value::Object(body)))
            .await?;
        let pr = updated.clone().unwrap_or_default();
        println!(
            "Updated PR #{}: {}",
            display_id(pr.pull_request_id.or(Some(u64::from(id)))),
            pr.title.as_deref().unwrap_or("(no title)")
        );
        updated
    };

    if !work_item_ids.is_empty() {
        link_work_items_to_pr(client, updated.as_ref(), &work_item_ids).await?;
    }

    Ok(())
}

/// Add an `ArtifactLink` relation to the PR on every work item, one at a time.
async fn link_work_items_to_pr(
    client: &AzureDevOpsClient,
    pr: Option<&PullRequest>,
    work_item_ids: &[u64],
) -> Result<()> {
    let Some(artifact_url) = build_pull_request_artifact_url(pr) else {
        bail!("Unable to resolve PR artifact URL required to link work items.");
    };
    let pr_id = display_id(pr.and_then(|p| p.pull_request_id));

    for work_item_id in work_item_ids {
        let path = client.project_path(&format!("/_apis/wit/workitems/{work_item_id}"));
        client
            .request(
                &path,
                RequestOptions::patch(artifact_link_patch(&artifact_url)).content_type(JSON_PATCH),
            )
            .await
            .with_context(|| format!("Failed to link work item #{work_item_id}"))?;

        println!("Linked work item #{} to PR #{}", work_item_id, pr_id);
    }

    Ok(())
}

pub async fn pr_approve(client: &AzureDevOpsClient, config: &Config, id_raw: &str, repo: Option<&str>) -> Result<()> {
    let id = require_id(id_raw, PR_APPROVE_USAGE)?;
    let repo = config.pick_repo(repo);

    let pr = fetch_pull_request(client, repo, u64::from(id))
        .await?
        .unwrap_or_default();
    let Some(reviewer_id) = pr.created_by_id() else {
        bail!("Could not determine reviewer id from PR createdBy.");
    };

    let path = client.repo_path(
        repo,
        &format!(
            "/pullrequests/{id}/reviewers/{}",
            encode_path_segment(reviewer_id)
        ),
    );
    client
        .request(&path, RequestOptions::put(json!({ "vote": VOTE_APPROVED })))
        .await?;

    println!("Approved PR #{} as reviewer {}", id, reviewer_id);
    Ok(())
}

pub async fn pr_autocomplete(
    client: &AzureDevOpsClient,
    config: &Config,
    id_raw: &str,
    repo: Option<&str>,
) -> Result<()> {
    let id = require_id(id_raw, PR_AUTOCOMPLETE_USAGE)?;
    let repo = config.pick_repo(repo);

    let pr = fetch_pull_request(client, repo, u64::from(id))
        .await?
        .unwrap_or_default();
    let Some(user_id) = pr.created_by_id() else {
        bail!("Could not determine user id from PR createdBy.");
    };

    let policies: ListResponse<PolicyConfiguration> = client
        .get(&client.project_path("/_apis/policy/configurations"))
        .await?
        .unwrap_or_default();
    let ignored = optional_work_item_policy_ids(
        &policies.value,
        pr.repository.as_ref().and_then(|r| r.id.as_deref()),
        pr.target_ref_name.as_deref(),
    );
    debug!(?ignored, "optional work item linking policies");

    let path = client.repo_path(repo, &format!("/pullrequests/{id}"));
    client
        .request(&path, RequestOptions::patch(autocomplete_body(user_id, &ignored)))
        .await?;

    if ignored.is_empty() {
        println!("Enabled auto-complete for PR #{}", id);
    } else {
        let ids: Vec<String> = ignored.iter().map(u64::to_string).collect();
        println!(
            "Enabled auto-complete for PR #{} (optional linked work item policies ignored: {})",
            id,
            ids.join(", ")
        );
    }
    Ok(())
}

pub fn autocomplete_body(user_id: &str, ignored_policy_ids: &[u64]) -> Value {
    json!({
        "autoCompleteSetBy": { "id": user_id },
        "completionOptions": {
            "deleteSourceBranch": true,
            "autoCompleteIgnoreConfigIds": ignored_policy_ids,
        }
    })
}

pub async fn pr_cherry_pick(client: &AzureDevOpsClient, config: &Config, args: &[String]) -> Result<()> {
    let cherry_pick = parse_cherry_pick_args(args)?;
    let repo = config.pick_repo(cherry_pick.repo.as_deref());
    let body = cherry_pick_request_body(&cherry_pick);

    let path = client.repo_path(repo, "/cherryPicks");
    let result: CherryPick = client
        .request_as(&path, RequestOptions::post(body))
        .await?
        .unwrap_or_default();

    let parameters = result.parameters.unwrap_or_default();
    println!(
        "Queued cherry-pick #{} of PR #{} onto {} ({}) -> {}",
        display_id(result.cherry_pick_id),
        cherry_pick.pr_id,
        parameters
            .onto_ref_name
            .unwrap_or_else(|| to_ref_name(&cherry_pick.target)),
        result.status.as_deref().unwrap_or("queued"),
        parameters.generated_ref_name.as_deref().unwrap_or("(pending)"),
    );
    Ok(())
}
