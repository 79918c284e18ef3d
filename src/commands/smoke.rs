use anyhow::Result;
use crossterm::style::Color;
use serde_json::json;

use super::display_id;
use crate::azure_devops::models::{ListResponse, PullRequest, WiqlResult, WorkItem};
use crate::azure_devops::{AzureDevOpsClient, RequestOptions};
use crate::config::Config;
use crate::ui::output::{PanelRow, render_panel};
use crate::wiql::{WorkItemFilters, build_recent_work_items_wiql};

/// Fetch the most recently changed work item and the newest PR to prove the
/// configuration works end to end.
pub async fn smoke(client: &AzureDevOpsClient, config: &Config) -> Result<()> {
    let repo = config.pick_repo(None);
    let work_item = latest_work_item(client).await?;
    let pull_request = latest_pull_request(client, repo).await?;

    let rows = vec![
        PanelRow::new("Collection", &config.collection_url),
        PanelRow::new("Project", &config.project),
        PanelRow::new("Repository", repo),
        PanelRow::new("Work item", work_item_line(work_item.as_ref())),
        PanelRow::new("Pull request", pull_request_line(pull_request.as_ref())),
    ];
    render_panel("Azure DevOps connectivity check", &rows, Color::Cyan)
}

async fn latest_work_item(client: &AzureDevOpsClient) -> Result<Option<WorkItem>> {
    let query = build_recent_work_items_wiql(&WorkItemFilters::default());
    let path = client.project_path("/_apis/wit/wiql?$top=1");
    let result: WiqlResult = client
        .request_as(&path, RequestOptions::post(json!({ "query": query })))
        .await?
        .unwrap_or_default();

    let Some(reference) = result.work_items.first() else {
        return Ok(None);
    };
    let path = client.project_path(&format!("/_apis/wit/workitems/{}", reference.id));
    Ok(client.get(&path).await?)
}

async fn latest_pull_request(client: &AzureDevOpsClient, repo: &str) -> Result<Option<PullRequest>> {
    let path = client.repo_path(repo, "/pullrequests?searchCriteria.status=all&$top=1");
    let result: ListResponse<PullRequest> = client.get(&path).await?.unwrap_or_default();
    Ok(result.value.into_iter().next())
}

fn work_item_line(work_item: Option<&WorkItem>) -> String {
    match work_item {
        Some(wi) => format!(
            "#{} - {}",
            display_id(wi.id),
            wi.title().unwrap_or("(no title)")
        ),
        None => "none found".to_string(),
    }
}

fn pull_request_line(pr: Option<&PullRequest>) -> String {
    match pr {
        Some(pr) => format!(
            "#{} - {}",
            display_id(pr.pull_request_id),
            pr.title.as_deref().unwrap_or("(no title)")
        ),
        None => "none found".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_line() {
        let wi: WorkItem = serde_json::from_value(json!({
            "id": 20519,
            "fields": {"System.Title": "Login broken"}
        }))
        .unwrap();
        assert_eq!(work_item_line(Some(&wi)), "#20519 - Login broken");
        assert_eq!(work_item_line(None), "none found");
    }

    #[test]
    fn test_pull_request_line_without_title() {
        let pr = PullRequest {
            pull_request_id: Some(2037),
            ..Default::default()
        };
        assert_eq!(pull_request_line(Some(&pr)), "#2037 - (no title)");
        assert_eq!(pull_request_line(None), "none found");
    }
}
