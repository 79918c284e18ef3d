use anyhow::{Context, Result};
use serde_json::{Value, json};
use tracing::debug;

use super::require_id;
use crate::azure_devops::models::{Comment, WiqlResult, WorkItem};
use crate::azure_devops::{AzureDevOpsClient, COMMENTS_API_VERSION, RequestOptions, encode_query_value};
use crate::error::UsageError;
use crate::options::{ParsedOptions, bounded_top, parse_option_args};
use crate::ui::output::print_json;
use crate::wiql::{build_recent_work_items_wiql, parse_work_items_recent_args};

const GET_USAGE: &str = "workitem-get <id> [--raw] [--expand=all|fields|links|relations]";
const COMMENTS_USAGE: &str = "workitem-comments <id> [top] [--top=<n>] [--order=asc|desc]";
const COMMENT_ADD_USAGE: &str = "workitem-comment-add <id> --text=\"...\" [--file=path]";
const COMMENT_UPDATE_USAGE: &str =
    "workitem-comment-update <id> <commentId> --text=\"...\" [--file=path]";

const COMMENTS_DEFAULT_TOP: u32 = 50;
const COMMENTS_MAX_TOP: u32 = 200;

pub async fn workitem_get(client: &AzureDevOpsClient, id_raw: &str, args: &[String]) -> Result<()> {
    let id = require_id(id_raw, GET_USAGE)?;

    let parsed = parse_option_args(args);
    parsed
        .ensure_allowed(&["raw", "expand"], "workitem-get")
        .map_err(|e| e.with_usage(GET_USAGE))?;
    parsed
        .ensure_max_positionals(0)
        .map_err(|e| e.with_usage(GET_USAGE))?;

    let query = parsed
        .non_empty_text("expand")
        .map(|expand| format!("?$expand={}", encode_query_value(expand)))
        .unwrap_or_default();

    let path = client.project_path(&format!("/_apis/wit/workitems/{id}{query}"));
    let value = client.request(&path, RequestOptions::default()).await?;

    if parsed.flag("raw") {
        return print_json(&value);
    }

    let work_item: WorkItem = value
        .map(serde_json::from_value)
        .transpose()
        .context("Failed to parse work item response")?
        .unwrap_or_default();

    print_json(&work_item_summary(&work_item))
}

/// Compact projection printed by `workitem-get` without `--raw`.
pub fn work_item_summary(work_item: &WorkItem) -> Value {
    json!({
        "id": work_item.id,
        "title": work_item.field("System.Title"),
        "state": work_item.field("System.State"),
        "type": work_item.field("System.WorkItemType"),
        "assignedTo": work_item.assigned_to(),
        "changedDate": work_item.field("System.ChangedDate"),
        "url": work_item.url,
    })
}

pub async fn workitems_recent(client: &AzureDevOpsClient, args: &[String]) -> Result<()> {
    let recent = parse_work_items_recent_args(args)?;
    let query = build_recent_work_items_wiql(&recent.filters);
    debug!(%query, top = recent.top, "querying recent work items");

    let path = client.project_path(&format!("/_apis/wit/wiql?$top={}", recent.top));
    let result: WiqlResult = client
        .request_as(&path, RequestOptions::post(json!({ "query": query })))
        .await?
        .unwrap_or_default();

    for work_item in result.work_items {
        println!("{}", work_item.id);
    }
    Ok(())
}

pub async fn workitem_comments(
    client: &AzureDevOpsClient,
    id_raw: &str,
    args: &[String],
) -> Result<()> {
    let id = require_id(id_raw, COMMENTS_USAGE)?;

    let parsed = parse_option_args(args);
    parsed
        .ensure_allowed(&["top", "order"], "workitem-comments")
        .map_err(|e| e.with_usage(COMMENTS_USAGE))?;
    parsed
        .ensure_max_positionals(1)
        .map_err(|e| e.with_usage(COMMENTS_USAGE))?;

    let top_candidate = parsed
        .text("top")
        .or_else(|| parsed.positionals.first().map(String::as_str));
    let top = bounded_top(top_candidate, COMMENTS_DEFAULT_TOP, COMMENTS_MAX_TOP);
    let order = comment_order(parsed.text("order"));

    let path = client.project_path(&format!(
        "/_apis/wit/workItems/{id}/comments?$top={top}&order={order}"
    ));
    let result = client
        .request(
            &path,
            RequestOptions::default().api_version(COMMENTS_API_VERSION),
        )
        .await?;

    print_json(&result)
}

/// `asc` when asked for explicitly, `desc` otherwise.
fn comment_order(raw: Option<&str>) -> &'static str {
    match raw.map(|o| o.trim().to_lowercase()) {
        Some(order) if order == "asc" => "asc",
        _ => "desc",
    }
}

/// Comment body from `--text`, falling back to the contents of `--file`.
pub async fn resolve_comment_text(parsed: &ParsedOptions, usage: &'static str) -> Result<String> {
    let mut text = parsed
        .text("text")
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string);

    if text.is_none()
        && let Some(path) = parsed.text("file")
    {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read comment file: {path}"))?;
        text = Some(content).filter(|t| !t.trim().is_empty());
    }

    text.ok_or_else(|| {
        UsageError::new("Either --text or --file must provide a non-empty comment body.")
            .with_usage(usage)
            .into()
    })
}

fn parse_comment_options(args: &[String], command: &str, usage: &'static str) -> Result<ParsedOptions> {
    let parsed = parse_option_args(args);
    parsed
        .ensure_allowed(&["text", "file"], command)
        .map_err(|e| e.with_usage(usage))?;
    parsed
        .ensure_max_positionals(0)
        .map_err(|e| e.with_usage(usage))?;
    Ok(parsed)
}

pub async fn workitem_comment_add(
    client: &AzureDevOpsClient,
    id_raw: &str,
    args: &[String],
) -> Result<()> {
    let id = require_id(id_raw, COMMENT_ADD_USAGE)?;
    let parsed = parse_comment_options(args, "workitem-comment-add", COMMENT_ADD_USAGE)?;
    let text = resolve_comment_text(&parsed, COMMENT_ADD_USAGE).await?;

    let path = client.project_path(&format!("/_apis/wit/workItems/{id}/comments"));
    let comment: Comment = client
        .request_as(
            &path,
            RequestOptions::post(json!({ "text": text })).api_version(COMMENTS_API_VERSION),
        )
        .await?
        .unwrap_or_default();

    print_json(&comment_added_summary(&comment, id, &text))
}

pub fn comment_added_summary(comment: &Comment, work_item_id: u32, text: &str) -> Value {
    json!({
        "id": comment.id,
        "workItemId": work_item_id,
        "createdBy": comment.created_by.as_ref().and_then(|c| c.display_name.as_deref()),
        "createdDate": comment.created_date,
        "text": comment.text.as_deref().unwrap_or(text),
    })
}

pub async fn workitem_comment_update(
    client: &AzureDevOpsClient,
    id_raw: &str,
    comment_id_raw: &str,
    args: &[String],
) -> Result<()> {
    let id = require_id(id_raw, COMMENT_UPDATE_USAGE)?;
    let comment_id = require_id(comment_id_raw, COMMENT_UPDATE_USAGE)?;
    let parsed = parse_comment_options(args, "workitem-comment-update", COMMENT_UPDATE_USAGE)?;
    let text = resolve_comment_text(&parsed, COMMENT_UPDATE_USAGE).await?;

    let path = client.project_path(&format!("/_apis/wit/workItems/{id}/comments/{comment_id}"));
    let comment: Comment = client
        .request_as(
            &path,
            RequestOptions::patch(json!({ "text": text })).api_version(COMMENTS_API_VERSION),
        )
        .await?
        .unwrap_or_default();

    print_json(&comment_updated_summary(&comment, id, comment_id, &text))
}

pub fn comment_updated_summary(comment: &Comment, work_item_id: u32, comment_id: u32, text: &str) -> Value {
    json!({
        "id": comment.id.unwrap_or(u64::from(comment_id)),
        "workItemId": work_item_id,
        "modifiedBy": comment.modified_by.as_ref().and_then(|c| c.display_name.as_deref()),
        "modifiedDate": comment.modified_date,
        "text": comment.text.as_deref().unwrap_or(text),
    })
}
