mod builds;
mod config;
mod git;
mod pull_requests;
mod smoke;
mod work_items;

use anyhow::Result;

use crate::azure_devops::AzureDevOpsClient;
use crate::cli::ApiCommand;
use crate::config::Config;
use crate::error::UsageError;
use crate::options::parse_id;

pub use config::{config_show, init};

/// Run one Azure DevOps command against an already resolved configuration.
pub async fn run(command: ApiCommand, config: &Config, client: &AzureDevOpsClient) -> Result<()> {
    match command {
        ApiCommand::Smoke => smoke::smoke(client, config).await,
        ApiCommand::Repos => git::repos(client).await,
        ApiCommand::Branches { repo } => git::branches(client, config, repo.as_deref()).await,
        ApiCommand::WorkitemGet { id, rest } => work_items::workitem_get(client, &id, &rest.args).await,
        ApiCommand::WorkitemsRecent { rest } => work_items::workitems_recent(client, &rest.args).await,
        ApiCommand::WorkitemComments { id, rest } => {
            work_items::workitem_comments(client, &id, &rest.args).await
        }
        ApiCommand::WorkitemCommentAdd { id, rest } => {
            work_items::workitem_comment_add(client, &id, &rest.args).await
        }
        ApiCommand::WorkitemCommentUpdate {
            id,
            comment_id,
            rest,
        } => work_items::workitem_comment_update(client, &id, &comment_id, &rest.args).await,
        ApiCommand::Prs { status, top, repo } => {
            pull_requests::prs(
                client,
                config,
                status.as_deref(),
                top.as_deref(),
                repo.as_deref(),
            )
            .await
        }
        ApiCommand::PrGet { id, repo } => pull_requests::pr_get(client, config, &id, repo.as_deref()).await,
        ApiCommand::PrCreate { rest } => pull_requests::pr_create(client, config, &rest.args).await,
        ApiCommand::PrUpdate { id, rest } => {
            pull_requests::pr_update(client, config, &id, &rest.args).await
        }
        ApiCommand::PrApprove { id, repo } => {
            pull_requests::pr_approve(client, config, &id, repo.as_deref()).await
        }
        ApiCommand::PrAutocomplete { id, repo } => {
            pull_requests::pr_autocomplete(client, config, &id, repo.as_deref()).await
        }
        ApiCommand::PrCherryPick { rest } => {
            pull_requests::pr_cherry_pick(client, config, &rest.args).await
        }
        ApiCommand::Builds { top } => builds::builds(client, top.as_deref()).await,
    }
}

/// Parse a numeric id argument, or fail with the command's usage line.
pub(crate) fn require_id(raw: &str, usage: &'static str) -> Result<u32, UsageError> {
    parse_id(raw).ok_or_else(|| UsageError::usage(usage))
}

/// `#?` stands in for ids the service left out.
pub(crate) fn display_id(id: Option<u64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string())
}
