use anyhow::Result;

use crate::azure_devops::AzureDevOpsClient;
use crate::azure_devops::models::{GitRef, ListResponse, Repository};
use crate::config::Config;

const REPOS_TOP: u32 = 100;
const BRANCHES_TOP: u32 = 200;

pub async fn repos(client: &AzureDevOpsClient) -> Result<()> {
    let path = client.project_path(&format!("/_apis/git/repositories?$top={REPOS_TOP}"));
    let result: ListResponse<Repository> = client.get(&path).await?.unwrap_or_default();

    for repo in &result.value {
        println!("{}", format_repo_line(repo));
    }
    Ok(())
}

fn format_repo_line(repo: &Repository) -> String {
    format!(
        "{}\t{}",
        repo.id.as_deref().unwrap_or_default(),
        repo.name.as_deref().unwrap_or_default()
    )
}

pub async fn branches(client: &AzureDevOpsClient, config: &Config, repo: Option<&str>) -> Result<()> {
    let repo = config.pick_repo(repo);
    let path = client.repo_path(repo, &format!("/refs?filter=heads/&$top={BRANCHES_TOP}"));
    let result: ListResponse<GitRef> = client.get(&path).await?.unwrap_or_default();

    for git_ref in &result.value {
        println!("{}", branch_name(git_ref));
    }
    Ok(())
}

fn branch_name(git_ref: &GitRef) -> &str {
    let name = git_ref.name.as_deref().unwrap_or_default();
    name.strip_prefix("refs/heads/").unwrap_or(name)
}
