use anyhow::Result;

use super::display_id;
use crate::azure_devops::AzureDevOpsClient;
use crate::azure_devops::models::{Build, ListResponse};
use crate::options::bounded_top;

const BUILDS_DEFAULT_TOP: u32 = 10;
const BUILDS_MAX_TOP: u32 = 50;

pub async fn builds(client: &AzureDevOpsClient, top: Option<&str>) -> Result<()> {
    let top = bounded_top(top, BUILDS_DEFAULT_TOP, BUILDS_MAX_TOP);
    let path = client.project_path(&format!(
        "/_apis/build/builds?$top={top}&queryOrder=queueTimeDescending"
    ));
    let result: ListResponse<Build> = client.get(&path).await?.unwrap_or_default();

    for build in &result.value {
        println!("{}", format_build_line(build));
    }
    Ok(())
}

/// `#<id>\t<status>/<result>\t<definition>\t<branch>`
fn format_build_line(build: &Build) -> String {
    format!(
        "#{}\t{}/{}\t{}\t{}",
        display_id(build.id),
        build.status.as_deref().unwrap_or("unknown"),
        build.result.as_deref().unwrap_or("n/a"),
        build
            .definition
            .as_ref()
            .and_then(|d| d.name.as_deref())
            .unwrap_or("unknown"),
        build.source_branch.as_deref().unwrap_or_default(),
    )
}
