//! Selection of optional "Work item linking" branch policies.
//!
//! PR auto-complete ignores these so that a PR without linked work items can
//! still complete when the policy is configured as non-blocking.

use super::models::{PolicyConfiguration, PolicyScope};

pub const WORK_ITEM_LINKING_POLICY: &str = "Work item linking";

/// A missing constraint matches anything.
fn scope_matches(scope: &PolicyScope, repository_id: Option<&str>, target_ref: Option<&str>) -> bool {
    let repo_ok = match scope.repository_id.as_deref().filter(|s| !s.is_empty()) {
        None => true,
        Some(id) => Some(id) == repository_id,
    };
    let ref_ok = match scope.ref_name.as_deref().filter(|s| !s.is_empty()) {
        None => true,
        Some(name) => Some(name) == target_ref,
    };
    let match_kind_ok = match scope.match_kind.as_deref().filter(|s| !s.is_empty()) {
        None => true,
        Some(kind) => kind == "Exact" || kind == "Prefix",
    };

    repo_ok && ref_ok && match_kind_ok
}

/// Ids of enabled, non-blocking work item linking policies that apply to
/// `repository_id` / `target_ref`. Policies without any scope always apply.
pub fn optional_work_item_policy_ids(
    policies: &[PolicyConfiguration],
    repository_id: Option<&str>,
    target_ref: Option<&str>,
) -> Vec<u64> {
    policies
        .iter()
        .filter(|p| {
            p.policy_type
                .as_ref()
                .and_then(|t| t.display_name.as_deref())
                == Some(WORK_ITEM_LINKING_POLICY)
        })
        .filter(|p| p.is_enabled == Some(true) && p.is_blocking != Some(true))
        .filter(|p| {
            match p.settings.as_ref().and_then(|s| s.scope.as_deref()) {
                None | Some([]) => true,
                Some(scopes) => scopes
                    .iter()
                    .any(|scope| scope_matches(scope, repository_id, target_ref)),
            }
        })
        .filter_map(|p| p.id)
        .collect()
}
