//! Response shapes of the Azure DevOps REST endpoints used by the CLI.
//!
//! Every field is optional: the service omits fields freely, and callers fall
//! back to defaults when something is missing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self { value: Vec::new() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub url: Option<String>,
}

impl WorkItem {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn title(&self) -> Option<&str> {
        self.field("System.Title").and_then(Value::as_str)
    }

    pub fn assigned_to(&self) -> Option<&str> {
        self.field("System.AssignedTo")
            .and_then(|v| v.get("displayName"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemReference {
    pub id: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiqlResult {
    #[serde(default)]
    pub work_items: Vec<WorkItemReference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectRef {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    #[serde(default)]
    pub pull_request_id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_by: Option<IdentityRef>,
    #[serde(default)]
    pub source_ref_name: Option<String>,
    #[serde(default)]
    pub target_ref_name: Option<String>,
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default)]
    pub url: Option<String>,
}

impl PullRequest {
    pub fn created_by_id(&self) -> Option<&str> {
        self.created_by
            .as_ref()
            .and_then(|c| c.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn created_by_name(&self) -> Option<&str> {
        self.created_by.as_ref().and_then(|c| c.display_name.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildDefinitionRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub definition: Option<BuildDefinitionRef>,
    #[serde(default)]
    pub source_branch: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_by: Option<IdentityRef>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub modified_by: Option<IdentityRef>,
    #[serde(default)]
    pub modified_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyType {
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyScope {
    #[serde(default)]
    pub repository_id: Option<String>,
    #[serde(default)]
    pub ref_name: Option<String>,
    #[serde(default)]
    pub match_kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicySettings {
    #[serde(default)]
    pub scope: Option<Vec<PolicyScope>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfiguration {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub is_blocking: Option<bool>,
    #[serde(default, rename = "type")]
    pub policy_type: Option<PolicyType>,
    #[serde(default)]
    pub settings: Option<PolicySettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CherryPickParameters {
    #[serde(default)]
    pub generated_ref_name: Option<String>,
    #[serde(default)]
    pub onto_ref_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CherryPick {
    #[serde(default)]
    pub cherry_pick_id: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub parameters: Option<CherryPickParameters>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pull_request_tolerates_missing_fields() {
        let pr: PullRequest = serde_json::from_value(json!({"pullRequestId": 7})).unwrap();
        assert_eq!(pr.pull_request_id, Some(7));
        assert!(pr.created_by_id().is_none());
        assert!(pr.repository.is_none());
    }

    #[test]
    fn test_pull_request_nested_fields() {
        let pr: PullRequest = serde_json::from_value(json!({
            "pullRequestId": 2037,
            "createdBy": {"displayName": "Ada", "id": "user-1"},
            "repository": {"id": "repo-id-123", "project": {"id": "project-id-456"}},
            "targetRefName": "refs/heads/main"
        }))
        .unwrap();

        assert_eq!(pr.created_by_id(), Some("user-1"));
        assert_eq!(pr.created_by_name(), Some("Ada"));
        assert_eq!(
            pr.repository.and_then(|r| r.project).and_then(|p| p.id).as_deref(),
            Some("project-id-456")
        );
    }

    #[test]
    fn test_work_item_field_helpers() {
        let wi: WorkItem = serde_json::from_value(json!({
            "id": 1,
            "fields": {
                "System.Title": "Fix it",
                "System.AssignedTo": {"displayName": "Bob"}
            }
        }))
        .unwrap();
        assert_eq!(wi.title(), Some("Fix it"));
        assert_eq!(wi.assigned_to(), Some("Bob"));
    }

    #[test]
    fn test_list_response_without_value() {
        let list: ListResponse<Build> = serde_json::from_value(json!({"count": 0})).unwrap();
        assert!(list.value.is_empty());
    }

    #[test]
    fn test_policy_configuration_shape() {
        let policy: PolicyConfiguration = serde_json::from_value(json!({
            "id": 12,
            "isEnabled": true,
            "isBlocking": false,
            "type": {"displayName": "Work item linking"},
            "settings": {"scope": [{"repositoryId": "r", "refName": "refs/heads/main", "matchKind": "Exact"}]}
        }))
        .unwrap();

        assert_eq!(policy.id, Some(12));
        assert_eq!(
            policy.policy_type.and_then(|t| t.display_name).as_deref(),
            Some("Work item linking")
        );
        let scope = policy.settings.and_then(|s| s.scope).unwrap();
        assert_eq!(scope[0].match_kind.as_deref(), Some("Exact"));
    }
}
