//! Server-side cherry-pick of a pull request onto another branch.

use serde_json::{Value, json};

use crate::error::UsageError;
use crate::options::{parse_id, parse_option_args};

pub const CHERRY_PICK_USAGE: &str =
    "pr-cherry-pick <id> --target=<branch> [--topic=<branch>] [--repo=<repo>]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CherryPickArgs {
    pub pr_id: u32,
    pub target: String,
    pub topic: Option<String>,
    pub repo: Option<String>,
}

pub fn parse_cherry_pick_args<S: AsRef<str>>(args: &[S]) -> Result<CherryPickArgs, UsageError> {
    let parsed = parse_option_args(args);

    let pr_id = parsed
        .positionals
        .first()
        .and_then(|raw| parse_id(raw))
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            UsageError::new("A valid pull request ID is required as the first argument.")
                .with_usage(CHERRY_PICK_USAGE)
        })?;

    let target = parsed
        .non_empty_text("target")
        .ok_or_else(|| UsageError::new("--target is required.").with_usage(CHERRY_PICK_USAGE))?
        .to_string();

    parsed
        .ensure_allowed(&["target", "topic", "repo"], "pr-cherry-pick")
        .map_err(|e| e.with_usage(CHERRY_PICK_USAGE))?;
    parsed
        .ensure_max_positionals(1)
        .map_err(|e| e.with_usage(CHERRY_PICK_USAGE))?;

    Ok(CherryPickArgs {
        pr_id,
        target,
        topic: parsed.non_empty_text("topic").map(str::to_string),
        repo: parsed.non_empty_text("repo").map(str::to_string),
    })
}

/// Prefix a bare branch name with `refs/heads/`.
pub fn to_ref_name(branch: &str) -> String {
    if branch.starts_with("refs/") {
        branch.to_string()
    } else {
        format!("refs/heads/{branch}")
    }
}

/// Ref the cherry-picked commits land on.
pub fn build_generated_ref_name(pr_id: u32, target: &str, topic: Option<&str>) -> String {
    if let Some(topic) = topic {
        return if topic.starts_with("refs/heads/") {
            topic.to_string()
        } else {
            format!("refs/heads/{topic}")
        };
    }

    let safe_branch = target.strip_prefix("refs/heads/").unwrap_or(target);
    format!("refs/heads/cherry-pick-pr-{pr_id}-onto-{safe_branch}")
}

pub fn cherry_pick_request_body(args: &CherryPickArgs) -> Value {
    json!({
        "source": { "pullRequestId": args.pr_id },
        "ontoRefName": to_ref_name(&args.target),
        "generatedRefName": build_generated_ref_name(args.pr_id, &args.target, args.topic.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_id_and_target() {
        let args = parse_cherry_pick_args(&["42", "--target=main"]).unwrap();
        assert_eq!(
            args,
            CherryPickArgs {
                pr_id: 42,
                target: "main".to_string(),
                topic: None,
                repo: None,
            }
        );
    }

    #[test]
    fn test_parses_all_options() {
        let args = parse_cherry_pick_args(&[
            "100",
            "--target=release/v2",
            "--topic=my-branch",
            "--repo=other-repo",
        ])
        .unwrap();
        assert_eq!(args.target, "release/v2");
        assert_eq!(args.topic.as_deref(), Some("my-branch"));
        assert_eq!(args.repo.as_deref(), Some("other-repo"));
    }

    #[test]
    fn test_requires_valid_pr_id() {
        let err = parse_cherry_pick_args(&["--target=main"]).unwrap_err();
        assert!(err.to_string().contains("A valid pull request ID is required"));

        let err = parse_cherry_pick_args(&["foo", "--target=main"]).unwrap_err();
        assert!(err.to_string().contains("A valid pull request ID is required"));
    }

    #[test]
    fn test_requires_target() {
        let err = parse_cherry_pick_args(&["42"]).unwrap_err();
        assert!(err.to_string().contains("--target is required"));
    }

    #[test]
    fn test_rejects_unknown_options() {
        let err = parse_cherry_pick_args(&["42", "--target=main", "--bogus=x"]).unwrap_err();
        assert!(err.to_string().contains("Unknown option for pr-cherry-pick: --bogus"));
    }

    #[test]
    fn test_generated_ref_name() {
        assert_eq!(
            build_generated_ref_name(42, "main", None),
            "refs/heads/cherry-pick-pr-42-onto-main"
        );
        assert_eq!(
            build_generated_ref_name(42, "refs/heads/release/v2", None),
            "refs/heads/cherry-pick-pr-42-onto-release/v2"
        );
        assert_eq!(
            build_generated_ref_name(42, "main", Some("my-branch")),
            "refs/heads/my-branch"
        );
        assert_eq!(
            build_generated_ref_name(42, "main", Some("refs/heads/my-branch")),
            "refs/heads/my-branch"
        );
    }

    #[test]
    fn test_request_body() {
        let args = parse_cherry_pick_args(&["7", "--target=develop"]).unwrap();
        let body = cherry_pick_request_body(&args);
        assert_eq!(body["source"]["pullRequestId"], 7);
        assert_eq!(body["ontoRefName"], "refs/heads/develop");
        assert_eq!(
            body["generatedRefName"],
            "refs/heads/cherry-pick-pr-7-onto-develop"
        );
    }
}
