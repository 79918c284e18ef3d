use thiserror::Error;

/// Longest slice of an error response body carried in [`AdoError::RequestFailed`].
pub const ERROR_PREVIEW_LIMIT: usize = 350;

/// Failures of a single Azure DevOps REST call.
#[derive(Debug, Error)]
pub enum AdoError {
    #[error("Azure DevOps API request failed ({status}). {preview}")]
    RequestFailed { status: u16, preview: String },

    /// Azure DevOps answers a bad PAT with 203 and an HTML sign-in page.
    #[error(
        "Authentication failed (Status 203). This is most likely due to an invalid PAT. Please check DEVOPS_PAT and the collection URL."
    )]
    Unauthorized,

    #[error("Failed to send request to Azure DevOps")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse Azure DevOps response")]
    Decode(#[from] serde_json::Error),
}

/// Configuration could not be resolved into a usable [`crate::config::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing DEVOPS_PAT environment variable (or \"pat\" in a config file). Run 'ado init' to configure.")]
    MissingToken,

    #[error(
        "ADO configuration is incomplete ({}). Set ADO_COLLECTION_URL, ADO_PROJECT and ADO_REPO, or run 'ado init'.",
        .missing.join(", ")
    )]
    Incomplete { missing: Vec<&'static str> },
}

/// Bad command-line input. `usage` is printed after the message when set.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct UsageError {
    pub message: String,
    pub usage: Option<&'static str>,
}

impl UsageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: &'static str) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Usage line on its own, for commands called with missing or malformed arguments.
    pub fn usage(usage: &'static str) -> Self {
        Self {
            message: format!("Usage: ado {usage}"),
            usage: None,
        }
    }
}

/// Trim `body` and cut it to [`ERROR_PREVIEW_LIMIT`] characters.
pub fn error_preview(body: &str) -> String {
    body.trim().chars().take(ERROR_PREVIEW_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_preview_is_bounded() {
        let body = format!("  {}  ", "x".repeat(1000));
        let preview = error_preview(&body);
        assert_eq!(preview.chars().count(), ERROR_PREVIEW_LIMIT);
        assert!(preview.starts_with('x'));
    }

    #[test]
    fn test_error_preview_counts_characters_not_bytes() {
        let body = "é".repeat(400);
        assert_eq!(error_preview(&body).chars().count(), ERROR_PREVIEW_LIMIT);
    }

    #[test]
    fn test_request_failed_message() {
        let err = AdoError::RequestFailed {
            status: 404,
            preview: "not here".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Azure DevOps API request failed (404). not here"
        );
    }

    #[test]
    fn test_transport_cause_is_reported_once() {
        let cause = reqwest::Client::new().get("not a url").build().unwrap_err();
        let cause_text = cause.to_string();

        let err = anyhow::Error::from(AdoError::from(cause));
        let report = format!("{err:#}");
        assert!(report.starts_with("Failed to send request to Azure DevOps: "));
        assert_eq!(report.matches(cause_text.as_str()).count(), 1);
    }

    #[test]
    fn test_decode_cause_is_reported_once() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let cause_text = cause.to_string();

        let err = anyhow::Error::from(AdoError::from(cause));
        assert_eq!(
            format!("{err:#}"),
            format!("Failed to parse Azure DevOps response: {cause_text}")
        );
    }

    #[test]
    fn test_incomplete_lists_fields() {
        let err = ConfigError::Incomplete {
            missing: vec!["project", "repo"],
        };
        assert!(err.to_string().contains("project, repo"));
    }
}
