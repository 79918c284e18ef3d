use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{AdoError, error_preview};

pub const API_VERSION: &str = "7.0";
pub const COMMENTS_API_VERSION: &str = "7.0-preview.3";

pub const JSON: &str = "application/json";
pub const JSON_PATCH: &str = "application/json-patch+json";

/// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const PATH_SEGMENT: &AsciiSet = &COMPONENT.remove(b'/');

/// Percent-encode a project/repo name for use in a URL path, keeping `/`.
pub fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Percent-encode a query string value.
pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// `<base><path>?api-version=<v>`, or `&api-version=` when `path` has a query already.
pub fn build_request_url(base_url: &str, path: &str, api_version: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{base_url}{path}{separator}api-version={api_version}")
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub content_type: &'static str,
    pub api_version: &'static str,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            content_type: JSON,
            api_version: API_VERSION,
        }
    }
}

impl RequestOptions {
    pub fn with_body(method: Method, body: Value) -> Self {
        Self {
            method,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn post(body: Value) -> Self {
        Self::with_body(Method::POST, body)
    }

    pub fn patch(body: Value) -> Self {
        Self::with_body(Method::PATCH, body)
    }

    pub fn put(body: Value) -> Self {
        Self::with_body(Method::PUT, body)
    }

    pub fn api_version(mut self, version: &'static str) -> Self {
        self.api_version = version;
        self
    }

    pub fn content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = content_type;
        self
    }
}

pub struct AzureDevOpsClient {
    client: Client,
    base_url: String,
    project: String,
    pat: SecretString,
}

impl AzureDevOpsClient {
    pub fn new(config: &Config) -> Result<Self, AdoError> {
        let client = http_client_builder(config.insecure_tls).build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &Config, client: Client) -> Self {
        // Normalize the base URL (remove trailing slash)
        let base_url = config.collection_url.trim_end_matches('/').to_string();

        Self {
            client,
            base_url,
            project: config.project.clone(),
            pat: SecretString::from(config.pat.expose_secret().to_string()),
        }
    }

    /// `/<project><suffix>`
    pub fn project_path(&self, suffix: &str) -> String {
        format!("/{}{}", encode_path_segment(&self.project), suffix)
    }

    /// `/<project>/_apis/git/repositories/<repo><suffix>`
    pub fn repo_path(&self, repo: &str, suffix: &str) -> String {
        self.project_path(&format!(
            "/_apis/git/repositories/{}{}",
            encode_path_segment(repo),
            suffix
        ))
    }

    /// Issue one authenticated call.
    ///
    /// Returns `None` for an empty success body.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Option<Value>, AdoError> {
        let url = build_request_url(&self.base_url, path, options.api_version);
        debug!(method = %options.method, %url, "azure devops request");

        let mut request = self
            .client
            .request(options.method, &url)
            .basic_auth("", Some(self.pat.expose_secret()))
            .header(CONTENT_TYPE, options.content_type);

        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), %url, "azure devops response");

        if status == StatusCode::NON_AUTHORITATIVE_INFORMATION {
            return Err(AdoError::Unauthorized);
        }

        let text = response.text().await?;

        if !status.is_success() {
            return Err(AdoError::RequestFailed {
                status: status.as_u16(),
                preview: error_preview(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&text)?))
    }

    /// [`Self::request`] with the body decoded into `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, AdoError> {
        match self.request(path, options).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, AdoError> {
        self.request_as(path, RequestOptions::default()).await
    }
}

fn http_client_builder(insecure_tls: bool) -> ClientBuilder {
    let builder = Client::builder();
    if insecure_tls {
        builder.danger_accept_invalid_certs(true)
    } else {
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure_devops::test_server::{client_for, http_response, serve_once};
    use serde_json::json;

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("my project"), "my%20project");
        assert_eq!(encode_path_segment("path/to/thing"), "path/to/thing");
        assert_eq!(
            encode_path_segment("name with spaces/and/slashes"),
            "name%20with%20spaces/and/slashes"
        );
        assert_eq!(encode_path_segment("foo#bar"), "foo%23bar");
        assert_eq!(encode_path_segment("a&b=c"), "a%26b%3Dc");
        assert_eq!(encode_path_segment("simple"), "simple");
    }

    #[test]
    fn test_encode_query_value_encodes_slash() {
        assert_eq!(encode_query_value("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_build_request_url_separator() {
        assert_eq!(
            build_request_url("https://host/coll", "/p/_apis/git/repositories", "7.0"),
            "https://host/coll/p/_apis/git/repositories?api-version=7.0"
        );
        assert_eq!(
            build_request_url("https://host/coll", "/p/_apis/wit/wiql?$top=5", "7.0"),
            "https://host/coll/p/_apis/wit/wiql?$top=5&api-version=7.0"
        );
    }

    #[test]
    fn test_paths() {
        let client = client_for("http://localhost");
        assert_eq!(client.project_path("/_apis/build/builds"), "/My%20Project/_apis/build/builds");
        assert_eq!(
            client.repo_path("Ulysse Interface", "/refs"),
            "/My%20Project/_apis/git/repositories/Ulysse%20Interface/refs"
        );
    }

    #[tokio::test]
    async fn test_request_parses_json_and_authenticates() {
        let (base, server) = serve_once(http_response("200 OK", r#"{"id":42}"#)).await;
        let client = client_for(&base);

        let value = client
            .request("/My%20Project/_apis/thing?$top=1", RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(value, Some(json!({"id": 42})));

        let raw = server.await.unwrap().to_lowercase();
        assert!(raw.starts_with("get /my%20project/_apis/thing?$top=1&api-version=7.0 "));
        assert!(raw.contains("authorization: basic onrlc3qtcgf0"));
    }

    #[tokio::test]
    async fn test_request_sends_body_with_content_type() {
        let (base, server) = serve_once(http_response("200 OK", "{}")).await;
        let client = client_for(&base);

        let options = RequestOptions::patch(json!([{"op": "add"}]))
            .content_type(JSON_PATCH)
            .api_version(COMMENTS_API_VERSION);
        client.request("/x", options).await.unwrap();

        let raw = server.await.unwrap();
        assert!(raw.starts_with("PATCH /x?api-version=7.0-preview.3 "));
        assert!(raw.to_lowercase().contains("content-type: application/json-patch+json"));
        assert!(raw.ends_with(r#"[{"op":"add"}]"#));
    }

    #[tokio::test]
    async fn test_empty_body_is_none() {
        let (base, server) = serve_once(http_response("200 OK", "")).await;
        let client = client_for(&base);

        let value = client.request("/x", RequestOptions::default()).await.unwrap();
        assert_eq!(value, None);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_carries_bounded_preview() {
        let body = "e".repeat(2000);
        let (base, server) = serve_once(http_response("404 Not Found", &body)).await;
        let client = client_for(&base);

        let err = client
            .request("/x", RequestOptions::default())
            .await
            .unwrap_err();
        match err {
            AdoError::RequestFailed { status, preview } => {
                assert_eq!(status, 404);
                assert_eq!(preview.len(), 350);
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_203_is_unauthorized() {
        let (base, server) = serve_once(http_response(
            "203 Non-Authoritative Information",
            "<html>sign in</html>",
        ))
        .await;
        let client = client_for(&base);

        let err = client
            .request("/x", RequestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdoError::Unauthorized));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_decodes_typed_body() {
        #[derive(serde::Deserialize)]
        struct Thing {
            name: String,
        }

        let (base, server) = serve_once(http_response("200 OK", r#"{"name":"repo"}"#)).await;
        let client = client_for(&base);

        let thing: Option<Thing> = client.get("/x").await.unwrap();
        assert_eq!(thing.unwrap().name, "repo");
        server.await.unwrap();
    }
}
