//! Throw-away HTTP server for exercising real requests in tests.

use reqwest::Client;
use secrecy::SecretString;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::AzureDevOpsClient;
use crate::config::Config;

/// A complete response that closes the connection, so every request opens a new one.
pub fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

pub fn ok_json(body: &str) -> String {
    http_response("200 OK", body)
}

fn request_complete(raw: &[u8]) -> bool {
    let Some(header_end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&raw[..header_end]);
    let content_length = headers
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    raw.len() >= header_end + 4 + content_length
}

/// Answer one connection per entry of `responses`, in order, and hand back
/// the raw requests received.
/// The task only finishes once every response has been served.
pub async fn serve_sequence(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&raw) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            requests.push(String::from_utf8_lossy(&raw).into_owned());
        }
        requests
    });

    (format!("http://{addr}"), handle)
}

/// Accept one connection, answer with `response`, and hand back the raw request.
pub async fn serve_once(response: String) -> (String, JoinHandle<String>) {
    let (base, sequence) = serve_sequence(vec![response]).await;
    let handle = tokio::spawn(async move {
        sequence
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap_or_default()
    });
    (base, handle)
}

pub fn test_config(base_url: &str) -> Config {
    Config {
        pat: SecretString::from("test-pat".to_string()),
        collection_url: format!("{base_url}/"),
        project: "My Project".to_string(),
        repo: "Repo".to_string(),
        insecure_tls: false,
    }
}

pub fn client_for(base_url: &str) -> AzureDevOpsClient {
    let http = Client::builder().no_proxy().build().unwrap();
    AzureDevOpsClient::with_client(&test_config(base_url), http)
}

/// `METHOD /path?query` of a raw request.
pub fn request_line(raw: &str) -> &str {
    let line = raw.lines().next().unwrap_or_default();
    line.rsplit_once(' ').map(|(head, _)| head).unwrap_or(line)
}

/// JSON body of a raw request.
pub fn request_body(raw: &str) -> Value {
    let (_, body) = raw.split_once("\r\n\r\n").unwrap();
    serde_json::from_str(body).unwrap()
}
