//! Roster source loading from local files or HTTP(S) URLs.

mod basic;
mod client;
pub mod auth;

pub use auth::BearerToken;
pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::debug;

/// Downloads `url` and returns the response body. Non-2xx statuses are errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Loads roster bytes from a local path or an `http(s)://` URL. A bearer
/// token, when given, is only sent for URLs.
#[tracing::instrument(skip(token))]
pub async fn load_source(source: &str, token: Option<&str>) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        let client = BasicClient::new();
        match token {
            Some(token) => {
                fetch_bytes(&BearerToken::new(client, token.to_string()), source).await?
            }
            None => fetch_bytes(&client, source).await?,
        }
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("Failed to read {source}"))?
    };

    debug!(bytes = bytes.len(), "Roster source loaded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Talks to the loopback server directly, ignoring any proxy settings
    /// in the environment.
    struct LoopbackClient(reqwest::Client);

    impl LoopbackClient {
        fn new() -> Self {
            Self(reqwest::Client::builder().no_proxy().build().unwrap())
        }
    }

    #[async_trait]
    impl HttpClient for LoopbackClient {
        async fn execute(&self, req: reqwest::Request) -> Result<reqwest::Response> {
            Ok(self.0.execute(req).await?)
        }
    }

    /// Answers a single request with `response` and hands back the raw
    /// request head.
    async fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/roster.csv", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&head).to_lowercase()
        });

        (url, handle)
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_error() {
        let (url, server) = serve_once(
            "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;

        let err = fetch_bytes(&LoopbackClient::new(), &url).await.unwrap_err();
        assert!(err.to_string().contains("404"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_with_bearer_token() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-length: 16\r\nconnection: close\r\n\r\nGrade,Group\n91,A",
        )
        .await;

        let client = BearerToken::new(LoopbackClient::new(), "s3cret".into());
        let body = fetch_bytes(&client, &url).await.unwrap();
        assert_eq!(body, b"Grade,Group\n91,A");

        let head = server.await.unwrap();
        assert!(head.contains("authorization: bearer s3cret"));
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/roster.csv");
        let bytes = load_source(path, None).await.unwrap();
        assert!(bytes.starts_with(b"Student,Group,Grade"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_source("/nonexistent/roster.csv", None).await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/roster.csv"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let client = BasicClient::new();
        assert!(fetch_bytes(&client, "not a url").await.is_err());
    }
}
