//! ============================================================================
//! ApiClient - Shared request/response handling for the TaskQuest REST API
//! ============================================================================
//! Every endpoint call goes through `send_json` / `send_empty`:
//! - exactly one request, no retries, no caching
//! - any non-2xx status is a failure
//! - error text comes from a JSON `message`/`error` field, else the raw body
//! ============================================================================

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{normalize_base_url, ClientConfig};
use crate::types::{QuestError, Result};

/// HTTP client bound to one backend base URL
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client with the default request timeout
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("taskquest-client/1.0")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_timeout(&config.api_base_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path (path starts with `/`)
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send a request and decode a JSON success body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = self.send_checked(request, what).await?;
        response.json::<T>().await.map_err(|e| {
            warn!("{}: could not decode response: {}", what, e);
            QuestError::Decode(format!("{}: {}", what, e))
        })
    }

    /// Send a request whose success body (if any) is ignored
    pub(crate) async fn send_empty(&self, request: RequestBuilder, what: &str) -> Result<()> {
        self.send_checked(request, what).await.map(|_| ())
    }

    async fn send_checked(&self, request: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            warn!("{}: request failed: {}", what, e);
            QuestError::Transport(format!("{}: {}", what, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = describe_error(status.as_u16(), &body);
            warn!("{}: API error {}: {}", what, status.as_u16(), message);
            return Err(QuestError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("{}: {}", what, status);
        Ok(response)
    }
}

/// Build readable error text from a failed response body
pub fn describe_error(status: u16, body: &str) -> String {
    let trimmed = body.trim();

    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["message", "error"] {
            if let Some(text) = fields.get(key).and_then(|v| v.as_str()) {
                if !text.trim().is_empty() {
                    return text.trim().to_string();
                }
            }
        }
    }

    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Request failed")
        .to_string()
}

#[cfg(test)]
pub(crate) mod test_server {
    //! One-shot HTTP responder for exercising the client against real sockets

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one request. Returns the base URL and a handle yielding
    /// the raw request text (head + body).
    pub async fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(head_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..head_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        raw.len() >= head_end + 4 + content_length
    }
}
