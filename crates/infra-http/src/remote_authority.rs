// HTTP RemoteAuthority over reqwest

use async_trait::async_trait;
use cmdrelay_core::domain::RelayConfig;
use cmdrelay_core::error::{AppError, Result};
use cmdrelay_core::port::{AckRequest, PullResponse, RemoteAuthority};
use reqwest::header::{HeaderMap, ACCEPT};
use tracing::debug;

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const TIMESTAMP_HEADER: &str = "X-Timestamp";
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Client for `POST /api/zcr/pull` and `POST /api/zcr/ack`
pub struct HttpRemoteAuthority {
    client: reqwest::Client,
    pull_url: String,
    ack_url: String,
    api_key: String,
    server_token: String,
}

impl HttpRemoteAuthority {
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("cmdrelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            pull_url: config.pull_url(),
            ack_url: config.ack_url(),
            api_key: config.api_key.clone(),
            server_token: config.server_token.clone(),
        })
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn transport(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Transport(format!("request timed out: {}", e))
    } else {
        AppError::Transport(e.to_string())
    }
}

#[async_trait]
impl RemoteAuthority for HttpRemoteAuthority {
    async fn pull(&self, limit: u32) -> Result<PullResponse> {
        let limit = limit.to_string();
        let response = self
            .client
            .post(&self.pull_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .form(&[("token", self.server_token.as_str()), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status().as_u16();
        let timestamp = header(response.headers(), TIMESTAMP_HEADER);
        let signature = header(response.headers(), SIGNATURE_HEADER);
        let body = response.text().await.map_err(transport)?;

        debug!(status, bytes = body.len(), signed = signature.is_some(), "Pull response");
        Ok(PullResponse {
            status,
            body,
            timestamp,
            signature,
        })
    }

    async fn ack(&self, ids: &[String]) -> Result<u16> {
        let payload = AckRequest {
            token: self.server_token.clone(),
            ids: ids.to_vec(),
        };
        let response = self
            .client
            .post(&self.ack_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;

        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// What the one-shot server saw
    struct Captured {
        head: String,
        body: String,
    }

    /// Serve exactly one request with `response`, handing back the request
    async fn one_shot(response: String) -> (String, oneshot::Receiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let (head_end, content_length) = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                    let length = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .map(|v| v.trim().parse::<usize>().unwrap())
                        .unwrap_or(0);
                    break (pos + 4, length);
                }
            };
            while buf.len() < head_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            let _ = tx.send(Captured {
                head: String::from_utf8_lossy(&buf[..head_end]).to_string(),
                body: String::from_utf8_lossy(&buf[head_end..]).to_string(),
            });
        });

        (base, rx)
    }

    fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
            status,
            body.len(),
            extra_headers,
            body
        )
    }

    fn config(base: &str) -> RelayConfig {
        RelayConfig {
            website_url: format!("{}/", base),
            api_key: "secret-key".into(),
            server_token: "srv token&1".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pull_sends_form_and_reads_signature_headers() {
        let body = r#"{"items":[]}"#;
        let (base, captured) = one_shot(http_response(
            "200 OK",
            "X-Timestamp: 1700000000\r\nX-Signature: abc123\r\n",
            body,
        ))
        .await;
        let remote = HttpRemoteAuthority::new(&config(&base)).unwrap();

        let response = remote.pull(50).await.unwrap();
        let request = captured.await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, body);
        assert_eq!(response.timestamp.as_deref(), Some("1700000000"));
        assert_eq!(response.signature.as_deref(), Some("abc123"));

        let head = request.head.to_lowercase();
        assert!(head.starts_with("post /api/zcr/pull "));
        assert!(head.contains("x-api-key: secret-key"));
        assert!(head.contains("content-type: application/x-www-form-urlencoded"));
        assert!(head.contains("accept: application/json"));
        assert_eq!(request.body, "token=srv+token%261&limit=50");
    }

    #[tokio::test]
    async fn test_pull_reports_non_success_status() {
        let (base, _captured) = one_shot(http_response("503 Service Unavailable", "", "")).await;
        let remote = HttpRemoteAuthority::new(&config(&base)).unwrap();

        let response = remote.pull(10).await.unwrap();

        assert_eq!(response.status, 503);
        assert!(!response.is_success());
        assert!(response.signature.is_none());
    }

    #[tokio::test]
    async fn test_ack_posts_json_ids() {
        let (base, captured) = one_shot(http_response("200 OK", "", "{}")).await;
        let remote = HttpRemoteAuthority::new(&config(&base)).unwrap();

        let status = remote
            .ack(&["1".to_string(), "7".to_string()])
            .await
            .unwrap();
        let request = captured.await.unwrap();

        assert_eq!(status, 200);
        assert!(request.head.to_lowercase().starts_with("post /api/zcr/ack "));
        let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(
            sent,
            serde_json::json!({"token": "srv token&1", "ids": ["1", "7"]})
        );
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let remote = HttpRemoteAuthority::new(&config(&base)).unwrap();

        assert!(matches!(remote.pull(1).await, Err(AppError::Transport(_))));
    }
}
