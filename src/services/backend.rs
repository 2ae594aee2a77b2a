//! Swap backend client
//!
//! Two endpoints: a rate/fee snapshot (`GET /api/v1/swap/info`) and a signed
//! swap authorization (`POST /api/v1/swap/generate-signature`). No retries.

use crate::config::BackendConfig;
use crate::types::{ApiEnvelope, IcySwapInfo, SignatureRequest, SignatureResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

const SWAP_INFO_CONTEXT: &str = "Failed to fetch swap info";
const SIGNATURE_CONTEXT: &str = "Failed to generate swap signature";

/// Remote swap backend
#[async_trait]
pub trait SwapBackend: Send + Sync {
    /// Current rate and fee snapshot
    async fn swap_info(&self) -> Result<IcySwapInfo>;

    /// Ask the backend to authorize a swap
    async fn generate_signature(&self, request: &SignatureRequest) -> Result<SignatureResponse>;
}

/// [`SwapBackend`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpSwapBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpSwapBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
        detail_keys: &[&str],
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::RemoteService(format!("{}: {}", context, e)))?;

        if !status.is_success() {
            return Err(Error::RemoteService(format!(
                "{}: {}",
                context,
                error_detail(status, &body, detail_keys)
            )));
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            Error::RemoteService(format!("{}: invalid response body: {}", context, e))
        })?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl SwapBackend for HttpSwapBackend {
    async fn swap_info(&self) -> Result<IcySwapInfo> {
        let url = self.config.swap_info_url();
        tracing::debug!(url = %url, "Fetching swap info");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::RemoteService(format!("{}: {}", SWAP_INFO_CONTEXT, e)))?;

        Self::read_envelope(response, SWAP_INFO_CONTEXT, &["message", "error"]).await
    }

    async fn generate_signature(&self, request: &SignatureRequest) -> Result<SignatureResponse> {
        let url = self.config.signature_url();
        tracing::debug!(
            url = %url,
            btc_address = %request.btc_address,
            icy_amount = %request.icy_amount,
            btc_amount = %request.btc_amount,
            "Requesting swap signature"
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::RemoteService(format!("{}: {}", SIGNATURE_CONTEXT, e)))?;

        Self::read_envelope(response, SIGNATURE_CONTEXT, &["error", "message"]).await
    }
}

/// Message for a non-2xx response: the first string field of `keys` found in
/// a JSON body, else the raw body, else the status
fn error_detail(status: StatusCode, body: &str, keys: &[&str]) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in keys {
            if let Some(msg) = value.get(*key).and_then(|v| v.as_str()) {
                if !msg.is_empty() {
                    return msg.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<') {
        return trimmed.to_string();
    }

    format!("HTTP {}", status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer one request on a loopback port with a canned JSON response.
    /// The handle yields the raw request that was received.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (BackendConfig, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        let config = BackendConfig {
            base_url: format!("http://{}", addr),
        };
        (config, handle)
    }

    /// Read headers plus a `content-length` body
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn swap_info_unwraps_the_envelope() {
        let (config, server) = serve_once(
            "200 OK",
            r#"{"data": {"icy_satoshi_rate": "1500", "min_satoshi_fee": "2000", "min_icy_to_swap": "20"}, "message": "ok"}"#,
        )
        .await;

        let info = HttpSwapBackend::new(config).swap_info().await.unwrap();

        assert_eq!(info.icy_satoshi_rate, "1500");
        assert_eq!(info.min_satoshi_fee, "2000");
        assert_eq!(info.min_icy_to_swap, "20");
        assert!(server.await.unwrap().starts_with("GET /api/v1/swap/info "));
    }

    #[tokio::test]
    async fn swap_info_server_error_carries_the_message() {
        let (config, _server) = serve_once(
            "500 Internal Server Error",
            r#"{"data": null, "message": "rate unavailable"}"#,
        )
        .await;

        let err = HttpSwapBackend::new(config).swap_info().await.unwrap_err();

        assert!(matches!(err, Error::RemoteService(_)));
        assert_eq!(err.to_string(), "Failed to fetch swap info: rate unavailable");
        assert_eq!(err.code(), "REMOTE_SERVICE_ERROR");
    }

    #[tokio::test]
    async fn swap_info_rejects_a_malformed_body() {
        let (config, _server) = serve_once("200 OK", r#"{"message": "ok"}"#).await;

        let err = HttpSwapBackend::new(config).swap_info().await.unwrap_err();

        assert!(matches!(err, Error::RemoteService(_)));
        assert!(err
            .to_string()
            .starts_with("Failed to fetch swap info: invalid response body:"));
    }

    #[tokio::test]
    async fn signature_is_posted_and_decoded() {
        let (config, server) = serve_once(
            "200 OK",
            r#"{"data": {"icy_amount": "20000000000000000000", "btc_amount": "30000",
                "nonce": "7", "deadline": "1700000000", "signature": "0xabcd"}, "message": "ok"}"#,
        )
        .await;
        let request = SignatureRequest {
            btc_address: "tb1qf06am7xd4tpmnuuw92rgtr48jzq84vr3ykp9hd".to_string(),
            icy_amount: "20000000000000000000".to_string(),
            btc_amount: "30000".to_string(),
        };

        let signature = HttpSwapBackend::new(config)
            .generate_signature(&request)
            .await
            .unwrap();

        assert_eq!(signature.nonce, "7");
        assert_eq!(signature.btc_amount, "30000");
        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/v1/swap/generate-signature "));
        assert!(raw.contains(r#""btc_amount":"30000""#));
    }

    #[tokio::test]
    async fn signature_error_prefers_the_error_field() {
        let (config, _server) = serve_once(
            "400 Bad Request",
            r#"{"error": "invalid btc address", "message": "bad request"}"#,
        )
        .await;
        let request = SignatureRequest {
            btc_address: "nope".to_string(),
            icy_amount: "20000000000000000000".to_string(),
            btc_amount: "30000".to_string(),
        };

        let err = HttpSwapBackend::new(config)
            .generate_signature(&request)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RemoteService(_)));
        assert_eq!(
            err.to_string(),
            "Failed to generate swap signature: invalid btc address"
        );
    }

    #[test]
    fn error_detail_prefers_requested_key_order() {
        let body = r#"{"message": "rate unavailable", "error": "internal"}"#;
        assert_eq!(
            error_detail(StatusCode::INTERNAL_SERVER_ERROR, body, &["message", "error"]),
            "rate unavailable"
        );
        assert_eq!(
            error_detail(StatusCode::INTERNAL_SERVER_ERROR, body, &["error", "message"]),
            "internal"
        );
    }

    #[test]
    fn error_detail_falls_back_to_body_then_status() {
        assert_eq!(
            error_detail(StatusCode::BAD_GATEWAY, "upstream down", &["message"]),
            "upstream down"
        );
        assert_eq!(
            error_detail(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", &["message"]),
            "HTTP 502 Bad Gateway"
        );
        assert_eq!(
            error_detail(StatusCode::INTERNAL_SERVER_ERROR, "", &["message"]),
            "HTTP 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_remote_service_error() {
        let backend = HttpSwapBackend::new(BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
        });

        let err = backend.swap_info().await.unwrap_err();
        assert!(matches!(err, Error::RemoteService(_)));
        assert!(err.to_string().starts_with("Failed to fetch swap info:"));
    }
}
