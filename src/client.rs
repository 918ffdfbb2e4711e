//! HTTP transport for the chat widget.
//!
//! [`ChatClient`] posts `{"message": ...}` to the configured `/chat`
//! endpoint and turns the answer into either the assistant reply or a
//! [`ChatError`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ChatError, Result};

/// Default endpoint the widget talks to.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/chat";

/// Request body for the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User message content.
    pub message: String,
}

/// Success body of the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply.
    pub response: String,
}

/// Error body of the chat endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure description.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// The `detail` field as display text.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Something that can deliver one user message and return the reply.
///
/// The widget only depends on this trait, so tests and alternative
/// front-ends can swap the HTTP client out.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `message` and wait for the assistant reply.
    async fn send(&self, message: &str) -> Result<String>;
}

/// reqwest-backed [`ChatTransport`].
#[derive(Debug, Clone)]
pub struct ChatClient {
    endpoint: Url,
    http: reqwest::Client,
}

impl ChatClient {
    /// Create a client for `endpoint` (e.g. `http://localhost:8000/chat`).
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self> {
        Self::with_client(endpoint, reqwest::Client::new())
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(endpoint: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(endpoint, http)
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(endpoint: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let endpoint = Url::parse(endpoint.as_ref())?;
        Ok(Self { endpoint, http })
    }

    /// The endpoint requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn handle_response(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            let body: ChatResponse = serde_json::from_slice(&bytes)?;
            return Ok(body.response);
        }

        // An unreadable error body is not worth surfacing on its own.
        let detail = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.detail_text()),
            Err(_) => None,
        };

        Err(ChatError::Server {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait::async_trait]
impl ChatTransport for ChatClient {
    async fn send(&self, message: &str) -> Result<String> {
        let req = ChatRequest {
            message: message.to_string(),
        };

        tracing::debug!(
            name: "chat.request.sent",
            endpoint = %self.endpoint,
            chars = message.chars().count(),
            "Posting chat message"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&req)
            .send()
            .await?;

        Self::handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_endpoint() {
        let err = ChatClient::new("not a url").unwrap_err();
        assert!(matches!(err, ChatError::InvalidUrl(_)));
    }

    #[test]
    fn keeps_endpoint_path() {
        let client = ChatClient::new(DEFAULT_ENDPOINT).unwrap();
        assert_eq!(client.endpoint().path(), "/chat");
        assert_eq!(client.endpoint().port(), Some(8000));
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(ChatRequest {
            message: "hello".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "message": "hello" }));
    }

    #[test]
    fn error_body_detail_variants() {
        let text: ErrorBody = serde_json::from_str(r#"{"detail":"rate limited"}"#).unwrap();
        assert_eq!(text.detail_text().as_deref(), Some("rate limited"));

        let absent: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.detail_text(), None);

        let null: ErrorBody = serde_json::from_str(r#"{"detail":null}"#).unwrap();
        assert_eq!(null.detail_text(), None);

        let structured: ErrorBody =
            serde_json::from_str(r#"{"detail":[{"msg":"field required"}]}"#).unwrap();
        assert_eq!(
            structured.detail_text().as_deref(),
            Some(r#"[{"msg":"field required"}]"#)
        );
    }

    #[test]
    fn success_body_requires_a_response_string() {
        for body in ["{}", r#"{"response":null}"#, r#"{"response":42}"#] {
            let err = serde_json::from_str::<ChatResponse>(body).unwrap_err();
            assert_eq!(
                ChatError::from(err).dialog_message(),
                crate::error::CONNECTION_ERROR_MESSAGE,
                "{body}"
            );
        }
    }
}
