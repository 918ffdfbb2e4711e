//! reqwest-backed provider driver.

use serde_json::Value;
use tracing::warn;

use super::provider::upstream_detail;
use super::{LlmDriver, LlmError, LlmSettings};

/// Driver calling the configured provider over HTTP.
#[derive(Clone)]
pub struct HttpDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for HttpDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDriver")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl HttpDriver {
    /// Create a driver whose calls time out after `settings.timeout`.
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    /// Settings this driver was built with.
    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }
}

#[async_trait::async_trait]
impl LlmDriver for HttpDriver {
    async fn complete(&self, message: &str) -> Result<String, LlmError> {
        let provider = self.settings.provider;
        let req = provider.build_request(&self.settings, message);

        let mut rb = self.http.post(&req.url).json(&req.body);
        for (name, value) in &req.headers {
            rb = rb.header(*name, value);
        }

        let resp = rb.send().await?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let raw = resp.text().await.unwrap_or_default();
            if self.settings.debug {
                warn!(
                    name: "llm.upstream.error_body",
                    provider = %provider,
                    status = status.as_u16(),
                    body = %raw,
                    "Provider error body"
                );
            }
            warn!(
                name: "llm.request.failed",
                provider = %provider,
                status = status.as_u16(),
                "Provider returned an error status"
            );
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                detail: upstream_detail(&raw),
            });
        }

        let body: Value = resp.json().await?;
        provider.extract_answer(&body)
    }
}
