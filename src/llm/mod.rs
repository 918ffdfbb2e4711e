//! LLM provider drivers for the `/chat` backend.
//!
//! The backend turns one customer message into one provider call and hands
//! back the answer text. Provider differences (URL, auth, payload shape,
//! where the answer lives in the reply) are kept in [`provider`]; the
//! network call itself lives in [`driver`].
//!
//! # Drivers
//!
//! - [`HttpDriver`]: reqwest client for the configured [`Provider`]
//!
//! # Example
//!
//! ```rust,ignore
//! use pharmacare_chat::llm::{HttpDriver, LlmDriver};
//!
//! let driver = HttpDriver::new(settings)?;
//! let answer = driver.complete("Where is my order?").await?;
//! ```

pub mod driver;
pub mod provider;

pub use driver::HttpDriver;
pub use provider::Provider;

use std::time::Duration;

use thiserror::Error;

/// Provider, model and sampling settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// Which API to call.
    pub provider: Provider,
    /// Model identifier (e.g. `tinyllama:1.1b`, `gpt-4o-mini`).
    pub model: String,
    /// Credential for the hosted providers.
    pub api_key: Option<String>,
    /// Instructions prepended to every customer message.
    pub system_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Optional stop sequence; only sent when set.
    pub stop_word: Option<String>,
    /// Generate endpoint of the Ollama server.
    pub ollama_url: String,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Log upstream error bodies.
    pub debug: bool,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("stop_word", &self.stop_word)
            .field("ollama_url", &self.ollama_url)
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// Backend failure while producing an answer.
#[derive(Error, Debug)]
pub enum LlmError {
    /// `API_PROVIDER` named something we cannot talk to.
    #[error("Invalid API_PROVIDER specified: {0}")]
    UnknownProvider(String),

    /// The provider could not be reached or the reply could not be read.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-200 status.
    #[error("{status}: {detail}")]
    Upstream {
        /// Provider status code.
        status: u16,
        /// Error text extracted from the provider body.
        detail: String,
    },

    /// The provider answered 200 but not in the shape we expect.
    #[error("unexpected response shape from {provider}")]
    UnexpectedShape {
        /// Provider name.
        provider: &'static str,
    },

    /// The provider body was not JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Something that answers a customer message.
///
/// The HTTP handler only depends on this trait so tests can swap in a fake.
#[async_trait::async_trait]
pub trait LlmDriver: Send + Sync {
    /// Produce the assistant answer for `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable, rejects the request,
    /// or replies in an unexpected shape.
    async fn complete(&self, message: &str) -> Result<String, LlmError>;
}
