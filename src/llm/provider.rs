//! Provider-specific request and response shapes.
//!
//! Each provider differs in URL, authentication, payload layout and where
//! the answer text sits in the reply body.

use std::fmt;
use std::str::FromStr;

use serde_json::{Value, json};

use super::{LlmError, LlmSettings};

/// Anthropic API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Self-hosted Ollama (`/api/generate`).
    Ollama,
    /// `OpenAI` Chat Completions.
    OpenAI,
    /// `OpenRouter` (OpenAI-compatible).
    OpenRouter,
    /// Google Gemini `generateContent`.
    Gemini,
    /// Anthropic Messages.
    Anthropic,
}

impl FromStr for Provider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "openrouter" => Ok(Self::OpenRouter),
            "gemini" => Ok(Self::Gemini),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(LlmError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An outgoing provider call, ready for the HTTP client.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Target URL.
    pub url: String,
    /// Extra headers (besides `Content-Type`).
    pub headers: Vec<(&'static str, String)>,
    /// JSON body.
    pub body: Value,
}

impl Provider {
    /// Lowercase provider name, as accepted by `API_PROVIDER`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
            Self::OpenRouter => "openrouter",
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
        }
    }

    /// Environment variable holding this provider's key.
    #[must_use]
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::OpenRouter => Some("OPENROUTER_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
        }
    }

    /// Build the provider call for one customer message.
    #[must_use]
    pub fn build_request(self, settings: &LlmSettings, message: &str) -> ProviderRequest {
        let system = &settings.system_prompt;
        let key = settings.api_key.clone().unwrap_or_default();
        let stop = settings.stop_word.as_ref().map(|w| json!([w]));

        match self {
            Self::Ollama => {
                let mut body = json!({
                    "model": settings.model,
                    "prompt": format!("{system}\n\nCustomer: {message}\n\nAssistant:"),
                    "stream": false,
                    "temperature": settings.temperature,
                    "num_predict": settings.max_tokens,
                });
                if let Some(stop) = stop {
                    body["stop"] = stop;
                }
                ProviderRequest {
                    url: settings.ollama_url.clone(),
                    headers: Vec::new(),
                    body,
                }
            }
            Self::OpenAI | Self::OpenRouter => {
                let mut body = json!({
                    "model": settings.model,
                    "messages": [
                        { "role": "system", "content": system },
                        { "role": "user", "content": message },
                    ],
                    "temperature": settings.temperature,
                    "max_tokens": settings.max_tokens,
                });
                if let Some(stop) = stop {
                    body["stop"] = stop;
                }
                let url = if self == Self::OpenAI {
                    OPENAI_URL
                } else {
                    OPENROUTER_URL
                };
                ProviderRequest {
                    url: url.to_string(),
                    headers: vec![("authorization", format!("Bearer {key}"))],
                    body,
                }
            }
            Self::Gemini => {
                let mut body = json!({
                    "contents": [
                        { "role": "user", "parts": [{ "text": format!("{system}\n\n{message}") }] }
                    ],
                    "generationConfig": {
                        "temperature": settings.temperature,
                        "maxOutputTokens": settings.max_tokens,
                    },
                });
                if let Some(stop) = stop {
                    body["generationConfig"]["stopSequences"] = stop;
                }
                ProviderRequest {
                    url: format!(
                        "{GEMINI_BASE_URL}/{}:generateContent?key={key}",
                        settings.model
                    ),
                    headers: Vec::new(),
                    body,
                }
            }
            Self::Anthropic => {
                let mut body = json!({
                    "model": settings.model,
                    "max_tokens": settings.max_tokens,
                    "messages": [
                        { "role": "user", "content": format!("{system}\n\n{message}") }
                    ],
                    "temperature": settings.temperature,
                });
                if let Some(stop) = stop {
                    body["stop_sequences"] = stop;
                }
                ProviderRequest {
                    url: ANTHROPIC_URL.to_string(),
                    headers: vec![
                        ("x-api-key", key),
                        ("anthropic-version", ANTHROPIC_VERSION.to_string()),
                    ],
                    body,
                }
            }
        }
    }

    /// Pull the answer text out of a successful reply body.
    pub fn extract_answer(self, body: &Value) -> Result<String, LlmError> {
        let answer = match self {
            Self::Ollama => body.get("response").and_then(Value::as_str),
            Self::OpenAI | Self::OpenRouter => body
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str),
            Self::Gemini => body
                .pointer("/candidates/0/content/parts/0/text")
                .and_then(Value::as_str),
            Self::Anthropic => {
                // An empty reply is valid for Anthropic.
                let text = body
                    .pointer("/content/0/text")
                    .or_else(|| body.get("text"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Some(text)
            }
        };

        answer
            .map(ToString::to_string)
            .ok_or(LlmError::UnexpectedShape {
                provider: self.name(),
            })
    }
}

/// Error text from a non-200 provider body: its `error` or `detail` field,
/// else the raw text.
pub fn upstream_detail(raw: &str) -> String {
    let Ok(body) = serde_json::from_str::<Value>(raw) else {
        return raw.to_string();
    };
    let field = ["error", "detail"]
        .iter()
        .filter_map(|k| body.get(*k))
        .find(|v| is_truthy(v));
    match field {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => raw.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(provider: Provider, stop_word: Option<&str>) -> LlmSettings {
        LlmSettings {
            provider,
            model: "test-model".into(),
            api_key: Some("secret".into()),
            system_prompt: "SYS".into(),
            temperature: 0.5,
            max_tokens: 128,
            stop_word: stop_word.map(ToString::to_string),
            ollama_url: "http://ollama:11434/api/generate".into(),
            timeout: Duration::from_secs(60),
            debug: false,
        }
    }

    #[test]
    fn parse_provider_names() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAI);
        assert_eq!(" gemini ".parse::<Provider>().unwrap(), Provider::Gemini);
        assert!(matches!(
            "cohere".parse::<Provider>(),
            Err(LlmError::UnknownProvider(name)) if name == "cohere"
        ));
    }

    #[test]
    fn ollama_prompt_and_stop() {
        let s = settings(Provider::Ollama, Some("###"));
        let req = Provider::Ollama.build_request(&s, "Where is my order?");
        assert_eq!(req.url, "http://ollama:11434/api/generate");
        assert_eq!(
            req.body["prompt"],
            "SYS\n\nCustomer: Where is my order?\n\nAssistant:"
        );
        assert_eq!(req.body["stream"], false);
        assert_eq!(req.body["num_predict"], 128);
        assert_eq!(req.body["stop"], json!(["###"]));
        assert!(req.headers.is_empty());
    }

    #[test]
    fn openai_messages_without_stop() {
        let s = settings(Provider::OpenAI, None);
        let req = Provider::OpenAI.build_request(&s, "hi");
        assert_eq!(req.url, OPENAI_URL);
        assert_eq!(req.body["messages"][0]["role"], "system");
        assert_eq!(req.body["messages"][1]["content"], "hi");
        assert!(req.body.get("stop").is_none());
        assert_eq!(
            req.headers,
            vec![("authorization", "Bearer secret".to_string())]
        );
    }

    #[test]
    fn gemini_key_in_query() {
        let s = settings(Provider::Gemini, Some("END"));
        let req = Provider::Gemini.build_request(&s, "hi");
        assert_eq!(
            req.url,
            "https://generativelanguage.googleapis.com/v1beta/models/test-model:generateContent?key=secret"
        );
        assert_eq!(req.body["contents"][0]["parts"][0]["text"], "SYS\n\nhi");
        assert_eq!(req.body["generationConfig"]["maxOutputTokens"], 128);
        assert_eq!(req.body["generationConfig"]["stopSequences"], json!(["END"]));
    }

    #[test]
    fn anthropic_headers() {
        let s = settings(Provider::Anthropic, None);
        let req = Provider::Anthropic.build_request(&s, "hi");
        assert!(req.headers.contains(&("x-api-key", "secret".to_string())));
        assert!(
            req.headers
                .contains(&("anthropic-version", ANTHROPIC_VERSION.to_string()))
        );
        assert!(req.body.get("stop_sequences").is_none());
    }

    #[test]
    fn extract_answers() {
        assert_eq!(
            Provider::Ollama
                .extract_answer(&json!({ "response": "a" }))
                .unwrap(),
            "a"
        );
        assert_eq!(
            Provider::OpenRouter
                .extract_answer(&json!({ "choices": [{ "message": { "content": "b" } }] }))
                .unwrap(),
            "b"
        );
        assert_eq!(
            Provider::Gemini
                .extract_answer(&json!({ "candidates": [{ "content": { "parts": [{ "text": "c" }] } }] }))
                .unwrap(),
            "c"
        );
        assert_eq!(
            Provider::Anthropic
                .extract_answer(&json!({ "content": [{ "type": "text", "text": "d" }] }))
                .unwrap(),
            "d"
        );
        assert_eq!(
            Provider::Anthropic
                .extract_answer(&json!({ "content": [] }))
                .unwrap(),
            ""
        );
        assert!(matches!(
            Provider::OpenAI.extract_answer(&json!({ "choices": [] })),
            Err(LlmError::UnexpectedShape { provider: "openai" })
        ));
    }

    #[test]
    fn upstream_detail_prefers_error_then_detail() {
        assert_eq!(upstream_detail(r#"{"error":"model not found"}"#), "model not found");
        assert_eq!(upstream_detail(r#"{"detail":"bad key"}"#), "bad key");
        assert_eq!(
            upstream_detail(r#"{"error":{"message":"quota"}}"#),
            r#"{"message":"quota"}"#
        );
        assert_eq!(upstream_detail(r#"{"error":null,"detail":"x"}"#), "x");
        assert_eq!(upstream_detail(r#"{"other":1}"#), r#"{"other":1}"#);
        assert_eq!(upstream_detail("Bad Gateway"), "Bad Gateway");
    }
}
