use crate::llm::{LlmSettings, Provider};
use clap::{Parser, Subcommand};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Prompt used when neither `SYSTEM_PROMPT` nor a prompt file is available.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\nYou are a helpful customer support assistant for an online store called 'ShopEasy'.\nYou help customers with product inquiries, order status, return policies, and general shopping assistance.\nKeep responses brief, friendly, and helpful. If you don't know something, admit it and offer to connect the customer with a human agent.\n\nStore information:\n- Name: ShopEasy\n- Products: Electronics, clothing, home goods, toys\n- Return policy: 30-day returns on most items\n- Shipping: Free on orders over $35\n";

/// Config file picked up from the working directory when none is given.
const CWD_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    /// Address the backend binds
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port the backend listens on
    #[arg(long, env = "PORT", global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the /chat backend (the default)
    Serve,
    /// Chat with a backend from the terminal
    Chat {
        /// Chat endpoint URL
        #[arg(long, env = "CHAT_ENDPOINT")]
        endpoint: Option<String>,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub widget: WidgetConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Upper bound on a single handler run.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    pub endpoint: String,
    pub welcome_message: String,
    /// Client-side request timeout. Unset waits indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default)]
    pub stop_word: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    pub system_prompt_file: String,
    pub ollama_host: String,
    pub ollama_port: u16,
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub debug: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.request_timeout_secs", 90)?
            .set_default("widget.endpoint", crate::client::DEFAULT_ENDPOINT)?
            .set_default(
                "widget.welcome_message",
                crate::widget::DEFAULT_WELCOME_MESSAGE,
            )?
            .set_default("llm.provider", "ollama")?
            .set_default("llm.model", "tinyllama:1.1b")?
            .set_default("llm.temperature", 0.7)?
            .set_default("llm.max_tokens", 512)?
            .set_default("llm.system_prompt_file", "system_prompt.txt")?
            .set_default("llm.ollama_host", "ollama")?
            .set_default("llm.ollama_port", 11434)?
            .set_default("llm.timeout_secs", 60)?
            .set_default("llm.debug", false)?;

        // 2. Config file: explicit path, else ./config.yaml when present
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        } else if Path::new(CWD_CONFIG_FILE).exists() {
            builder = builder.add_source(File::new(CWD_CONFIG_FILE, FileFormat::Yaml));
        }

        // 3. Prefixed environment, e.g. PHARMACARE_SERVER__PORT=9000
        builder = builder.add_source(
            Environment::with_prefix("PHARMACARE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. Backend environment variables
        builder = apply_legacy_env(builder)?;

        // 5. CLI overrides
        if let Some(host) = &cli.host {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(Command::Chat {
            endpoint: Some(endpoint),
        }) = &cli.command
        {
            builder = builder.set_override("widget.endpoint", endpoint.as_str())?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }

    /// Resolve the backend settings: provider, key and system prompt.
    pub fn llm_settings(&self) -> Result<LlmSettings, config::ConfigError> {
        let llm = &self.llm;
        let provider: Provider = llm
            .provider
            .parse()
            .map_err(|e: crate::llm::LlmError| config::ConfigError::Message(e.to_string()))?;

        let api_key = llm
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                provider
                    .api_key_env()
                    .and_then(|name| env::var(name).ok())
                    .filter(|k| !k.trim().is_empty())
            });

        Ok(LlmSettings {
            provider,
            model: llm.model.clone(),
            api_key,
            system_prompt: self.system_prompt(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            stop_word: llm.stop_word.clone().filter(|s| !s.is_empty()),
            ollama_url: format!(
                "http://{}:{}/api/generate",
                llm.ollama_host, llm.ollama_port
            ),
            timeout: Duration::from_secs(llm.timeout_secs),
            debug: llm.debug,
        })
    }

    /// Inline prompt, else the prompt file, else the built-in prompt.
    pub fn system_prompt(&self) -> String {
        if let Some(prompt) = self.llm.system_prompt.as_ref().filter(|p| !p.is_empty()) {
            return prompt.clone();
        }
        match std::fs::read_to_string(&self.llm.system_prompt_file) {
            Ok(prompt) => prompt,
            Err(_) => DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Client-side timeout for the widget transport.
    pub fn widget_timeout(&self) -> Option<Duration> {
        self.widget.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Environment names the backend has always read, mapped onto config keys.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("API_PROVIDER", "llm.provider"),
    ("PROVIDER_MODEL", "llm.model"),
    ("OLLAMA_HOST", "llm.ollama_host"),
    ("OLLAMA_PORT", "llm.ollama_port"),
    ("LLM_TEMPERATURE", "llm.temperature"),
    ("LLM_MAX_TOKENS", "llm.max_tokens"),
    ("LLM_STOP_WORD", "llm.stop_word"),
    ("SYSTEM_PROMPT", "llm.system_prompt"),
];

fn apply_legacy_env(
    mut builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    for (var, key) in LEGACY_ENV {
        if let Ok(val) = env::var(var) {
            builder = builder.set_override(*key, val)?;
        }
    }
    // Case-insensitive "true" turns debug on; anything else turns it off.
    if let Ok(val) = env::var("DEBUG") {
        builder = builder.set_override("llm.debug", val.eq_ignore_ascii_case("true"))?;
    }
    Ok(builder)
}
