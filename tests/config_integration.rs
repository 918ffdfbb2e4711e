use pharmacare_chat::config::{AppConfig, DEFAULT_SYSTEM_PROMPT};
use pharmacare_chat::llm::Provider;
use serial_test::serial;
use std::env;
use std::fs;

const MANAGED_VARS: &[&str] = &[
    "CONFIG_FILE",
    "PORT",
    "CHAT_ENDPOINT",
    "PHARMACARE_SERVER__PORT",
    "PHARMACARE_LLM__MODEL",
    "API_PROVIDER",
    "PROVIDER_MODEL",
    "LLM_MAX_TOKENS",
    "LLM_STOP_WORD",
    "SYSTEM_PROMPT",
    "DEBUG",
    "OPENAI_API_KEY",
];

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    for var in MANAGED_VARS {
        // SAFETY: tests touching the environment are serialized with #[serial].
        unsafe {
            env::remove_var(var);
        }
    }
}

fn set_var(key: &str, value: &str) {
    // SAFETY: tests touching the environment are serialized with #[serial].
    unsafe {
        env::set_var(key, value);
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(["pharmacare-chat"]).expect("defaults should load");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.widget.endpoint, "http://localhost:8000/chat");
    assert_eq!(config.widget.request_timeout_secs, None);
    assert_eq!(config.llm.provider, "ollama");
    assert_eq!(config.llm.model, "tinyllama:1.1b");
    assert_eq!(config.llm.max_tokens, 512);
    assert!(!config.llm.debug);

    let settings = config.llm_settings().unwrap();
    assert_eq!(settings.provider, Provider::Ollama);
    assert_eq!(settings.ollama_url, "http://ollama:11434/api/generate");
    assert_eq!(settings.stop_word, None);
}

#[test]
#[serial]
fn test_prefixed_env_override() {
    clear_env_vars();
    set_var("PHARMACARE_SERVER__PORT", "9090");
    set_var("PHARMACARE_LLM__MODEL", "llama3");

    let config = AppConfig::load_from_args(["pharmacare-chat"]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.llm.model, "llama3");

    clear_env_vars();
}

#[test]
#[serial]
fn test_backend_env_vars() {
    clear_env_vars();
    set_var("API_PROVIDER", "openai");
    set_var("PROVIDER_MODEL", "gpt-4o-mini");
    set_var("LLM_MAX_TOKENS", "512");
    set_var("LLM_STOP_WORD", "###");
    set_var("SYSTEM_PROMPT", "Be brief.");
    set_var("DEBUG", "TRUE");
    set_var("OPENAI_API_KEY", "sk-test");

    let config = AppConfig::load_from_args(["pharmacare-chat"]).expect("Failed to load config");
    assert!(config.llm.debug);

    let settings = config.llm_settings().unwrap();
    assert_eq!(settings.provider, Provider::OpenAI);
    assert_eq!(settings.model, "gpt-4o-mini");
    assert_eq!(settings.max_tokens, 512);
    assert_eq!(settings.stop_word.as_deref(), Some("###"));
    assert_eq!(settings.system_prompt, "Be brief.");
    assert_eq!(settings.api_key.as_deref(), Some("sk-test"));

    clear_env_vars();
}

#[test]
#[serial]
fn test_unknown_provider_is_rejected() {
    clear_env_vars();
    set_var("API_PROVIDER", "cohere");

    let config = AppConfig::load_from_args(["pharmacare-chat"]).expect("Failed to load config");
    let err = config.llm_settings().unwrap_err();
    assert!(err.to_string().contains("Invalid API_PROVIDER"));

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env_vars();
    set_var("PHARMACARE_SERVER__PORT", "9090");

    let config = AppConfig::load_from_args(["pharmacare-chat", "serve", "--port", "7000"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 7000);

    let config = AppConfig::load_from_args([
        "pharmacare-chat",
        "chat",
        "--endpoint",
        "http://backend:8000/chat",
    ])
    .expect("Failed to load config");
    assert_eq!(config.widget.endpoint, "http://backend:8000/chat");

    clear_env_vars();
}

#[test]
#[serial]
fn test_port_env_without_subcommand() {
    clear_env_vars();
    set_var("PHARMACARE_SERVER__PORT", "9090");
    set_var("PORT", "9123");

    let config = AppConfig::load_from_args(["pharmacare-chat"]).expect("Failed to load config");
    assert_eq!(config.server.port, 9123);

    let config = AppConfig::load_from_args(["pharmacare-chat", "--host", "127.0.0.1"])
        .expect("Failed to load config");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9123);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("chat.yaml");
    fs::write(
        &file_path,
        r#"
server:
  port: 7070
widget:
  welcome_message: "Hi from file"
  request_timeout_secs: 15
llm:
  provider: anthropic
"#,
    )
    .expect("Failed to write temp config");

    set_var("CONFIG_FILE", file_path.to_str().unwrap());

    let config = AppConfig::load_from_args(["pharmacare-chat"]).expect("Failed to load config");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.widget.welcome_message, "Hi from file");
    assert_eq!(
        config.widget_timeout(),
        Some(std::time::Duration::from_secs(15))
    );
    assert_eq!(config.llm_settings().unwrap().provider, Provider::Anthropic);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cwd_config_fallback_and_prompt_file() {
    clear_env_vars();

    let original = env::current_dir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.yaml"), "server:\n  port: 6060\n").unwrap();
    fs::write(dir.path().join("system_prompt.txt"), "Prompt from file").unwrap();
    env::set_current_dir(dir.path()).unwrap();

    let result = std::panic::catch_unwind(|| {
        let config = AppConfig::load_from_args(["pharmacare-chat"]).expect("Failed to load config");
        assert_eq!(config.server.port, 6060);
        assert_eq!(config.system_prompt(), "Prompt from file");

        fs::remove_file("system_prompt.txt").unwrap();
        assert_eq!(config.system_prompt(), DEFAULT_SYSTEM_PROMPT);
    });

    env::set_current_dir(original).unwrap();

    if let Err(e) = result {
        std::panic::resume_unwind(e);
    }
}
