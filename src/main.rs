//! PharmaCare chat
//!
//! Entry point: `serve` runs the `/chat` backend, `chat` runs the terminal
//! widget against a backend.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pharmacare_chat::client::{ChatClient, ChatTransport};
use pharmacare_chat::config::{AppConfig, Cli, Command};
use pharmacare_chat::widget::{ChatWidget, WidgetOptions};
use pharmacare_chat::{server, terminal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before anything reads the environment
    let _ = dotenv();

    // Initialize tracing (M-LOG-STRUCTURED)
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match AppConfig::from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("Configuration error: {msg}");
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::start_server(Arc::new(config)).await,
        Command::Chat { .. } => {
            let client = match config.widget_timeout() {
                Some(timeout) => ChatClient::with_timeout(&config.widget.endpoint, timeout)?,
                None => ChatClient::new(&config.widget.endpoint)?,
            };
            info!(
                name: "widget.started",
                endpoint = %client.endpoint(),
                "Terminal chat started"
            );

            let transport: Arc<dyn ChatTransport> = Arc::new(client);
            let widget = ChatWidget::new(
                transport,
                WidgetOptions {
                    welcome_message: config.widget.welcome_message.clone(),
                },
            );
            terminal::run(widget).await?;
            Ok(())
        }
    }
}
