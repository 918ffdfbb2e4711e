//! PharmaCare customer-support chat
//!
//! A chat widget that forwards customer messages to a `/chat` endpoint and
//! renders the replies, together with the backend that answers them.
//!
//! # Architecture
//!
//! - **Widget**: message list, input, error dialog; one request per send
//! - **Transport**: reqwest client speaking the `{message}` / `{response}` contract
//! - **Server**: Axum backend exposing `/chat` in front of an LLM provider
//! - **Terminal**: interactive front-end that drives a widget from stdin
//!
//! # Modules
//!
//! - [`widget`]: the chat widget and its rendering
//! - [`client`]: HTTP transport for the widget
//! - [`error`]: transport errors and their dialog texts
//! - [`llm`]: provider drivers for the backend
//! - [`server`]: backend router and startup
//! - [`config`]: layered configuration
//! - [`terminal`]: line-based terminal front-end

pub mod client;
pub mod config;
pub mod error;
pub mod llm;
pub mod server;
pub mod terminal;
pub mod widget;

#[cfg(test)]
mod testing;

use crate::config::AppConfig;

use llm::LlmDriver;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Provider driver answering chat requests.
    pub driver: Arc<dyn LlmDriver>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
