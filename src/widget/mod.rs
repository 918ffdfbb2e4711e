//! The chat widget.
//!
//! A [`ChatWidget`] owns the view of one conversation panel: the message
//! list, the text input, and the error dialog. It forwards user text through
//! a [`ChatTransport`] and renders whatever comes back.
//!
//! # Architecture
//!
//! - [`message`]: message nodes and the ordered list they live in
//! - [`dialog`]: the modal error dialog
//! - [`render`]: HTML and terminal rendering of the current view
//!
//! The widget is a cheap handle over shared state. Cloning it and driving
//! the clones from separate tasks is how overlapping sends happen; the view
//! lock is never held while a request is in flight.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pharmacare_chat::client::ChatClient;
//! use pharmacare_chat::widget::{ChatWidget, WidgetOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ChatClient::new("http://localhost:8000/chat")?;
//! let widget = ChatWidget::new(Arc::new(client), WidgetOptions::default());
//!
//! widget.set_input("Do you deliver on Sundays?");
//! widget.click_send().await;
//! println!("{}", widget.render_text());
//! # Ok(())
//! # }
//! ```

pub mod dialog;
pub mod message;
pub mod render;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::ChatTransport;

pub use dialog::ErrorDialog;
pub use message::{Message, MessageList, MessageNode, NodeId, NodeKind, Role};

/// Greeting shown on a fresh or cleared conversation.
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Hello! I'm PharmaCare's virtual assistant. How can I help you today?";

/// Key that submits the input field.
pub const SUBMIT_KEY: &str = "Enter";

/// Construction options.
#[derive(Debug, Clone)]
pub struct WidgetOptions {
    /// Text of the assistant message a clear resets the list to.
    pub welcome_message: String,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
        }
    }
}

/// How one send interaction ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The trimmed input was empty; nothing was appended or sent.
    Ignored,
    /// The reply was appended as an assistant message.
    Replied(String),
    /// The endpoint answered with an empty reply; no bubble was appended.
    Empty,
    /// The request failed and the dialog shows this text.
    Failed(String),
    /// The reply arrived after a clear and was dropped.
    Discarded,
}

/// A send that has shown its placeholder and awaits the request.
#[derive(Debug)]
#[must_use = "a pending send leaves its placeholder on screen until completed"]
pub struct PendingSend {
    message: String,
    placeholder: NodeId,
    generation: u64,
}

impl PendingSend {
    /// The trimmed text being sent.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The placeholder node this send will remove.
    pub fn placeholder(&self) -> NodeId {
        self.placeholder
    }
}

/// Mutable view state behind the widget handle.
#[derive(Debug)]
pub(crate) struct ViewState {
    pub(crate) list: MessageList,
    pub(crate) input: String,
    pub(crate) dialog: Option<ErrorDialog>,
    /// Node the panel is scrolled to (the newest message).
    pub(crate) scroll_anchor: Option<NodeId>,
    /// Bumped by every clear.
    generation: u64,
}

impl ViewState {
    fn append(&mut self, message: Message) -> NodeId {
        let id = self.list.push_message(message);
        self.scroll_anchor = Some(id);
        id
    }
}

struct WidgetInner {
    transport: Arc<dyn ChatTransport>,
    welcome_message: String,
    view: RwLock<ViewState>,
}

impl std::fmt::Debug for WidgetInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetInner")
            .field("welcome_message", &self.welcome_message)
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

/// A chat panel bound to one transport.
#[derive(Debug)]
pub struct ChatWidget {
    inner: Arc<WidgetInner>,
}

impl Clone for ChatWidget {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ChatWidget {
    /// Create a widget showing the welcome message.
    pub fn new(transport: Arc<dyn ChatTransport>, options: WidgetOptions) -> Self {
        let mut view = ViewState {
            list: MessageList::new(),
            input: String::new(),
            dialog: None,
            scroll_anchor: None,
            generation: 0,
        };
        view.append(Message::new(
            options.welcome_message.clone(),
            Role::Assistant,
        ));

        Self {
            inner: Arc::new(WidgetInner {
                transport,
                welcome_message: options.welcome_message,
                view: RwLock::new(view),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ViewState> {
        self.inner.view.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ViewState> {
        self.inner
            .view
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Append a message and scroll it into view. Content is not validated.
    pub fn add_message(&self, content: impl Into<String>, is_user: bool) -> NodeId {
        self.write()
            .append(Message::new(content, Role::from_is_user(is_user)))
    }

    /// Deliver `message` through the transport.
    ///
    /// On failure the error dialog is opened and `None` is returned.
    pub async fn send_message(&self, message: &str) -> Option<String> {
        self.deliver(message).await.ok()
    }

    /// Like [`Self::send_message`], but hands back the dialog text on failure.
    async fn deliver(&self, message: &str) -> std::result::Result<String, String> {
        let request_id = Uuid::new_v4();
        debug!(name: "widget.send.started", %request_id, "Sending chat message");

        match self.inner.transport.send(message).await {
            Ok(reply) => {
                debug!(name: "widget.send.completed", %request_id, "Chat reply received");
                Ok(reply)
            }
            Err(err) => {
                warn!(
                    name: "widget.send.failed",
                    %request_id,
                    server_reported = err.is_server_reported(),
                    error = %err,
                    "Chat request failed"
                );
                let text = err.dialog_message();
                self.show_error_dialog(text.clone());
                Err(text)
            }
        }
    }

    /// Open the error dialog, replacing any dialog already open.
    pub fn show_error_dialog(&self, message: impl Into<String>) {
        self.write().dialog = Some(ErrorDialog::new(message));
    }

    /// Activate the dialog's close control. Returns false when none was open.
    pub fn close_error_dialog(&self) -> bool {
        self.write().dialog.take().is_some()
    }

    /// Replace the input field's text.
    pub fn set_input(&self, text: impl Into<String>) {
        self.write().input = text.into();
    }

    /// Send-button click.
    ///
    /// Appends the trimmed input as a user message, clears the input, shows
    /// a placeholder while the request runs, then replaces the placeholder
    /// with the reply (or nothing, if the request failed).
    pub async fn click_send(&self) -> SendOutcome {
        match self.begin_send() {
            Some(pending) => self.complete_send(pending).await,
            None => SendOutcome::Ignored,
        }
    }

    /// First half of a send: take the input and show the placeholder.
    ///
    /// Returns `None` (and changes nothing) when the trimmed input is empty.
    pub fn begin_send(&self) -> Option<PendingSend> {
        let mut view = self.write();
        let message = view.input.trim().to_string();
        if message.is_empty() {
            return None;
        }
        view.append(Message::new(message.clone(), Role::User));
        view.input.clear();
        let placeholder = view.list.push_placeholder();
        Some(PendingSend {
            message,
            placeholder,
            generation: view.generation,
        })
    }

    /// Second half of a send: run the request and settle the placeholder.
    pub async fn complete_send(&self, pending: PendingSend) -> SendOutcome {
        let reply = self.deliver(&pending.message).await;

        let mut view = self.write();
        view.list.remove(pending.placeholder);
        match reply {
            Err(text) => SendOutcome::Failed(text),
            Ok(_) if view.generation != pending.generation => {
                debug!(name: "widget.reply.discarded", "Dropping reply that arrived after a clear");
                SendOutcome::Discarded
            }
            Ok(reply) if reply.is_empty() => SendOutcome::Empty,
            Ok(reply) => {
                view.append(Message::new(reply.clone(), Role::Assistant));
                SendOutcome::Replied(reply)
            }
        }
    }

    /// Key press in the input field. Enter behaves like the send button.
    pub async fn key_press(&self, key: &str) -> SendOutcome {
        if key == SUBMIT_KEY {
            self.click_send().await
        } else {
            SendOutcome::Ignored
        }
    }

    /// Clear-button click: reset the list to the welcome message.
    pub fn click_clear(&self) {
        let mut view = self.write();
        view.list.clear();
        view.generation += 1;
        view.append(Message::new(
            self.inner.welcome_message.clone(),
            Role::Assistant,
        ));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Current input text.
    pub fn input(&self) -> String {
        self.read().input.clone()
    }

    /// Messages in render order, placeholders excluded.
    pub fn messages(&self) -> Vec<Message> {
        self.read().list.messages().cloned().collect()
    }

    /// All list children in render order.
    pub fn nodes(&self) -> Vec<MessageNode> {
        self.read().list.nodes().to_vec()
    }

    /// Number of placeholders on screen.
    pub fn pending(&self) -> usize {
        self.read().list.pending()
    }

    /// The open dialog, if any.
    pub fn error_dialog(&self) -> Option<ErrorDialog> {
        self.read().dialog.clone()
    }

    /// Node the panel is scrolled to.
    pub fn scroll_anchor(&self) -> Option<NodeId> {
        self.read().scroll_anchor
    }

    /// HTML snapshot of the widget.
    pub fn render_html(&self) -> String {
        render::html(&self.read())
    }

    /// Terminal transcript of the widget.
    pub fn render_text(&self) -> String {
        render::text(&self.read())
    }
}
