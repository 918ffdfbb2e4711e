//! Modal error dialog.

/// Element id of the dialog overlay. Only one element with this id exists.
pub const DIALOG_ID: &str = "chatbot-error-dialog";

/// Heading shown at the top of the dialog.
pub const DIALOG_TITLE: &str = "Chatbot Error";

/// Label of the dismiss control.
pub const CLOSE_LABEL: &str = "Close";

/// A full-viewport overlay reporting one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDialog {
    message: String,
}

impl ErrorDialog {
    /// Create a dialog for `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Dialog heading.
    pub fn title(&self) -> &'static str {
        DIALOG_TITLE
    }

    /// Body text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Dismiss control label.
    pub fn close_label(&self) -> &'static str {
        CLOSE_LABEL
    }
}
