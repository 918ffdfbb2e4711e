//! HTML and plain-text rendering of the widget view.

use std::fmt::Write as _;

use super::ViewState;
use super::dialog::{DIALOG_ID, ErrorDialog};
use super::message::{MessageNode, Role};

/// Id of the scrolling message container.
pub const MESSAGES_ID: &str = "chat-messages";
/// Id of the text input.
pub const INPUT_ID: &str = "user-input";
/// Id of the send button.
pub const SEND_BUTTON_ID: &str = "send-button";
/// Id of the clear button.
pub const CLEAR_BUTTON_ID: &str = "clear-button";

const OVERLAY_STYLE: &str = "position:fixed;z-index:2000;left:0;top:0;width:100vw;height:100vh;\
                             background:rgba(0,0,0,0.3);display:flex;align-items:center;\
                             justify-content:center";
const BOX_STYLE: &str = "background:#fff;padding:32px 24px;border-radius:12px;\
                         box-shadow:0 2px 16px rgba(0,0,0,0.18);max-width:90vw;max-height:60vh;\
                         overflow-y:auto;text-align:center";

/// Escape text for use as element content or a quoted attribute value.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn node_html(out: &mut String, node: &MessageNode) {
    let _ = write!(
        out,
        r#"<div class="message {}" data-node="{}"><div class="message-content">{}</div></div>"#,
        node.role().css_class(),
        node.id.get(),
        escape(node.text())
    );
}

fn dialog_html(out: &mut String, dialog: &ErrorDialog) {
    let _ = write!(
        out,
        r#"<div id="{DIALOG_ID}" style="{OVERLAY_STYLE}"><div style="{BOX_STYLE}"><h4 style="color:#c00;margin-bottom:16px">{}</h4><div style="margin-bottom:20px">{}</div><button class="btn btn-danger">{}</button></div></div>"#,
        escape(dialog.title()),
        escape(dialog.message()),
        escape(dialog.close_label())
    );
}

/// Render the widget as an HTML fragment.
///
/// The scroll anchor is carried on the container as `data-scroll-to` so a
/// host page can keep the newest message in view.
pub(crate) fn html(view: &ViewState) -> String {
    let mut out = String::new();

    out.push_str(r#"<div class="chat-widget">"#);
    let _ = write!(out, r#"<div id="{MESSAGES_ID}" class="chat-messages""#);
    if let Some(anchor) = view.scroll_anchor {
        let _ = write!(out, r#" data-scroll-to="{}""#, anchor.get());
    }
    out.push('>');
    for node in view.list.nodes() {
        node_html(&mut out, node);
    }
    out.push_str("</div>");

    let _ = write!(
        out,
        r#"<div class="chat-input"><input id="{INPUT_ID}" type="text" value="{}"><button id="{SEND_BUTTON_ID}">Send</button><button id="{CLEAR_BUTTON_ID}">Clear</button></div>"#,
        escape(&view.input)
    );
    out.push_str("</div>");

    if let Some(dialog) = &view.dialog {
        dialog_html(&mut out, dialog);
    }
    out
}

/// Render the widget as a terminal transcript.
pub(crate) fn text(view: &ViewState) -> String {
    let mut out = String::new();
    for node in view.list.nodes() {
        let prefix = match node.role() {
            Role::User => "you>",
            Role::Assistant => "bot>",
        };
        let _ = writeln!(out, "{prefix} {}", node.text());
    }

    if let Some(dialog) = &view.dialog {
        let width = dialog
            .message()
            .chars()
            .count()
            .max(dialog.title().len())
            + 4;
        let rule = "-".repeat(width);
        let _ = writeln!(out, "+{rule}+");
        let _ = writeln!(out, "|  {:<w$}  |", dialog.title(), w = width - 4);
        let _ = writeln!(out, "|  {:<w$}  |", dialog.message(), w = width - 4);
        let _ = writeln!(out, "+{rule}+");
        let _ = writeln!(out, "[{}: /close]", dialog.close_label());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<b>"hi" & 'bye'</b>"#),
            "&lt;b&gt;&quot;hi&quot; &amp; &#39;bye&#39;&lt;/b&gt;"
        );
    }
}
