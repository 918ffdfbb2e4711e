//! Terminal front-end for the chat widget.
//!
//! Every input line is typed into the widget's input and submitted with
//! Enter. Sends run as background tasks, so the next line can be typed while
//! a reply is pending; the screen is redrawn after every change.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::widget::ChatWidget;

const HELP: &str = "Enter to send - /clear to reset - /close to dismiss errors - /quit to exit";

/// What one line of terminal input means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalInput {
    /// Text typed into the input field, followed by Enter.
    Submit(String),
    /// Clear control.
    Clear,
    /// Dialog close control.
    CloseDialog,
    /// Leave the program.
    Quit,
}

impl TerminalInput {
    /// Interpret one line.
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/clear" => Self::Clear,
            "/close" => Self::CloseDialog,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Submit(line.to_string()),
        }
    }
}

/// Output shared by the input loop and the send tasks.
struct Screen<W> {
    out: Arc<Mutex<W>>,
}

impl<W> Clone for Screen<W> {
    fn clone(&self) -> Self {
        Self {
            out: Arc::clone(&self.out),
        }
    }
}

impl<W: Write> Screen<W> {
    fn new(out: W) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
        }
    }

    fn redraw(&self, widget: &ChatWidget) -> io::Result<()> {
        let mut guard = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let out = &mut *guard;
        execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
        write!(out, "{}\n{HELP}\n> ", widget.render_text())?;
        out.flush()
    }
}

/// Drive `widget` from stdin until EOF or `/quit`.
pub async fn run(widget: ChatWidget) -> io::Result<()> {
    run_with(BufReader::new(tokio::io::stdin()), io::stdout(), widget).await
}

/// Drive `widget` from `input`, drawing to `out`.
///
/// `/quit` abandons sends still in flight. End of input waits for them, so
/// piped input gets its replies.
pub async fn run_with<R, W>(input: R, out: W, widget: ChatWidget) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
{
    let screen = Screen::new(out);
    let mut lines = input.lines();
    let mut sends = JoinSet::new();

    screen.redraw(&widget)?;
    while let Some(line) = lines.next_line().await? {
        match TerminalInput::parse(&line) {
            TerminalInput::Quit => {
                sends.abort_all();
                return Ok(());
            }
            TerminalInput::Clear => widget.click_clear(),
            TerminalInput::CloseDialog => {
                widget.close_error_dialog();
            }
            TerminalInput::Submit(text) => {
                widget.set_input(text);
                if let Some(pending) = widget.begin_send() {
                    let widget = widget.clone();
                    let screen = screen.clone();
                    sends.spawn(async move {
                        let outcome = widget.complete_send(pending).await;
                        debug!(name: "terminal.send.settled", ?outcome, "Send settled");
                        if let Err(e) = screen.redraw(&widget) {
                            warn!(name: "terminal.redraw.failed", error = %e, "Redraw failed");
                        }
                    });
                }
            }
        }
        screen.redraw(&widget)?;

        // Reap finished sends so the set does not grow without bound.
        while sends.try_join_next().is_some() {}
    }

    while sends.join_next().await.is_some() {}
    Ok(())
}
