//! Non-blocking replacements for alert, confirm and page redirects.

use std::fmt::{self, Display, Formatter};
use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    TeacherDashboard,
    StudentDashboard,
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Route::Login => write!(f, "login"),
            Route::TeacherDashboard => write!(f, "teacher dashboard"),
            Route::StudentDashboard => write!(f, "student dashboard"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Success(String),
    Error(String),
    Redirect(Route),
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Notice::Info(message) => write!(f, "{}", message),
            Notice::Success(message) => write!(f, "✔ {}", message),
            Notice::Error(message) => write!(f, "✘ {}", message),
            Notice::Redirect(route) => write!(f, "→ go to {}", route),
        }
    }
}

/// Must not block the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, question: &str) -> bool;
}

/// Forwards notices to a receiver, used by tests and embedding front ends.
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        if self.sender.send(notice).is_err() {
            tracing::debug!("notice receiver dropped");
        }
    }
}

/// Writes notices to stderr so stdout only carries rendered regions.
#[derive(Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        let mut stderr = std::io::stderr().lock();
        if let Err(e) = writeln!(stderr, "{}", notice) {
            tracing::warn!("failed to write notice: {}", e);
        }
    }
}

/// Answers every question the same way.
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, question: &str) -> bool {
        tracing::debug!(question, answer = self.0, "auto confirm");
        self.0
    }
}

/// Asks on stderr and reads one line from stdin.
#[derive(Default)]
pub struct TerminalConfirmer;

#[async_trait]
impl Confirmer for TerminalConfirmer {
    async fn confirm(&self, question: &str) -> bool {
        let mut stderr = tokio::io::stderr();
        let prompt = format!("{} [y/N] ", question);
        if stderr.write_all(prompt.as_bytes()).await.is_err() || stderr.flush().await.is_err() {
            return false;
        }

        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match stdin.read_line(&mut line).await {
            Ok(_) => is_yes(&line),
            Err(e) => {
                tracing::warn!("failed to read confirmation: {}", e);
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
