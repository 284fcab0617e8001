//! nw-notify
//!
//! Outbound notification channels and best-effort broadcast.
//!
//! Each channel takes a title and a markdown body. [`NotifierSet::broadcast`]
//! attempts every registered channel in order; a failing channel never
//! prevents later channels from being attempted, and the first failure is
//! surfaced only after all attempts completed.
//!
//! Credentials are passed in by the caller and never appear in `Debug` or
//! error output.

mod bark;
mod feishu;
mod pushme;

use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

pub use bark::BarkNotifier;
pub use feishu::FeishuNotifier;
pub use pushme::PushmeNotifier;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Transport failure or non-2xx status.
    NetworkUnavailable { channel: &'static str, message: String },
    /// The channel answered but refused the message.
    Rejected { channel: &'static str, message: String },
    /// No credential / no channel configured.
    ConfigurationMissing(String),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::NetworkUnavailable { channel, message } => {
                write!(f, "{channel}: network unavailable: {message}")
            }
            NotifyError::Rejected { channel, message } => {
                write!(f, "{channel}: rejected: {message}")
            }
            NotifyError::ConfigurationMissing(what) => {
                write!(f, "configuration missing: {what}")
            }
        }
    }
}

impl std::error::Error for NotifyError {}

/// Map a transport error without leaking the (credential-bearing) URL.
pub(crate) fn transport_error(channel: &'static str, e: reqwest::Error) -> NotifyError {
    NotifyError::NetworkUnavailable {
        channel,
        message: e.without_url().to_string(),
    }
}

pub(crate) fn build_client(channel: &'static str) -> Result<reqwest::Client, NotifyError> {
    reqwest::Client::builder()
        .timeout(SEND_TIMEOUT)
        .build()
        .map_err(|e| transport_error(channel, e))
}

pub(crate) async fn checked_body(
    channel: &'static str,
    resp: reqwest::Response,
) -> Result<String, NotifyError> {
    let status = resp.status();
    let body = resp.text().await.map_err(|e| transport_error(channel, e))?;
    if !status.is_success() {
        return Err(NotifyError::NetworkUnavailable {
            channel,
            message: format!("http status={}", status.as_u16()),
        });
    }
    Ok(body)
}

// ---------------------------------------------------------------------------
// Notifier trait
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send_markdown(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

// ---------------------------------------------------------------------------
// Broadcast
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ChannelOutcome {
    pub channel: &'static str,
    pub result: Result<(), NotifyError>,
}

#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub outcomes: Vec<ChannelOutcome>,
}

impl BroadcastReport {
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// First failure in attempt order; `ConfigurationMissing` when nothing
    /// was attempted at all.
    pub fn first_error(&self) -> Option<NotifyError> {
        if self.outcomes.is_empty() {
            return Some(NotifyError::ConfigurationMissing(
                "notification channels".to_string(),
            ));
        }
        self.outcomes
            .iter()
            .find_map(|o| o.result.as_ref().err().cloned())
    }

    pub fn into_result(self) -> Result<usize, NotifyError> {
        match self.first_error() {
            Some(e) => Err(e),
            None => Ok(self.delivered()),
        }
    }
}

/// Ordered set of channels.
#[derive(Default)]
pub struct NotifierSet {
    channels: Vec<Box<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.channels.push(notifier);
    }

    pub fn with(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.register(notifier);
        self
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Attempt every channel; never short-circuits.
    pub async fn broadcast(&self, title: &str, body: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        if self.channels.is_empty() {
            warn!(title, "no notification channel configured; alert not delivered");
            return report;
        }

        for channel in &self.channels {
            let result = channel.send_markdown(title, body).await;
            match &result {
                Ok(()) => info!(channel = channel.name(), "notification delivered"),
                Err(e) => warn!(channel = channel.name(), error = %e, "notification failed"),
            }
            report.outcomes.push(ChannelOutcome {
                channel: channel.name(),
                result,
            });
        }

        report
    }
}

impl fmt::Debug for NotifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierSet")
            .field("channels", &self.names())
            .finish()
    }
}
