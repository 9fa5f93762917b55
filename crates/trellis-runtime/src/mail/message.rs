use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use trellis_core::error::TrellisError;

/// Delivery state of a queued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    /// Waiting to be claimed by a sender.
    Queued,
    /// Claimed by exactly one sender.
    Locked,
    /// Delivered.
    Sent,
    /// Delivery gave up.
    Failed,
}

impl MessageStatus {
    /// Single-letter code stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "Q",
            Self::Locked => "L",
            Self::Sent => "S",
            Self::Failed => "F",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Q" => Ok(Self::Queued),
            "L" => Ok(Self::Locked),
            "S" => Ok(Self::Sent),
            "F" => Ok(Self::Failed),
            other => Err(TrellisError::Validation(format!(
                "unknown message status '{}'",
                other
            ))),
        }
    }
}

/// A message in the outgoing queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    pub id: Uuid,
    /// Delivery channel discriminator.
    pub channel: i32,
    pub recipient: String,
    pub title: String,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    /// Set on the transition to `Sent`.
    pub sent_at: Option<DateTime<Utc>>,
}

impl QueueMessage {
    /// Create a queued message.
    pub fn new(
        channel: i32,
        recipient: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel,
            recipient: recipient.into(),
            title: title.into(),
            content: content.into(),
            status: MessageStatus::Queued,
            created_at: Utc::now(),
            sent_at: None,
        }
    }
}

/// A localized message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    pub id: i64,
    pub template: String,
    pub language: String,
    pub channel: i32,
    pub subject: String,
    pub body: String,
}
