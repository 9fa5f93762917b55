//! Queued outgoing mail.
//!
//! Senders claim one message at a time with
//! [`MessageQueueRepository::find_first_and_lock`], deliver it, then mark it
//! `Sent` (or `Failed`) with [`MessageQueueRepository::update_status`].

mod message;
mod repository;

pub use message::{MessageStatus, MessageTemplate, QueueMessage};
pub use repository::{
    MessageQueueRepository, MessageTemplateRepository, MESSAGE_QUEUE_TABLE,
    MESSAGE_TEMPLATES_TABLE,
};
