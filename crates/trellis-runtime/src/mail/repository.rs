use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use trellis_core::error::Result;

use super::message::{MessageStatus, MessageTemplate, QueueMessage};

/// Outgoing message queue table.
pub const MESSAGE_QUEUE_TABLE: &str = "trellis_message_queue";

/// Message template table.
pub const MESSAGE_TEMPLATES_TABLE: &str = "trellis_message_templates";

const MESSAGE_COLUMNS: &str =
    "id, channel, recipient, title, content, status, created_at, sent_at";

/// Queue operations for outgoing messages.
#[derive(Clone)]
pub struct MessageQueueRepository {
    pool: PgPool,
}

impl MessageQueueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a message to the queue.
    pub async fn enqueue(&self, message: &QueueMessage) -> Result<Uuid> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            MESSAGE_QUEUE_TABLE, MESSAGE_COLUMNS
        ))
        .bind(message.id)
        .bind(message.channel)
        .bind(&message.recipient)
        .bind(&message.title)
        .bind(&message.content)
        .bind(message.status.as_str())
        .bind(message.created_at)
        .bind(message.sent_at)
        .execute(&self.pool)
        .await?;

        Ok(message.id)
    }

    /// Fetch a message by id.
    pub async fn fetch(&self, id: Uuid) -> Result<Option<QueueMessage>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            MESSAGE_COLUMNS, MESSAGE_QUEUE_TABLE
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(message_from_row).transpose()
    }

    /// List messages by channel and status, oldest first.
    ///
    /// No rows are locked; use [`Self::find_first_and_lock`] to dequeue.
    pub async fn find_by_status(
        &self,
        channel: i32,
        status: MessageStatus,
        limit: i64,
    ) -> Result<Vec<QueueMessage>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM {}
            WHERE channel = $1 AND status = $2
            ORDER BY created_at ASC, id ASC
            LIMIT $3
            "#,
            MESSAGE_COLUMNS, MESSAGE_QUEUE_TABLE
        ))
        .bind(channel)
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(message_from_row).collect()
    }

    /// Claim the oldest message in `status` on `channel`, moving it to `Locked`.
    ///
    /// Concurrent callers never receive the same row: the candidate is
    /// selected with `FOR UPDATE SKIP LOCKED` and the update re-checks the
    /// status, all inside one transaction.
    pub async fn find_first_and_lock(
        &self,
        channel: i32,
        status: MessageStatus,
    ) -> Result<Option<QueueMessage>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            WITH claimable AS (
                SELECT id
                FROM {table}
                WHERE channel = $1 AND status = $2
                ORDER BY created_at ASC, id ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE {table}
            SET status = $3
            WHERE id IN (SELECT id FROM claimable)
              AND status = $2
            RETURNING {columns}
            "#,
            table = MESSAGE_QUEUE_TABLE,
            columns = MESSAGE_COLUMNS
        ))
        .bind(channel)
        .bind(status.as_str())
        .bind(MessageStatus::Locked.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        row.as_ref().map(message_from_row).transpose()
    }

    /// Set the status of a claimed message. Moving to `Sent` stamps `sent_at`.
    ///
    /// Returns `None` if the message does not exist. The caller must already
    /// hold the claim on the row.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: MessageStatus,
    ) -> Result<Option<QueueMessage>> {
        let sent_at: Option<DateTime<Utc>> = (status == MessageStatus::Sent).then(Utc::now);

        let row = sqlx::query(&format!(
            r#"
            UPDATE {}
            SET status = $2, sent_at = COALESCE($3, sent_at)
            WHERE id = $1
            RETURNING {}
            "#,
            MESSAGE_QUEUE_TABLE, MESSAGE_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(sent_at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(message_from_row).transpose()
    }

    /// Remove every message. Administrative and test use only.
    pub async fn truncate(&self) -> Result<()> {
        sqlx::query(&format!("TRUNCATE TABLE {}", MESSAGE_QUEUE_TABLE))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn message_from_row(row: &PgRow) -> Result<QueueMessage> {
    Ok(QueueMessage {
        id: row.try_get("id")?,
        channel: row.try_get("channel")?,
        recipient: row.try_get("recipient")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        created_at: row.try_get("created_at")?,
        sent_at: row.try_get("sent_at")?,
    })
}

/// Lookup of localized message templates.
#[derive(Clone)]
pub struct MessageTemplateRepository {
    pool: PgPool,
}

impl MessageTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_template(
        &self,
        template: &str,
        language: &str,
        channel: i32,
    ) -> Result<Option<MessageTemplate>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT id, template, language, channel, subject, body
            FROM {}
            WHERE template = $1 AND language = $2 AND channel = $3
            LIMIT 1
            "#,
            MESSAGE_TEMPLATES_TABLE
        ))
        .bind(template)
        .bind(language)
        .bind(channel)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<MessageTemplate> {
            Ok(MessageTemplate {
                id: row.try_get("id")?,
                template: row.try_get("template")?,
                language: row.try_get("language")?,
                channel: row.try_get("channel")?,
                subject: row.try_get("subject")?,
                body: row.try_get("body")?,
            })
        })
        .transpose()
    }
}
