// ABOUTME: Database operations for loading conversation transcripts
// ABOUTME: Fails fast on missing conversations and empty transcripts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

// ============================================================================
// Database Record Types
// ============================================================================

/// Database representation of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Unique conversation ID
    pub id: String,
    /// Person who participated in the conversation
    pub person_id: String,
    /// When the conversation started (ISO 8601)
    pub started_at: Option<String>,
    /// When the conversation ended (ISO 8601)
    pub ended_at: Option<String>,
}

/// Sender of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    /// The human participant
    Participant,
    /// The avatar coach
    Avatar,
}

impl MessageSender {
    /// Speaker label used in the rendered transcript
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Participant => "Teilnehmer",
            Self::Avatar => "Avatar",
        }
    }

    /// Parse the stored sender column. Anything that is not the avatar is
    /// treated as the participant, matching how the live session writes rows.
    #[must_use]
    pub fn from_column(value: &str) -> Self {
        if value == "avatar" {
            Self::Avatar
        } else {
            Self::Participant
        }
    }
}

/// Database representation of a transcript message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Ordering key, unique per conversation
    pub seq: i64,
    /// Who sent the message
    pub sender: MessageSender,
    /// Message content
    pub content: String,
}

// ============================================================================
// Transcript Manager
// ============================================================================

/// Read-only access to conversations and their transcript messages
pub struct TranscriptManager {
    pool: SqlitePool,
}

impl TranscriptManager {
    /// Create a new transcript manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load a conversation by ID
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the conversation does not exist or has no
    /// `person_id`, or a database error if the query fails.
    pub async fn get_conversation(&self, conversation_id: &str) -> AppResult<ConversationRecord> {
        let row = sqlx::query(
            r"
            SELECT id, person_id, started_at, ended_at
            FROM conversations
            WHERE id = $1
            ",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load conversation: {e}")))?;

        let row = row.ok_or_else(|| AppError::not_found(format!("Conversation {conversation_id}")))?;

        let record = ConversationRecord {
            id: row.get("id"),
            person_id: row.get::<String, _>("person_id").trim().to_owned(),
            started_at: row.get("started_at"),
            ended_at: row.get("ended_at"),
        };

        if record.person_id.is_empty() {
            return Err(AppError::not_found(format!(
                "Person for conversation {conversation_id}"
            )));
        }

        Ok(record)
    }

    /// Load all transcript messages for a conversation, ordered by sequence
    ///
    /// # Errors
    ///
    /// Returns `EmptyTranscript` if the conversation has no messages, or a
    /// database error if the query fails. Both are terminal for the attempt.
    pub async fn get_messages(&self, conversation_id: &str) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT seq, sender, content
            FROM conversation_messages
            WHERE conversation_id = $1
            ORDER BY seq ASC
            ",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load transcript: {e}")))?;

        let messages: Vec<MessageRecord> = rows
            .into_iter()
            .map(|r| MessageRecord {
                seq: r.get("seq"),
                sender: MessageSender::from_column(&r.get::<String, _>("sender")),
                content: r.get("content"),
            })
            .collect();

        if messages.is_empty() {
            return Err(AppError::empty_transcript(conversation_id));
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    async fn seed_pool() -> SqlitePool {
        let db = crate::database::Database::new("sqlite::memory:").await.unwrap();
        db.pool().clone()
    }

    #[tokio::test]
    async fn test_missing_conversation_is_not_found() {
        let pool = seed_pool().await;
        let manager = TranscriptManager::new(pool);
        let err = manager.get_conversation("nope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);
    }

    #[tokio::test]
    async fn test_empty_transcript_fails_fast() {
        let pool = seed_pool().await;
        sqlx::query("INSERT INTO conversations (id, person_id) VALUES ('c1', 'p1')")
            .execute(&pool)
            .await
            .unwrap();
        let manager = TranscriptManager::new(pool);
        manager.get_conversation("c1").await.unwrap();
        let err = manager.get_messages("c1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyTranscript);
    }

    #[tokio::test]
    async fn test_messages_are_ordered_by_seq() {
        let pool = seed_pool().await;
        sqlx::query("INSERT INTO conversations (id, person_id) VALUES ('c1', 'p1')")
            .execute(&pool)
            .await
            .unwrap();
        for (seq, sender, content) in [(2, "avatar", "Guten Tag"), (1, "participant", "Hallo")] {
            sqlx::query(
                "INSERT INTO conversation_messages (conversation_id, seq, sender, content) VALUES ('c1', $1, $2, $3)",
            )
            .bind(seq)
            .bind(sender)
            .bind(content)
            .execute(&pool)
            .await
            .unwrap();
        }

        let manager = TranscriptManager::new(pool);
        let messages = manager.get_messages("c1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].seq, 1);
        assert_eq!(messages[0].sender, MessageSender::Participant);
        assert_eq!(messages[1].sender, MessageSender::Avatar);
    }
}
