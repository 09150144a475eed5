// ABOUTME: Database management for the report engine with sqlx connection pooling
// ABOUTME: Owns the pool, runs schema migrations, and exposes per-domain managers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

//! # Database Management
//!
//! This module provides database functionality for the report engine. The
//! conversation and participant tables are written by the live session layer
//! and read-only here; the summary/report tables are owned by this pipeline.

mod profile;
mod reports;
mod transcript;

pub use profile::{ParticipantProfile, ProfileManager};
pub use reports::{ReportBookkeeper, RunStatus, SummaryRunRecord, SummaryTargetRecord};
pub use transcript::{ConversationRecord, MessageRecord, MessageSender, TranscriptManager};

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

/// Database manager for transcript, profile, and report storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration statement fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") && !database_url.contains('?')
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a DDL statement fails.
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_source_tables().await?;
        self.migrate_summary_tables().await?;
        self.migrate_report_tables().await?;
        Ok(())
    }

    /// Conversation and participant tables written by the live session layer
    async fn migrate_source_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                person_id TEXT NOT NULL,
                started_at TEXT,
                ended_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversation_messages (
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                seq INTEGER NOT NULL,
                sender TEXT NOT NULL,
                content TEXT NOT NULL,
                PRIMARY KEY (conversation_id, seq)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS persons (
                id TEXT PRIMARY KEY,
                first_name TEXT,
                last_name TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS employments (
                id TEXT PRIMARY KEY,
                person_id TEXT NOT NULL REFERENCES persons(id) ON DELETE CASCADE,
                company_id TEXT,
                function_title TEXT,
                valid_from TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id TEXT PRIMARY KEY,
                name TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_employments_person ON employments(person_id, valid_from)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Summary target/run/summary bookkeeping tables owned by this pipeline
    async fn migrate_summary_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS summary_targets (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                person_id TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                source_updated_at TEXT,
                latest_completed_run_id TEXT,
                UNIQUE (tenant_id, person_id, entity_type, entity_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS summary_runs (
                id TEXT PRIMARY KEY,
                target_id TEXT NOT NULL REFERENCES summary_targets(id) ON DELETE CASCADE,
                status TEXT NOT NULL,
                summary_type TEXT NOT NULL,
                language TEXT NOT NULL,
                prompt_version TEXT NOT NULL,
                model_name TEXT NOT NULL,
                input_hash TEXT NOT NULL,
                started_at TEXT NOT NULL,
                finished_at TEXT,
                error_message TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS summaries (
                id TEXT PRIMARY KEY,
                target_id TEXT NOT NULL REFERENCES summary_targets(id) ON DELETE CASCADE,
                run_id TEXT NOT NULL REFERENCES summary_runs(id),
                summary_type TEXT NOT NULL,
                language TEXT NOT NULL,
                prompt_version TEXT NOT NULL,
                input_hash TEXT NOT NULL,
                source_from_ts TEXT,
                source_to_ts TEXT,
                is_latest BOOLEAN NOT NULL DEFAULT false,
                summary_text TEXT NOT NULL,
                summary_json TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_summary_runs_target ON summary_runs(target_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_summaries_latest ON summaries(target_id, summary_type, language, is_latest)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Report, template, and PDF artifact tables owned by this pipeline
    async fn migrate_report_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS report_templates (
                id TEXT PRIMARY KEY,
                template_key TEXT NOT NULL,
                version TEXT NOT NULL,
                language TEXT NOT NULL,
                section_schema TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT true,
                UNIQUE (template_key, version, language)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversation_reports (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                person_id TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                template_id TEXT NOT NULL REFERENCES report_templates(id),
                summary_run_id TEXT NOT NULL REFERENCES summary_runs(id),
                gespraechsdatum TEXT,
                bericht_generiert_am TEXT NOT NULL,
                report_status TEXT NOT NULL,
                report_text TEXT NOT NULL,
                report_json TEXT NOT NULL,
                UNIQUE (tenant_id, person_id, entity_type, entity_id, template_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS report_pdfs (
                id TEXT PRIMARY KEY,
                report_id TEXT NOT NULL REFERENCES conversation_reports(id) ON DELETE CASCADE,
                storage_bucket TEXT NOT NULL,
                storage_path TEXT NOT NULL,
                file_name TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                file_size_bytes INTEGER NOT NULL,
                pdf_version TEXT NOT NULL,
                generation_status TEXT NOT NULL,
                generated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_report_pdfs_report ON report_pdfs(report_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) async fn create_test_db() -> Result<Database> {
        // Simple in-memory database - each connection gets its own instance
        Database::new("sqlite::memory:").await
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = create_test_db().await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
    }
}
