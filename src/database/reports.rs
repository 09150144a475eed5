// ABOUTME: Bookkeeping for summary targets, runs, summaries, reports, and PDF artifacts
// ABOUTME: Implements idempotent upserts on natural keys and append-only run tracking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

use crate::config::{ReportConfig, SUMMARY_TYPE};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

// ============================================================================
// Database Record Types
// ============================================================================

/// Status of a summary generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Run created, attempt in flight
    Processing,
    /// Every downstream step succeeded
    Completed,
    /// A downstream step failed; error message captured on the row
    Failed,
}

impl RunStatus {
    /// Convert to the string stored in the status column
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse the stored status column
    #[must_use]
    pub fn from_column(value: &str) -> Self {
        match value {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Processing,
        }
    }
}

/// Database representation of a summary target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryTargetRecord {
    /// Unique target ID
    pub id: String,
    /// Tenant the target belongs to
    pub tenant_id: String,
    /// Person the summarized entity belongs to
    pub person_id: String,
    /// Entity type, always "conversation" for this pipeline
    pub entity_type: String,
    /// Entity identifier (the conversation ID)
    pub entity_id: String,
    /// Pointer to the latest completed run, if any attempt ever succeeded
    pub latest_completed_run_id: Option<String>,
}

/// Database representation of a summary run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRunRecord {
    /// Unique run ID
    pub id: String,
    /// Target this run belongs to
    pub target_id: String,
    /// Current status
    pub status: RunStatus,
    /// Hash of the transcript input
    pub input_hash: String,
    /// When the run started (ISO 8601)
    pub started_at: String,
    /// When the run reached a terminal state (ISO 8601)
    pub finished_at: Option<String>,
    /// Error message for failed runs, captured verbatim
    pub error_message: Option<String>,
}

// ============================================================================
// Report Bookkeeper
// ============================================================================

/// Database operations for the report generation bookkeeping tables
pub struct ReportBookkeeper {
    pool: SqlitePool,
}

impl ReportBookkeeper {
    /// Create a new bookkeeper
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensure the report template row exists and return its ID.
    ///
    /// Upserted on `(template_key, version, language)`; repeated calls reuse
    /// the same row.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn ensure_template(&self, config: &ReportConfig) -> AppResult<String> {
        let section_schema = serde_json::json!({
            "required_fields": [
                "titel",
                "teilnehmer_name",
                "rolle_funktion",
                "unternehmen",
                "gespraechsdatum",
                "gespraechsstatus",
                "gespraechsphase",
                "zielstatus",
                "ausgangslage",
                "erkanntes_hauptthema",
                "zentrale_erkenntnisse",
                "zieldefinition.urspruengliches_ziel",
                "zieldefinition.konkretisiertes_ziel",
                "zieldefinition.neue_ziele",
                "empfehlungen_des_avatars",
                "entwicklungsimpuls",
                "naechster_sinnvoller_schritt",
            ],
        });

        let row = sqlx::query(
            r"
            INSERT INTO report_templates (id, template_key, version, language, section_schema, is_active)
            VALUES ($1, $2, $3, $4, $5, true)
            ON CONFLICT (template_key, version, language)
            DO UPDATE SET section_schema = excluded.section_schema, is_active = true
            RETURNING id
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&config.template_key)
        .bind(&config.template_version)
        .bind(&config.language)
        .bind(section_schema.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to ensure report template: {e}")))?;

        Ok(row.get("id"))
    }

    /// Ensure the summary target row exists and return its ID.
    ///
    /// Upserted on `(tenant_id, person_id, entity_type, entity_id)` so
    /// repeated report requests for one conversation reuse the same target;
    /// `source_updated_at` is refreshed on every attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn upsert_target(
        &self,
        tenant_id: &str,
        person_id: &str,
        entity_type: &str,
        entity_id: &str,
    ) -> AppResult<String> {
        let now = chrono::Utc::now().to_rfc3339();

        let row = sqlx::query(
            r"
            INSERT INTO summary_targets (id, tenant_id, person_id, entity_type, entity_id, source_updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tenant_id, person_id, entity_type, entity_id)
            DO UPDATE SET source_updated_at = excluded.source_updated_at
            RETURNING id
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(tenant_id)
        .bind(person_id)
        .bind(entity_type)
        .bind(entity_id)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert summary target: {e}")))?;

        Ok(row.get("id"))
    }

    /// Create a new run in `processing` state and return its ID
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_run(
        &self,
        target_id: &str,
        config: &ReportConfig,
        input_hash: &str,
    ) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO summary_runs
                (id, target_id, status, summary_type, language, prompt_version, model_name, input_hash, started_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&id)
        .bind(target_id)
        .bind(RunStatus::Processing.as_str())
        .bind(SUMMARY_TYPE)
        .bind(&config.language)
        .bind(&config.prompt_version)
        .bind(&config.model)
        .bind(input_hash)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create summary run: {e}")))?;

        Ok(id)
    }

    /// Mark a run completed
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn complete_run(&self, run_id: &str) -> AppResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r"
            UPDATE summary_runs
            SET status = $1, finished_at = $2
            WHERE id = $3
            ",
        )
        .bind(RunStatus::Completed.as_str())
        .bind(&now)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to complete summary run: {e}")))?;
        Ok(())
    }

    /// Mark a run failed, capturing the error message verbatim
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn fail_run(&self, run_id: &str, error_message: &str) -> AppResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r"
            UPDATE summary_runs
            SET status = $1, finished_at = $2, error_message = $3
            WHERE id = $4
            ",
        )
        .bind(RunStatus::Failed.as_str())
        .bind(&now)
        .bind(error_message)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark summary run failed: {e}")))?;
        Ok(())
    }

    /// Load a run by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the run does not exist.
    pub async fn get_run(&self, run_id: &str) -> AppResult<SummaryRunRecord> {
        let row = sqlx::query(
            r"
            SELECT id, target_id, status, input_hash, started_at, finished_at, error_message
            FROM summary_runs
            WHERE id = $1
            ",
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load summary run: {e}")))?
        .ok_or_else(|| AppError::not_found(format!("Summary run {run_id}")))?;

        Ok(SummaryRunRecord {
            id: row.get("id"),
            target_id: row.get("target_id"),
            status: RunStatus::from_column(&row.get::<String, _>("status")),
            input_hash: row.get("input_hash"),
            started_at: row.get("started_at"),
            finished_at: row.get("finished_at"),
            error_message: row.get("error_message"),
        })
    }

    /// Clear the previous latest summary for this target/type/language.
    ///
    /// Runs immediately before [`Self::insert_summary`]; the ordering of the
    /// two statements is the only guard on `is_latest` exclusivity (no
    /// transaction, accepted single-writer assumption).
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn clear_latest_summary(&self, target_id: &str, language: &str) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE summaries
            SET is_latest = false
            WHERE target_id = $1 AND summary_type = $2 AND language = $3 AND is_latest = true
            ",
        )
        .bind(target_id)
        .bind(SUMMARY_TYPE)
        .bind(language)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to clear latest summary: {e}")))?;
        Ok(())
    }

    /// Insert the new latest summary and return its ID
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_summary(
        &self,
        target_id: &str,
        run_id: &str,
        config: &ReportConfig,
        input_hash: &str,
        source_from_ts: Option<&str>,
        source_to_ts: Option<&str>,
        summary_text: &str,
        summary_json: &serde_json::Value,
    ) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r"
            INSERT INTO summaries
                (id, target_id, run_id, summary_type, language, prompt_version, input_hash,
                 source_from_ts, source_to_ts, is_latest, summary_text, summary_json)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, true, $10, $11)
            ",
        )
        .bind(&id)
        .bind(target_id)
        .bind(run_id)
        .bind(SUMMARY_TYPE)
        .bind(&config.language)
        .bind(&config.prompt_version)
        .bind(input_hash)
        .bind(source_from_ts)
        .bind(source_to_ts)
        .bind(summary_text)
        .bind(summary_json.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert summary: {e}")))?;

        Ok(id)
    }

    /// Upsert the logical report row and return its ID.
    ///
    /// One logical report exists per
    /// `(tenant, person, entity_type, entity_id, template)`; regenerations
    /// update it in place rather than duplicating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_report(
        &self,
        tenant_id: &str,
        person_id: &str,
        entity_type: &str,
        entity_id: &str,
        template_id: &str,
        run_id: &str,
        conversation_date_iso: &str,
        generated_at: &str,
        report_text: &str,
        report_json: &serde_json::Value,
    ) -> AppResult<String> {
        let row = sqlx::query(
            r"
            INSERT INTO conversation_reports
                (id, tenant_id, person_id, entity_type, entity_id, template_id, summary_run_id,
                 gespraechsdatum, bericht_generiert_am, report_status, report_text, report_json)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'final', $10, $11)
            ON CONFLICT (tenant_id, person_id, entity_type, entity_id, template_id)
            DO UPDATE SET
                summary_run_id = excluded.summary_run_id,
                gespraechsdatum = excluded.gespraechsdatum,
                bericht_generiert_am = excluded.bericht_generiert_am,
                report_status = excluded.report_status,
                report_text = excluded.report_text,
                report_json = excluded.report_json
            RETURNING id
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(tenant_id)
        .bind(person_id)
        .bind(entity_type)
        .bind(entity_id)
        .bind(template_id)
        .bind(run_id)
        .bind(conversation_date_iso)
        .bind(generated_at)
        .bind(report_text)
        .bind(report_json.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert conversation report: {e}")))?;

        Ok(row.get("id"))
    }

    /// Advance the report status (final -> pdf_generated within one attempt)
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_report_status(&self, report_id: &str, status: &str) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE conversation_reports
            SET report_status = $1
            WHERE id = $2
            ",
        )
        .bind(status)
        .bind(report_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update report status: {e}")))?;
        Ok(())
    }

    /// Insert a PDF artifact metadata row (insert-only, one per generated PDF)
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_pdf(
        &self,
        report_id: &str,
        bucket: &str,
        storage_path: &str,
        file_name: &str,
        file_size_bytes: i64,
        generated_at: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO report_pdfs
                (id, report_id, storage_bucket, storage_path, file_name, mime_type,
                 file_size_bytes, pdf_version, generation_status, generated_at)
            VALUES ($1, $2, $3, $4, $5, 'application/pdf', $6, 'v1', 'completed', $7)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(report_id)
        .bind(bucket)
        .bind(storage_path)
        .bind(file_name)
        .bind(file_size_bytes)
        .bind(generated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to store PDF metadata: {e}")))?;
        Ok(())
    }

    /// Point the target at its latest completed run.
    ///
    /// Only called after a fully successful attempt; a later failed attempt
    /// never rolls this pointer back.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_latest_completed_run(&self, target_id: &str, run_id: &str) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE summary_targets
            SET latest_completed_run_id = $1
            WHERE id = $2
            ",
        )
        .bind(run_id)
        .bind(target_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update latest run: {e}")))?;
        Ok(())
    }

    /// Load a target by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the target does not exist.
    pub async fn get_target(&self, target_id: &str) -> AppResult<SummaryTargetRecord> {
        let row = sqlx::query(
            r"
            SELECT id, tenant_id, person_id, entity_type, entity_id, latest_completed_run_id
            FROM summary_targets
            WHERE id = $1
            ",
        )
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load summary target: {e}")))?
        .ok_or_else(|| AppError::not_found(format!("Summary target {target_id}")))?;

        Ok(SummaryTargetRecord {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            person_id: row.get("person_id"),
            entity_type: row.get("entity_type"),
            entity_id: row.get("entity_id"),
            latest_completed_run_id: row.get("latest_completed_run_id"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;

    async fn seed_pool() -> SqlitePool {
        let db = crate::database::Database::new("sqlite::memory:").await.unwrap();
        db.pool().clone()
    }

    #[tokio::test]
    async fn test_target_upsert_is_idempotent() {
        let bookkeeper = ReportBookkeeper::new(seed_pool().await);
        let first = bookkeeper
            .upsert_target("default", "p1", "conversation", "c1")
            .await
            .unwrap();
        let second = bookkeeper
            .upsert_target("default", "p1", "conversation", "c1")
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_template_upsert_reuses_row() {
        let bookkeeper = ReportBookkeeper::new(seed_pool().await);
        let config = ReportConfig::default();
        let first = bookkeeper.ensure_template(&config).await.unwrap();
        let second = bookkeeper.ensure_template(&config).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_run_lifecycle_failed_keeps_message() {
        let bookkeeper = ReportBookkeeper::new(seed_pool().await);
        let config = ReportConfig::default();
        let target_id = bookkeeper
            .upsert_target("default", "p1", "conversation", "c1")
            .await
            .unwrap();
        let run_id = bookkeeper.create_run(&target_id, &config, "abc").await.unwrap();

        let run = bookkeeper.get_run(&run_id).await.unwrap();
        assert_eq!(run.status, RunStatus::Processing);
        assert!(run.finished_at.is_none());

        bookkeeper.fail_run(&run_id, "boom").await.unwrap();
        let run = bookkeeper.get_run(&run_id).await.unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error_message.as_deref(), Some("boom"));
        assert!(run.finished_at.is_some());
    }
}
