// ABOUTME: End-to-end report generation pipeline for a single conversation
// ABOUTME: Orchestrates transcript load, summarization, rendering, upload, bookkeeping

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::config::{ReportConfig, DEFAULT_TENANT};
use crate::database::{Database, ProfileManager, ReportBookkeeper, TranscriptManager};
use crate::errors::{AppError, AppResult};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::report::payload::sanitize_report_payload;
use crate::report::pdf::build_report_pdf;
use crate::report::prompt::{build_user_prompt, transcript_to_text, SUMMARY_SYSTEM_PROMPT};
use crate::report::text::build_report_text;
use crate::storage::{pdf_storage_path, ReportStorage};

/// Entity type recorded on targets and reports
const ENTITY_TYPE: &str = "conversation";

/// Sampling temperature for the summarization call
const SUMMARY_TEMPERATURE: f32 = 0.2;

/// Outcome of one successful generation attempt
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    /// Logical report row ID
    pub report_id: String,
    /// Run that produced this report
    pub run_id: String,
    /// Target the run belongs to
    pub target_id: String,
    /// Storage path of the uploaded PDF
    pub storage_path: String,
    /// Size of the uploaded PDF in bytes
    pub pdf_size_bytes: usize,
}

/// Report generation pipeline.
///
/// One instance serves any number of conversations; every call to
/// [`Self::generate`] is a self-contained attempt with its own run row.
pub struct ReportGenerator {
    transcripts: TranscriptManager,
    profiles: ProfileManager,
    bookkeeper: ReportBookkeeper,
    llm: Arc<dyn LlmProvider>,
    storage: Arc<dyn ReportStorage>,
    config: ReportConfig,
}

impl ReportGenerator {
    /// Create a new generator over the given database, provider, and storage
    #[must_use]
    pub fn new(
        database: &Database,
        llm: Arc<dyn LlmProvider>,
        storage: Arc<dyn ReportStorage>,
        config: ReportConfig,
    ) -> Self {
        Self {
            transcripts: TranscriptManager::new(database.pool().clone()),
            profiles: ProfileManager::new(database.pool().clone()),
            bookkeeper: ReportBookkeeper::new(database.pool().clone()),
            llm,
            storage,
            config,
        }
    }

    /// Generate the report for one conversation.
    ///
    /// Loads the transcript, creates bookkeeping rows, calls the model,
    /// sanitizes and renders the result, uploads the PDF, and advances the
    /// run to `completed`. Any failure after run creation marks the run
    /// `failed` with the error message captured verbatim; rows written before
    /// the failure are left in place for the next attempt to supersede.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for a missing conversation or person,
    /// `EmptyTranscript` for a conversation without messages (both before any
    /// rows are written), or the underlying summarization, database, or
    /// storage error of the failed step.
    #[instrument(skip(self), fields(conversation_id = %conversation_id))]
    pub async fn generate(&self, conversation_id: &str) -> AppResult<GeneratedReport> {
        // Input loading happens before any bookkeeping rows exist, so a
        // missing conversation or empty transcript never leaves a failed run
        let conversation = self.transcripts.get_conversation(conversation_id).await?;
        let messages = self.transcripts.get_messages(conversation_id).await?;

        let transcript = transcript_to_text(&messages);
        let input_hash = hex::encode(Sha256::digest(transcript.as_bytes()));

        let profile = self.profiles.resolve_participant(&conversation.person_id).await;
        let conversation_date = german_date(
            conversation
                .ended_at
                .as_deref()
                .or(conversation.started_at.as_deref()),
        );

        let target_id = self
            .bookkeeper
            .upsert_target(
                DEFAULT_TENANT,
                &conversation.person_id,
                ENTITY_TYPE,
                conversation_id,
            )
            .await?;
        let run_id = self
            .bookkeeper
            .create_run(&target_id, &self.config, &input_hash)
            .await?;

        info!(
            target_id = %target_id,
            run_id = %run_id,
            messages = messages.len(),
            "Starting report generation"
        );

        match self
            .run_attempt(
                &conversation.person_id,
                conversation_id,
                &conversation.started_at,
                &conversation.ended_at,
                &transcript,
                &input_hash,
                &profile,
                &conversation_date,
                &target_id,
                &run_id,
            )
            .await
        {
            Ok(report) => {
                info!(report_id = %report.report_id, run_id = %run_id, "Report generation completed");
                Ok(report)
            }
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "Report generation failed");
                // Best effort; the attempt's own error is the one worth surfacing
                if let Err(mark_err) = self.bookkeeper.fail_run(&run_id, &err.to_string()).await {
                    warn!(run_id = %run_id, error = %mark_err, "Failed to mark run failed");
                }
                Err(err)
            }
        }
    }

    /// The fallible tail of the pipeline, from the model call onward
    #[allow(clippy::too_many_arguments)]
    async fn run_attempt(
        &self,
        person_id: &str,
        conversation_id: &str,
        started_at: &Option<String>,
        ended_at: &Option<String>,
        transcript: &str,
        input_hash: &str,
        profile: &crate::database::ParticipantProfile,
        conversation_date: &str,
        target_id: &str,
        run_id: &str,
    ) -> AppResult<GeneratedReport> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(transcript, profile, conversation_date)),
        ])
        .with_model(&self.config.model)
        .with_temperature(SUMMARY_TEMPERATURE)
        .with_json_mode();

        let response = self.llm.complete(&request).await?;
        let raw: serde_json::Value = serde_json::from_str(&response.content).map_err(|e| {
            AppError::summarization_parse(format!("Summary response was not valid JSON: {e}"))
        })?;

        let payload = sanitize_report_payload(&raw, profile, conversation_date);
        let report_text = build_report_text(&payload);

        let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut report_json = serde_json::to_value(&payload)
            .map_err(|e| AppError::internal(format!("Failed to serialize report: {e}")))?;
        if let Some(obj) = report_json.as_object_mut() {
            obj.insert(
                "template_version".to_owned(),
                serde_json::Value::String(self.config.template_version.clone()),
            );
            obj.insert(
                "bericht_generiert_am".to_owned(),
                serde_json::Value::String(generated_at.clone()),
            );
        }

        let template_id = self.bookkeeper.ensure_template(&self.config).await?;

        self.bookkeeper
            .clear_latest_summary(target_id, &self.config.language)
            .await?;
        self.bookkeeper
            .insert_summary(
                target_id,
                run_id,
                &self.config,
                input_hash,
                started_at.as_deref(),
                ended_at.as_deref(),
                &report_text,
                &report_json,
            )
            .await?;

        let report_id = self
            .bookkeeper
            .upsert_report(
                DEFAULT_TENANT,
                person_id,
                ENTITY_TYPE,
                conversation_id,
                &template_id,
                run_id,
                // Date column reflects the conversation window, not whatever
                // date the model chose to echo back
                &german_to_iso(conversation_date),
                &generated_at,
                &report_text,
                &report_json,
            )
            .await?;

        let pdf_bytes = build_report_pdf(&report_text)?;
        let storage_path =
            pdf_storage_path(DEFAULT_TENANT, person_id, conversation_id, &generated_at);
        self.storage
            .upload_pdf(&self.config.bucket, &storage_path, &pdf_bytes)
            .await?;

        let file_name = format!("{conversation_id}.pdf");
        let file_size = i64::try_from(pdf_bytes.len())
            .map_err(|_| AppError::internal("PDF size overflow"))?;
        self.bookkeeper
            .insert_pdf(
                &report_id,
                &self.config.bucket,
                &storage_path,
                &file_name,
                file_size,
                &generated_at,
            )
            .await?;
        self.bookkeeper
            .set_report_status(&report_id, "pdf_generated")
            .await?;

        self.bookkeeper.complete_run(run_id).await?;
        self.bookkeeper
            .set_latest_completed_run(target_id, run_id)
            .await?;

        Ok(GeneratedReport {
            report_id,
            run_id: run_id.to_owned(),
            target_id: target_id.to_owned(),
            storage_path,
            pdf_size_bytes: pdf_bytes.len(),
        })
    }
}

/// Format a stored timestamp as a German date (DD.MM.YYYY).
///
/// Falls back to today when the timestamp is absent or unparseable.
fn german_date(timestamp: Option<&str>) -> String {
    timestamp
        .and_then(parse_date)
        .unwrap_or_else(|| Utc::now().date_naive())
        .format("%d.%m.%Y")
        .to_string()
}

fn parse_date(timestamp: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.date_naive());
    }
    // Date-only values and space-separated timestamps carry the date in the
    // first ten characters
    let prefix = timestamp.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Convert a German date (DD.MM.YYYY) back to ISO (YYYY-MM-DD) for the date
/// column. Values not in the German shape are stored unchanged.
fn german_to_iso(date: &str) -> String {
    let parts: Vec<&str> = date.split('.').collect();
    match parts.as_slice() {
        [day, month, year] => format!("{year}-{month}-{day}"),
        _ => date.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_german_date_from_rfc3339() {
        assert_eq!(
            german_date(Some("2025-01-02T03:04:05.678Z")),
            "02.01.2025"
        );
    }

    #[test]
    fn test_german_date_from_date_prefix() {
        assert_eq!(german_date(Some("2025-03-09 14:00:00")), "09.03.2025");
        assert_eq!(german_date(Some("2025-03-09")), "09.03.2025");
    }

    #[test]
    fn test_german_date_falls_back_to_today() {
        let today = Utc::now().date_naive().format("%d.%m.%Y").to_string();
        assert_eq!(german_date(None), today);
        assert_eq!(german_date(Some("kein Datum")), today);
    }

    #[test]
    fn test_german_to_iso_round_trip() {
        assert_eq!(german_to_iso("02.01.2025"), "2025-01-02");
        assert_eq!(german_to_iso("nicht konkretisiert"), "nicht konkretisiert");
    }
}
