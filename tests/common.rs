// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database seeding plus scripted LLM and in-memory storage fakes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `avatar_coach_reports`
//!
//! Common setup for the pipeline integration tests: an in-memory database
//! with seeded source rows, a scripted LLM provider, and an in-memory
//! storage backend that records every upload.

use async_trait::async_trait;
use avatar_coach_reports::{
    database::Database,
    errors::AppError,
    llm::{ChatRequest, ChatResponse, LlmProvider},
    storage::ReportStorage,
};
use std::sync::{Arc, Mutex, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Create a fresh in-memory database with all migrations applied
pub async fn create_test_db() -> Database {
    init_test_logging();
    Database::new("sqlite::memory:")
        .await
        .expect("Failed to create test database")
}

/// Seed a person with optional employment and company rows
pub async fn seed_person(
    db: &Database,
    person_id: &str,
    first_name: &str,
    last_name: &str,
    role: Option<&str>,
    company: Option<&str>,
) {
    sqlx::query("INSERT INTO persons (id, first_name, last_name) VALUES ($1, $2, $3)")
        .bind(person_id)
        .bind(first_name)
        .bind(last_name)
        .execute(db.pool())
        .await
        .expect("Failed to seed person");

    if let Some(role) = role {
        let company_id = if let Some(company) = company {
            let company_id = format!("company-{person_id}");
            sqlx::query("INSERT INTO companies (id, name) VALUES ($1, $2)")
                .bind(&company_id)
                .bind(company)
                .execute(db.pool())
                .await
                .expect("Failed to seed company");
            Some(company_id)
        } else {
            None
        };

        sqlx::query(
            "INSERT INTO employments (id, person_id, company_id, function_title, valid_from)
             VALUES ($1, $2, $3, $4, '2024-01-01')",
        )
        .bind(format!("employment-{person_id}"))
        .bind(person_id)
        .bind(company_id)
        .bind(role)
        .execute(db.pool())
        .await
        .expect("Failed to seed employment");
    }
}

/// Seed a conversation with an alternating participant/avatar transcript
pub async fn seed_conversation(
    db: &Database,
    conversation_id: &str,
    person_id: &str,
    messages: &[(&str, &str)],
) {
    sqlx::query(
        "INSERT INTO conversations (id, person_id, started_at, ended_at)
         VALUES ($1, $2, '2025-02-01T09:00:00Z', '2025-02-01T09:45:00Z')",
    )
    .bind(conversation_id)
    .bind(person_id)
    .execute(db.pool())
    .await
    .expect("Failed to seed conversation");

    for (seq, (sender, content)) in messages.iter().enumerate() {
        sqlx::query(
            "INSERT INTO conversation_messages (conversation_id, seq, sender, content)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(conversation_id)
        .bind(i64::try_from(seq).expect("seq fits in i64") + 1)
        .bind(sender)
        .bind(content)
        .execute(db.pool())
        .await
        .expect("Failed to seed message");
    }
}

/// Scripted LLM provider returning canned responses in order.
///
/// Records every request; once the script is exhausted the last response
/// repeats, so single-response tests can run the pipeline repeatedly.
/// `Err` entries carry a message surfaced as a summarization request error.
pub struct ScriptedLlm {
    responses: Mutex<Vec<Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Single canned JSON response for every call
    pub fn always(content: &str) -> Arc<Self> {
        Self::new(vec![Ok(content.to_owned())])
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        let mut responses = self.responses.lock().expect("responses lock");
        let scripted = if responses.len() > 1 {
            responses.remove(0)
        } else {
            responses
                .first()
                .cloned()
                .unwrap_or_else(|| Err("Scripted LLM has no responses".to_owned()))
        };

        match scripted {
            Ok(content) => Ok(ChatResponse {
                content,
                model: "scripted-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            Err(message) => Err(AppError::summarization_request(message)),
        }
    }
}

/// In-memory storage backend recording every uploaded object
#[derive(Default)]
pub struct MemoryStorage {
    uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
    fail_uploads: bool,
}

impl MemoryStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A backend where every upload fails, for failure-path tests
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            uploads: Mutex::new(Vec::new()),
            fail_uploads: true,
        })
    }

    /// Uploaded objects as (bucket, path, bytes) tuples
    pub fn uploads(&self) -> Vec<(String, String, Vec<u8>)> {
        self.uploads.lock().expect("uploads lock").clone()
    }
}

#[async_trait]
impl ReportStorage for MemoryStorage {
    async fn upload_pdf(&self, bucket: &str, path: &str, bytes: &[u8]) -> Result<(), AppError> {
        if self.fail_uploads {
            return Err(AppError::storage("Upload rejected by test backend"));
        }
        self.uploads
            .lock()
            .expect("uploads lock")
            .push((bucket.to_owned(), path.to_owned(), bytes.to_vec()));
        Ok(())
    }
}
