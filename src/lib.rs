// ABOUTME: Main library entry point for the avatar coaching report pipeline
// ABOUTME: Turns finished conversations into structured German PDF reports

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

#![deny(unsafe_code)]

//! # Avatar Coach Reports
//!
//! Report generation pipeline for avatar coaching conversations. Given a
//! finished conversation, the pipeline loads the transcript and participant
//! profile, asks an LLM for a structured German summary, sanitizes the result
//! into a fixed schema, renders plain text and a PDF, uploads the PDF to blob
//! storage, and tracks every attempt in idempotent bookkeeping tables.
//!
//! ## Architecture
//!
//! - **database**: `SQLite` access for transcripts, profiles, and bookkeeping
//! - **llm**: Provider trait plus the `OpenAI`-compatible client
//! - **report**: Payload sanitization, prompt building, text/PDF rendering,
//!   and the pipeline orchestrator
//! - **storage**: Blob storage trait plus the Supabase client
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use avatar_coach_reports::config::ReportConfig;
//! use avatar_coach_reports::database::Database;
//! use avatar_coach_reports::errors::AppResult;
//! use avatar_coach_reports::llm::{OpenAiConfig, OpenAiProvider};
//! use avatar_coach_reports::report::ReportGenerator;
//! use avatar_coach_reports::storage::{SupabaseStorageClient, SupabaseStorageConfig};
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ReportConfig::from_env();
//!     let database = Database::new("sqlite:coaching.db?mode=rwc").await?;
//!     let llm = Arc::new(OpenAiProvider::new(OpenAiConfig::from_env(&config.model)?)?);
//!     let storage = Arc::new(SupabaseStorageClient::new(SupabaseStorageConfig::from_env()?)?);
//!
//!     let generator = ReportGenerator::new(&database, llm, storage, config);
//!     let report = generator.generate("conversation-id").await?;
//!     println!("Report {} uploaded to {}", report.report_id, report.storage_path);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod database;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod report;
pub mod storage;
