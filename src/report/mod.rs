// ABOUTME: Conversation report generation: payload, prompt, renderers, pipeline
// ABOUTME: Public surface is the generator plus the pure rendering functions

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

//! # Conversation Reports
//!
//! Turns a finished coaching conversation into a structured German report:
//! the model output is sanitized into the fixed [`ReportPayload`] shape,
//! rendered to deterministic plain text and a PDF, uploaded, and tracked in
//! the bookkeeping tables. [`ReportGenerator::generate`] is the entry point.

pub mod payload;
pub mod pdf;
pub mod pipeline;
pub mod prompt;
pub mod text;

pub use payload::{default_report, sanitize_report_payload, GoalDefinition, ReportPayload};
pub use pdf::{build_report_pdf, wrap_line};
pub use pipeline::{GeneratedReport, ReportGenerator};
pub use prompt::{build_user_prompt, transcript_to_text, SUMMARY_SYSTEM_PROMPT};
pub use text::build_report_text;
