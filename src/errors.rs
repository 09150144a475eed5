// ABOUTME: Unified error handling for the report generation pipeline
// ABOUTME: Defines standard error codes and the AppError type used across all modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

//! # Unified Error Handling System
//!
//! Centralized error types for the report engine. Every pipeline failure is
//! expressed as an [`AppError`] carrying an [`ErrorCode`]; the pipeline catches
//! errors exactly once at its outer boundary, records them on the current
//! summary run, and re-throws them unchanged to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Source data (1000-1999)
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 1000,
    #[serde(rename = "EMPTY_TRANSCRIPT")]
    EmptyTranscript = 1001,

    // Summarization (2000-2999)
    #[serde(rename = "SUMMARIZATION_REQUEST_FAILED")]
    SummarizationRequest = 2000,
    #[serde(rename = "SUMMARIZATION_PARSE_FAILED")]
    SummarizationParse = 2001,

    // Persistence (3000-3999)
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 3000,
    #[serde(rename = "STORAGE_ERROR")]
    StorageError = 3001,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ResourceNotFound => "The requested resource was not found",
            Self::EmptyTranscript => "The conversation has no transcript messages",
            Self::SummarizationRequest => "The summarization request failed",
            Self::SummarizationParse => "The summarization response could not be parsed",
            Self::DatabaseError => "Database operation failed",
            Self::StorageError => "Storage operation failed",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal error occurred",
        }
    }

    /// Whether a failed attempt with this code may be retried by invoking
    /// generation again. Every code is terminal for the current attempt; a
    /// retry always produces a fresh run rather than resuming the failed one.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::ResourceNotFound | Self::EmptyTranscript | Self::ConfigError => false,
            Self::SummarizationRequest
            | Self::SummarizationParse
            | Self::DatabaseError
            | Self::StorageError
            | Self::InternalError => true,
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Convenience functions for creating common errors
impl AppError {
    /// Resource not found (conversation, person, template)
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Conversation has no transcript messages
    pub fn empty_transcript(conversation_id: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::EmptyTranscript,
            format!(
                "Cannot generate report without transcript messages for conversation {}",
                conversation_id.into()
            ),
        )
    }

    /// Summarization request failed (network, HTTP, or upstream error)
    pub fn summarization_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SummarizationRequest, message)
    }

    /// Summarization response was empty or not valid JSON
    pub fn summarization_parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SummarizationParse, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Blob storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Conversion from anyhow::Error for setup and test boundaries
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_code_description() {
        let error = AppError::empty_transcript("conv-1");
        let rendered = error.to_string();
        assert!(rendered.contains("no transcript messages"));
        assert!(rendered.contains("conv-1"));
    }

    #[test]
    fn test_terminal_codes_are_not_retryable() {
        assert!(!ErrorCode::ResourceNotFound.is_retryable());
        assert!(!ErrorCode::EmptyTranscript.is_retryable());
        assert!(ErrorCode::SummarizationParse.is_retryable());
        assert!(ErrorCode::DatabaseError.is_retryable());
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::SummarizationParse).unwrap();
        assert_eq!(json, "\"SUMMARIZATION_PARSE_FAILED\"");
    }
}
