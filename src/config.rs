// ABOUTME: Report pipeline configuration passed explicitly into the generator
// ABOUTME: Replaces module-scoped constants with an overridable config object
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

//! Report generation configuration.
//!
//! All knobs that used to live as module-scoped constants (template key and
//! version, report language, model name, prompt version, storage bucket) are
//! carried by [`ReportConfig`] and passed into the pipeline entry point.

use std::env;

/// Report title used when the model does not supply one
pub const REPORT_TITLE: &str = "Gesprächsauswertung - Avatar-Coaching";

/// Placeholder for fields with no evidence in the transcript
pub const PLACEHOLDER_MISSING: &str = "nicht vorhanden";

/// Placeholder for fields the conversation never made concrete
pub const PLACEHOLDER_UNSPECIFIED: &str = "nicht konkretisiert";

/// Summary type recorded on runs and summaries
pub const SUMMARY_TYPE: &str = "detailed";

/// Tenant identifier used until multi-tenant routing exists upstream
pub const DEFAULT_TENANT: &str = "default";

/// Configuration for one report generation pipeline instance
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Report template key (stable across versions)
    pub template_key: String,
    /// Report template version
    pub template_version: String,
    /// Report language (BCP 47 primary subtag)
    pub language: String,
    /// LLM model used for summarization
    pub model: String,
    /// Prompt version recorded on runs and summaries
    pub prompt_version: String,
    /// Blob storage bucket for generated PDFs
    pub bucket: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            template_key: "avatar_coaching_standard".into(),
            template_version: "v1".into(),
            language: "de".into(),
            model: "gpt-4o-mini".into(),
            prompt_version: "v1".into(),
            bucket: "reports".into(),
        }
    }
}

impl ReportConfig {
    /// Create configuration from environment variables, falling back to the
    /// production defaults for anything unset.
    ///
    /// Reads `REPORT_TEMPLATE_KEY`, `REPORT_TEMPLATE_VERSION`,
    /// `REPORT_LANGUAGE`, `SUMMARY_MODEL`, `SUMMARY_PROMPT_VERSION`, and
    /// `REPORTS_BUCKET`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            template_key: env::var("REPORT_TEMPLATE_KEY").unwrap_or(defaults.template_key),
            template_version: env::var("REPORT_TEMPLATE_VERSION")
                .unwrap_or(defaults.template_version),
            language: env::var("REPORT_LANGUAGE").unwrap_or(defaults.language),
            model: env::var("SUMMARY_MODEL").unwrap_or(defaults.model),
            prompt_version: env::var("SUMMARY_PROMPT_VERSION").unwrap_or(defaults.prompt_version),
            bucket: env::var("REPORTS_BUCKET").unwrap_or(defaults.bucket),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_production_values() {
        let config = ReportConfig::default();
        assert_eq!(config.template_key, "avatar_coaching_standard");
        assert_eq!(config.template_version, "v1");
        assert_eq!(config.language, "de");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.bucket, "reports");
    }
}
