// ABOUTME: Supabase storage client for report PDF uploads
// ABOUTME: POSTs object bytes with bearer auth and overwrite-allowed semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

use async_trait::async_trait;
use reqwest::Client;
use std::env;
use std::time::Duration;
use tracing::{debug, error};

use super::ReportStorage;
use crate::errors::AppError;

/// Environment variable for the Supabase project URL
const SUPABASE_URL_ENV: &str = "SUPABASE_URL";

/// Environment variable for the service role key
const SUPABASE_SERVICE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Connection timeout
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Upload timeout
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Configuration for the Supabase storage client
#[derive(Debug, Clone)]
pub struct SupabaseStorageConfig {
    /// Project base URL (e.g., <https://xyz.supabase.co>)
    pub base_url: String,
    /// Service role key used as bearer token
    pub service_key: String,
}

impl SupabaseStorageConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either variable is not set.
    pub fn from_env() -> Result<Self, AppError> {
        let base_url = env::var(SUPABASE_URL_ENV)
            .map_err(|_| AppError::config(format!("{SUPABASE_URL_ENV} is not configured")))?;
        let service_key = env::var(SUPABASE_SERVICE_KEY_ENV).map_err(|_| {
            AppError::config(format!("{SUPABASE_SERVICE_KEY_ENV} is not configured"))
        })?;
        Ok(Self {
            base_url,
            service_key,
        })
    }
}

/// Supabase storage backend for report PDFs
pub struct SupabaseStorageClient {
    client: Client,
    config: SupabaseStorageConfig,
}

impl SupabaseStorageClient {
    /// Create a new storage client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: SupabaseStorageConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Build the object URL for a bucket and path
    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{bucket}/{path}",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ReportStorage for SupabaseStorageClient {
    async fn upload_pdf(&self, bucket: &str, path: &str, bytes: &[u8]) -> Result<(), AppError> {
        debug!(bucket, path, size = bytes.len(), "Uploading report PDF");

        let response = self
            .client
            .post(self.object_url(bucket, path))
            .header("Authorization", format!("Bearer {}", self.config.service_key))
            .header("Content-Type", "application/pdf")
            .header("x-upsert", "true")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send PDF upload: {e}");
                AppError::storage(format!("Failed to upload report PDF: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::storage(format!(
                "Failed to upload report PDF ({status}): {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_layout() {
        let client = SupabaseStorageClient::new(SupabaseStorageConfig {
            base_url: "https://xyz.supabase.co/".to_owned(),
            service_key: "key".to_owned(),
        })
        .unwrap();
        assert_eq!(
            client.object_url("reports", "default/p1/conversation/c1/t.pdf"),
            "https://xyz.supabase.co/storage/v1/object/reports/default/p1/conversation/c1/t.pdf"
        );
    }
}
