// ABOUTME: Blob storage abstraction for uploading generated report PDFs
// ABOUTME: Trait seam with a Supabase storage client as the production backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

//! # Report Storage
//!
//! The pipeline uploads one PDF binary per successful attempt. The
//! [`ReportStorage`] trait keeps the pipeline independent of the backend;
//! production uses [`SupabaseStorageClient`], tests use an in-memory fake.

mod supabase;

pub use supabase::{SupabaseStorageClient, SupabaseStorageConfig};

use async_trait::async_trait;

use crate::errors::AppError;

/// Blob storage backend for report PDFs
#[async_trait]
pub trait ReportStorage: Send + Sync {
    /// Upload a PDF to the given bucket and path, overwriting any existing
    /// object at that location.
    async fn upload_pdf(&self, bucket: &str, path: &str, bytes: &[u8]) -> Result<(), AppError>;
}

/// Build the storage path for a report PDF, namespaced by tenant, person,
/// entity, and conversation, with a sanitized ISO timestamp as the file stem.
#[must_use]
pub fn pdf_storage_path(
    tenant_id: &str,
    person_id: &str,
    conversation_id: &str,
    timestamp_iso: &str,
) -> String {
    let stem: String = timestamp_iso
        .chars()
        .map(|c| if c == ':' || c == '.' { '-' } else { c })
        .collect();
    format!("{tenant_id}/{person_id}/conversation/{conversation_id}/{stem}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_storage_path_sanitizes_timestamp() {
        let path = pdf_storage_path("default", "p1", "c1", "2025-01-02T03:04:05.678Z");
        assert_eq!(path, "default/p1/conversation/c1/2025-01-02T03-04-05-678Z.pdf");
    }
}
