// ABOUTME: Participant profile resolution from person, employment, and company tables
// ABOUTME: Degrades to empty strings on any miss or store error, never fails
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::warn;

/// Derived participant profile, recomputed on each report generation.
/// Unknown fields are empty strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantProfile {
    /// Person identifier
    pub person_id: String,
    /// First name, or empty if unknown
    pub first_name: String,
    /// Last name, or empty if unknown
    pub last_name: String,
    /// Role/function title from the latest employment, or empty
    pub role: String,
    /// Company name from the latest employment, or empty
    pub company: String,
}

impl ParticipantProfile {
    /// Profile with all lookup fields empty
    #[must_use]
    pub fn empty(person_id: &str) -> Self {
        Self {
            person_id: person_id.to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            role: String::new(),
            company: String::new(),
        }
    }

    /// Full name assembled from the non-empty name parts
    #[must_use]
    pub fn full_name(&self) -> String {
        [self.first_name.as_str(), self.last_name.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_owned()
    }
}

/// Resolves participant profiles with table-by-table fallback
pub struct ProfileManager {
    pool: SqlitePool,
}

impl ProfileManager {
    /// Create a new profile manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve a participant's name, role, and company.
    ///
    /// Each lookup that errors or returns nothing degrades to an empty string
    /// for that field. The result is always a complete profile object; this
    /// method never fails.
    pub async fn resolve_participant(&self, person_id: &str) -> ParticipantProfile {
        let mut profile = ParticipantProfile::empty(person_id);

        match sqlx::query(
            r"
            SELECT first_name, last_name
            FROM persons
            WHERE id = $1
            ",
        )
        .bind(person_id)
        .fetch_optional(&self.pool)
        .await
        {
            Ok(Some(row)) => {
                profile.first_name = normalize(row.get::<Option<String>, _>("first_name"));
                profile.last_name = normalize(row.get::<Option<String>, _>("last_name"));
            }
            Ok(None) => {}
            Err(e) => warn!(person_id, "Person lookup failed, continuing without name: {e}"),
        }

        // Latest employment wins: ordered by validity start descending
        let employment = sqlx::query(
            r"
            SELECT function_title, company_id
            FROM employments
            WHERE person_id = $1
            ORDER BY valid_from DESC
            LIMIT 1
            ",
        )
        .bind(person_id)
        .fetch_optional(&self.pool)
        .await;

        let company_id = match employment {
            Ok(Some(row)) => {
                profile.role = normalize(row.get::<Option<String>, _>("function_title"));
                row.get::<Option<String>, _>("company_id")
            }
            Ok(None) => None,
            Err(e) => {
                warn!(person_id, "Employment lookup failed, continuing without role: {e}");
                None
            }
        };

        if let Some(company_id) = company_id {
            match sqlx::query(
                r"
                SELECT name
                FROM companies
                WHERE id = $1
                ",
            )
            .bind(&company_id)
            .fetch_optional(&self.pool)
            .await
            {
                Ok(Some(row)) => {
                    profile.company = normalize(row.get::<Option<String>, _>("name"));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(person_id, company_id, "Company lookup failed, continuing without company: {e}");
                }
            }
        }

        profile
    }
}

fn normalize(value: Option<String>) -> String {
    value.map(|v| v.trim().to_owned()).unwrap_or_default()
}
