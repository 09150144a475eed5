// ABOUTME: Fixed-shape structured report payload and its total sanitizer
// ABOUTME: Coerces arbitrary model output into a fully-populated report object
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{PLACEHOLDER_MISSING, PLACEHOLDER_UNSPECIFIED, REPORT_TITLE};
use crate::database::ParticipantProfile;

/// Nested goal-definition block of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalDefinition {
    /// Goal the participant brought into the conversation
    pub urspruengliches_ziel: String,
    /// Goal as sharpened during the conversation
    pub konkretisiertes_ziel: String,
    /// New goals that emerged from the conversation
    pub neue_ziele: String,
}

/// Structured coaching report in its fixed schema.
///
/// Field names double as the JSON keys the model is instructed to return.
/// Downstream rendering relies on every field being a populated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayload {
    /// Report title
    pub titel: String,
    /// Participant full name
    pub teilnehmer_name: String,
    /// Participant role/function
    pub rolle_funktion: String,
    /// Participant company
    pub unternehmen: String,
    /// Conversation date (DD.MM.YYYY)
    pub gespraechsdatum: String,
    /// Conversation status
    pub gespraechsstatus: String,
    /// Conversation phase
    pub gespraechsphase: String,
    /// Goal status
    pub zielstatus: String,
    /// Starting situation
    pub ausgangslage: String,
    /// Main topic identified in the conversation
    pub erkanntes_hauptthema: String,
    /// Central insights of the participant
    pub zentrale_erkenntnisse: String,
    /// Goal definition block
    pub zieldefinition: GoalDefinition,
    /// Recommendations given by the avatar
    pub empfehlungen_des_avatars: String,
    /// Development impulse
    pub entwicklungsimpuls: String,
    /// Next sensible step
    pub naechster_sinnvoller_schritt: String,
}

/// Coerce a value to a trimmed non-empty string, or fall back
fn normalize_text(value: Option<&Value>, fallback: &str) -> String {
    match value.and_then(Value::as_str) {
        Some(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                fallback.to_owned()
            } else {
                trimmed.to_owned()
            }
        }
        None => fallback.to_owned(),
    }
}

/// Fallback for a profile-derived field: the profile value if present,
/// otherwise the missing-information placeholder
fn profile_or_missing(value: &str) -> String {
    if value.is_empty() {
        PLACEHOLDER_MISSING.to_owned()
    } else {
        value.to_owned()
    }
}

/// Build the default report for a profile and conversation date.
///
/// Used as the fallback shape when the model output is unusable and as the
/// per-field fallback source during sanitization.
#[must_use]
pub fn default_report(profile: &ParticipantProfile, conversation_date: &str) -> ReportPayload {
    ReportPayload {
        titel: REPORT_TITLE.to_owned(),
        teilnehmer_name: profile_or_missing(&profile.full_name()),
        rolle_funktion: profile_or_missing(&profile.role),
        unternehmen: profile_or_missing(&profile.company),
        gespraechsdatum: conversation_date.to_owned(),
        gespraechsstatus: "beendet".to_owned(),
        gespraechsphase: PLACEHOLDER_UNSPECIFIED.to_owned(),
        zielstatus: PLACEHOLDER_UNSPECIFIED.to_owned(),
        ausgangslage: PLACEHOLDER_UNSPECIFIED.to_owned(),
        erkanntes_hauptthema: PLACEHOLDER_UNSPECIFIED.to_owned(),
        zentrale_erkenntnisse: PLACEHOLDER_UNSPECIFIED.to_owned(),
        zieldefinition: GoalDefinition {
            urspruengliches_ziel: PLACEHOLDER_UNSPECIFIED.to_owned(),
            konkretisiertes_ziel: PLACEHOLDER_UNSPECIFIED.to_owned(),
            neue_ziele: PLACEHOLDER_UNSPECIFIED.to_owned(),
        },
        empfehlungen_des_avatars: PLACEHOLDER_MISSING.to_owned(),
        entwicklungsimpuls: PLACEHOLDER_UNSPECIFIED.to_owned(),
        naechster_sinnvoller_schritt: PLACEHOLDER_UNSPECIFIED.to_owned(),
    }
}

/// Sanitize a parsed model response into the fixed report shape.
///
/// Pure and total: never panics and always returns a fully-populated payload,
/// even for `null`, non-object input, or a payload missing the nested
/// `zieldefinition` block. Every field is coerced to a trimmed string with a
/// profile-derived default or the literal placeholder as fallback.
#[must_use]
pub fn sanitize_report_payload(
    input: &Value,
    profile: &ParticipantProfile,
    conversation_date: &str,
) -> ReportPayload {
    let fallback = default_report(profile, conversation_date);
    let Some(obj) = input.as_object() else {
        return fallback;
    };

    let nested = obj.get("zieldefinition").and_then(Value::as_object);
    let nested_field = |key: &str| nested.and_then(|n| n.get(key));

    ReportPayload {
        titel: normalize_text(obj.get("titel"), &fallback.titel),
        teilnehmer_name: normalize_text(obj.get("teilnehmer_name"), &fallback.teilnehmer_name),
        rolle_funktion: normalize_text(obj.get("rolle_funktion"), &fallback.rolle_funktion),
        unternehmen: normalize_text(obj.get("unternehmen"), &fallback.unternehmen),
        gespraechsdatum: normalize_text(obj.get("gespraechsdatum"), &fallback.gespraechsdatum),
        gespraechsstatus: normalize_text(obj.get("gespraechsstatus"), &fallback.gespraechsstatus),
        gespraechsphase: normalize_text(obj.get("gespraechsphase"), &fallback.gespraechsphase),
        zielstatus: normalize_text(obj.get("zielstatus"), &fallback.zielstatus),
        ausgangslage: normalize_text(obj.get("ausgangslage"), &fallback.ausgangslage),
        erkanntes_hauptthema: normalize_text(
            obj.get("erkanntes_hauptthema"),
            &fallback.erkanntes_hauptthema,
        ),
        zentrale_erkenntnisse: normalize_text(
            obj.get("zentrale_erkenntnisse"),
            &fallback.zentrale_erkenntnisse,
        ),
        zieldefinition: GoalDefinition {
            urspruengliches_ziel: normalize_text(
                nested_field("urspruengliches_ziel"),
                &fallback.zieldefinition.urspruengliches_ziel,
            ),
            konkretisiertes_ziel: normalize_text(
                nested_field("konkretisiertes_ziel"),
                &fallback.zieldefinition.konkretisiertes_ziel,
            ),
            neue_ziele: normalize_text(
                nested_field("neue_ziele"),
                &fallback.zieldefinition.neue_ziele,
            ),
        },
        empfehlungen_des_avatars: normalize_text(
            obj.get("empfehlungen_des_avatars"),
            &fallback.empfehlungen_des_avatars,
        ),
        entwicklungsimpuls: normalize_text(
            obj.get("entwicklungsimpuls"),
            &fallback.entwicklungsimpuls,
        ),
        naechster_sinnvoller_schritt: normalize_text(
            obj.get("naechster_sinnvoller_schritt"),
            &fallback.naechster_sinnvoller_schritt,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile() -> ParticipantProfile {
        ParticipantProfile {
            person_id: "p1".to_owned(),
            first_name: "Max".to_owned(),
            last_name: "Muster".to_owned(),
            role: String::new(),
            company: String::new(),
        }
    }

    #[test]
    fn test_sanitize_null_input_yields_defaults() {
        let payload = sanitize_report_payload(&Value::Null, &profile(), "01.02.2025");
        assert_eq!(payload.titel, REPORT_TITLE);
        assert_eq!(payload.teilnehmer_name, "Max Muster");
        assert_eq!(payload.rolle_funktion, PLACEHOLDER_MISSING);
        assert_eq!(payload.gespraechsdatum, "01.02.2025");
        assert_eq!(payload.gespraechsstatus, "beendet");
        assert_eq!(payload.zieldefinition.neue_ziele, PLACEHOLDER_UNSPECIFIED);
    }

    #[test]
    fn test_sanitize_empty_object_yields_defaults() {
        let payload = sanitize_report_payload(&json!({}), &profile(), "01.02.2025");
        assert_eq!(payload.empfehlungen_des_avatars, PLACEHOLDER_MISSING);
        assert_eq!(payload.entwicklungsimpuls, PLACEHOLDER_UNSPECIFIED);
    }

    #[test]
    fn test_sanitize_missing_nested_object() {
        let payload = sanitize_report_payload(
            &json!({"titel": "X", "zieldefinition": 42}),
            &profile(),
            "01.02.2025",
        );
        assert_eq!(payload.titel, "X");
        assert_eq!(
            payload.zieldefinition.urspruengliches_ziel,
            PLACEHOLDER_UNSPECIFIED
        );
    }

    #[test]
    fn test_sanitize_trims_and_rejects_wrong_types() {
        let payload = sanitize_report_payload(
            &json!({
                "titel": "  Bericht  ",
                "zielstatus": 7,
                "ausgangslage": "   ",
                "zieldefinition": {"neue_ziele": " mehr Fokus "}
            }),
            &profile(),
            "01.02.2025",
        );
        assert_eq!(payload.titel, "Bericht");
        assert_eq!(payload.zielstatus, PLACEHOLDER_UNSPECIFIED);
        assert_eq!(payload.ausgangslage, PLACEHOLDER_UNSPECIFIED);
        assert_eq!(payload.zieldefinition.neue_ziele, "mehr Fokus");
    }

    #[test]
    fn test_sanitize_prefers_profile_over_placeholder() {
        let mut profile = profile();
        profile.role = "Teamleiter".to_owned();
        profile.company = "Neu GmbH".to_owned();
        let payload = sanitize_report_payload(&json!({}), &profile, "01.02.2025");
        assert_eq!(payload.rolle_funktion, "Teamleiter");
        assert_eq!(payload.unternehmen, "Neu GmbH");
    }

    #[test]
    fn test_payload_round_trips_through_serde() {
        let payload = default_report(&profile(), "01.02.2025");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["teilnehmer_name"], "Max Muster");
        let back: ReportPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }
}
