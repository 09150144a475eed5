// ABOUTME: Deterministic plain-text rendering of the structured report
// ABOUTME: Fixed section order and label strings, no formatting decisions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

use super::payload::ReportPayload;

/// Render the sanitized report payload into the plain-text document.
///
/// Pure function with a fixed section order; identical input produces
/// byte-identical output. Labels deliberately use the ASCII spellings that
/// also appear in the PDF.
#[must_use]
pub fn build_report_text(payload: &ReportPayload) -> String {
    [
        payload.titel.clone(),
        String::new(),
        format!("Teilnehmer: {}", payload.teilnehmer_name),
        format!("Rolle/Funktion: {}", payload.rolle_funktion),
        format!("Unternehmen: {}", payload.unternehmen),
        format!("Gespraechsdatum: {}", payload.gespraechsdatum),
        String::new(),
        format!("Gespraechsstatus: {}", payload.gespraechsstatus),
        format!("Gespraechsphase: {}", payload.gespraechsphase),
        format!("Zielstatus: {}", payload.zielstatus),
        String::new(),
        "Ausgangslage:".to_owned(),
        payload.ausgangslage.clone(),
        String::new(),
        "Erkanntes Hauptthema:".to_owned(),
        payload.erkanntes_hauptthema.clone(),
        String::new(),
        "Zentrale Erkenntnisse des Teilnehmers:".to_owned(),
        payload.zentrale_erkenntnisse.clone(),
        String::new(),
        "Zieldefinition:".to_owned(),
        format!(
            "- Urspruengliches Ziel: {}",
            payload.zieldefinition.urspruengliches_ziel
        ),
        format!(
            "- Konkretisiertes Ziel: {}",
            payload.zieldefinition.konkretisiertes_ziel
        ),
        format!(
            "- Neue Ziele aus dem Gespraech: {}",
            payload.zieldefinition.neue_ziele
        ),
        String::new(),
        "Empfehlungen des Avatars:".to_owned(),
        payload.empfehlungen_des_avatars.clone(),
        String::new(),
        "Entwicklungsimpuls:".to_owned(),
        payload.entwicklungsimpuls.clone(),
        String::new(),
        "Naechster sinnvoller Schritt:".to_owned(),
        payload.naechster_sinnvoller_schritt.clone(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ParticipantProfile;
    use crate::report::payload::default_report;

    fn payload() -> ReportPayload {
        let profile = ParticipantProfile {
            person_id: "p1".to_owned(),
            first_name: "Max".to_owned(),
            last_name: "Muster".to_owned(),
            role: String::new(),
            company: String::new(),
        };
        default_report(&profile, "01.02.2025")
    }

    #[test]
    fn test_output_is_deterministic() {
        let payload = payload();
        assert_eq!(build_report_text(&payload), build_report_text(&payload));
    }

    #[test]
    fn test_section_order_and_labels() {
        let text = build_report_text(&payload());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Gesprächsauswertung - Avatar-Coaching");
        assert_eq!(lines[2], "Teilnehmer: Max Muster");
        assert_eq!(lines[3], "Rolle/Funktion: nicht vorhanden");
        assert_eq!(lines[5], "Gespraechsdatum: 01.02.2025");
        assert!(text.contains("Zieldefinition:\n- Urspruengliches Ziel: "));
        assert!(text.contains("Naechster sinnvoller Schritt:"));
    }
}
