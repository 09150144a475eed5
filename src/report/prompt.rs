// ABOUTME: Prompt construction for the summarization call
// ABOUTME: Renders the transcript and context block into system/user messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

use crate::config::PLACEHOLDER_MISSING;
use crate::database::{MessageRecord, ParticipantProfile};

/// System instruction: fixed schema, German output, placeholder rules,
/// no information beyond transcript and supplied context.
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"Du bist ein präziser deutschsprachiger Gesprächsanalyst.
Du bekommst ein Transcript zwischen Teilnehmer und Avatar-Coach.
Erstelle einen Bericht mit genau diesen Feldern und gib ausschließlich valides JSON zurück:
{
  "titel": string,
  "teilnehmer_name": string,
  "rolle_funktion": string,
  "unternehmen": string,
  "gespraechsdatum": "DD.MM.YYYY",
  "gespraechsstatus": string,
  "gespraechsphase": string,
  "zielstatus": string,
  "ausgangslage": string,
  "erkanntes_hauptthema": string,
  "zentrale_erkenntnisse": string,
  "zieldefinition": {
    "urspruengliches_ziel": string,
    "konkretisiertes_ziel": string,
    "neue_ziele": string
  },
  "empfehlungen_des_avatars": string,
  "entwicklungsimpuls": string,
  "naechster_sinnvoller_schritt": string
}
Regeln:
- Schreibe in professionellem, sachlichem Deutsch.
- Nutze nur Informationen aus dem Transcript und dem mitgelieferten Kontext.
- Falls Information fehlt, nutze "nicht vorhanden" bzw. "nicht konkretisiert".
- Kein Markdown, keine Zusatztexte, nur JSON."#;

/// Render transcript messages as alternating `Speaker: text` lines
#[must_use]
pub fn transcript_to_text(messages: &[MessageRecord]) -> String {
    messages
        .iter()
        .map(|msg| format!("{}: {}", msg.sender.label(), msg.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the user prompt from the context block and the rendered transcript
#[must_use]
pub fn build_user_prompt(
    transcript: &str,
    profile: &ParticipantProfile,
    conversation_date: &str,
) -> String {
    let full_name = profile.full_name();
    let or_missing = |value: &str| {
        if value.is_empty() {
            PLACEHOLDER_MISSING.to_owned()
        } else {
            value.to_owned()
        }
    };

    let context_block = [
        format!("Teilnehmername: {}", or_missing(&full_name)),
        format!("Rolle/Funktion: {}", or_missing(&profile.role)),
        format!("Unternehmen: {}", or_missing(&profile.company)),
        format!("Gesprächsdatum: {conversation_date}"),
    ]
    .join("\n");

    [
        "Erstelle den Bericht auf Basis dieses Kontexts und Transkripts.".to_owned(),
        String::new(),
        "KONTEXT".to_owned(),
        context_block,
        String::new(),
        "TRANSKRIPT".to_owned(),
        transcript.to_owned(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MessageSender;

    #[test]
    fn test_transcript_rendering_uses_speaker_labels() {
        let messages = vec![
            MessageRecord {
                seq: 1,
                sender: MessageSender::Participant,
                content: "Hallo".to_owned(),
            },
            MessageRecord {
                seq: 2,
                sender: MessageSender::Avatar,
                content: "Guten Tag".to_owned(),
            },
        ];
        assert_eq!(
            transcript_to_text(&messages),
            "Teilnehmer: Hallo\nAvatar: Guten Tag"
        );
    }

    #[test]
    fn test_user_prompt_context_block() {
        let profile = ParticipantProfile {
            person_id: "p1".to_owned(),
            first_name: "Max".to_owned(),
            last_name: "Muster".to_owned(),
            role: String::new(),
            company: "Neu GmbH".to_owned(),
        };
        let prompt = build_user_prompt("Teilnehmer: Hallo", &profile, "01.02.2025");
        assert!(prompt.contains("Teilnehmername: Max Muster"));
        assert!(prompt.contains("Rolle/Funktion: nicht vorhanden"));
        assert!(prompt.contains("Unternehmen: Neu GmbH"));
        assert!(prompt.contains("Gesprächsdatum: 01.02.2025"));
        assert!(prompt.contains("TRANSKRIPT\nTeilnehmer: Hallo"));
    }
}
