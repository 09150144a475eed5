// ABOUTME: PDF rendering of the plain-text report with fixed page geometry
// ABOUTME: Word-boundary wrapping, top-down pagination, bold title line
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Avatar Coach Reports

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::errors::{AppError, AppResult};

// ============================================================================
// Page Geometry
// ============================================================================

/// Page width in points (A4)
const PAGE_WIDTH: f32 = 595.0;

/// Page height in points (A4)
const PAGE_HEIGHT: f32 = 842.0;

/// Page margin in points
const MARGIN: f32 = 48.0;

/// Body line height in points
const LINE_HEIGHT: f32 = 16.0;

/// Body font size
const FONT_SIZE: f32 = 11.0;

/// Title font size
const TITLE_SIZE: f32 = 16.0;

/// Extra advance after the title line
const TITLE_EXTRA_ADVANCE: f32 = 6.0;

/// Wrap width for body lines, in characters
const WRAP_CHARS_BODY: usize = 95;

/// Wrap width for the title line, in characters
const WRAP_CHARS_TITLE: usize = 80;

// ============================================================================
// Line Wrapping
// ============================================================================

/// Wrap a logical line at a fixed character count on word boundaries.
///
/// Words are never broken mid-word; a single word longer than `max_chars`
/// occupies its own output line. Whitespace-only input yields one empty line.
#[must_use]
pub fn wrap_line(text: &str, max_chars: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in words {
        let next = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{current} {word}")
        };
        if next.chars().count() > max_chars && !current.is_empty() {
            lines.push(current);
            current = word.to_owned();
        } else {
            current = next;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ============================================================================
// PDF Rendering
// ============================================================================

/// Encode text for the WinAnsi-encoded standard fonts.
///
/// Characters outside the Latin-1 range have no glyph in the base-14 fonts
/// and are replaced with '?'.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if code <= 0xFF {
                u8::try_from(code).unwrap_or(b'?')
            } else {
                b'?'
            }
        })
        .collect()
}

/// Render the report text into a PDF document.
///
/// Deterministic given identical input: fixed A4 geometry, top-down cursor
/// starting below the top margin, a new page whenever the cursor would pass
/// the bottom margin, the first non-empty line in bold title weight, and
/// blank input lines advancing the cursor by half a line height without
/// drawing.
///
/// # Errors
///
/// Returns an error if the PDF document cannot be serialized.
pub fn build_report_pdf(report_text: &str) -> AppResult<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let font_bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_regular_id,
            "F2" => font_bold_id,
        },
    });

    let mut finished_pages: Vec<Vec<Operation>> = Vec::new();
    let mut current_page: Vec<Operation> = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    for (index, line) in report_text.lines().enumerate() {
        if line.trim().is_empty() {
            y -= LINE_HEIGHT / 2.0;
            continue;
        }
        let is_title_line = index == 0;
        let max_chars = if is_title_line {
            WRAP_CHARS_TITLE
        } else {
            WRAP_CHARS_BODY
        };
        for (wrapped_index, segment) in wrap_line(line, max_chars).into_iter().enumerate() {
            if y <= MARGIN {
                finished_pages.push(std::mem::take(&mut current_page));
                y = PAGE_HEIGHT - MARGIN;
            }
            let is_title = is_title_line && wrapped_index == 0;
            let (font, size, advance) = if is_title {
                ("F2", TITLE_SIZE, LINE_HEIGHT + TITLE_EXTRA_ADVANCE)
            } else {
                ("F1", FONT_SIZE, LINE_HEIGHT)
            };
            current_page.push(Operation::new("BT", vec![]));
            current_page.push(Operation::new(
                "Tf",
                vec![Object::Name(font.as_bytes().to_vec()), Object::Real(size)],
            ));
            current_page.push(Operation::new(
                "Td",
                vec![Object::Real(MARGIN), Object::Real(y)],
            ));
            current_page.push(Operation::new(
                "Tj",
                vec![Object::String(
                    encode_win_ansi(&segment),
                    StringFormat::Literal,
                )],
            ));
            current_page.push(Operation::new("ET", vec![]));
            y -= advance;
        }
    }
    finished_pages.push(current_page);

    let mut kids: Vec<Object> = Vec::new();
    for operations in finished_pages {
        let content = Content { operations };
        let content_bytes = content
            .encode()
            .map_err(|e| AppError::internal(format!("Failed to encode PDF content: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = i64::try_from(kids.len())
        .map_err(|_| AppError::internal("PDF page count overflow"))?;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| AppError::internal(format!("Failed to serialize PDF: {e}")))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_word_boundaries() {
        let wrapped = wrap_line("eins zwei drei vier fuenf", 9);
        assert_eq!(wrapped, vec!["eins zwei", "drei vier", "fuenf"]);
    }

    #[test]
    fn test_wrap_keeps_overlong_word_whole() {
        let wrapped = wrap_line("kurz Donaudampfschifffahrtsgesellschaft kurz", 10);
        assert_eq!(
            wrapped,
            vec!["kurz", "Donaudampfschifffahrtsgesellschaft", "kurz"]
        );
    }

    #[test]
    fn test_wrap_blank_input_yields_single_empty_line() {
        assert_eq!(wrap_line("   ", 95), vec![String::new()]);
    }

    #[test]
    fn test_wrap_round_trip_preserves_word_order() {
        let line = "Der Teilnehmer moechte seine Fuehrungsrolle im kommenden Quartal deutlich aktiver gestalten und dafuer konkrete Routinen etablieren";
        let wrapped = wrap_line(line, 40);
        let rejoined = wrapped.join(" ");
        let original: Vec<&str> = line.split_whitespace().collect();
        let round_tripped: Vec<&str> = rejoined.split_whitespace().collect();
        assert_eq!(original, round_tripped);
        for segment in &wrapped {
            assert!(segment.chars().count() <= 40 || !segment.contains(' '));
        }
    }

    #[test]
    fn test_pdf_output_is_deterministic() {
        let text = "Titel\n\nEine Zeile\nNoch eine Zeile";
        let first = build_report_pdf(text).unwrap();
        let second = build_report_pdf(text).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_long_report_paginates() {
        // 48 usable lines per page at 16pt between the margins; 200 lines
        // must spill onto multiple pages
        let body = (0..200)
            .map(|i| format!("Zeile {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let text = format!("Titel\n{body}");
        let bytes = build_report_pdf(&text).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.page_iter().count() >= 4);
    }

    #[test]
    fn test_umlauts_are_encoded_as_latin1() {
        let encoded = encode_win_ansi("Gesprächsauswertung");
        assert_eq!(encoded.len(), "Gesprächsauswertung".chars().count());
        assert_eq!(encoded[5], 0xE4);
    }
}
