use crate::error::{ExtractError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

const DOCUMENT_PART: &str = "word/document.xml";

/// Texts of the paragraphs directly under `w:body`, in document order.
///
/// Runs are concatenated within a paragraph; `w:tab` becomes `\t` and
/// `w:br`/`w:cr` become `\n`. Paragraphs inside tables, content controls and
/// text boxes are not body paragraphs and are skipped.
pub fn paragraphs(bytes: &[u8]) -> Result<Vec<String>> {
    let xml = read_document_part(bytes)?;
    let mut reader = Reader::from_str(&xml);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;
    // depth of the open body paragraph, and paragraphs nested inside it
    let mut para_depth: Option<usize> = None;
    let mut nested = 0usize;
    let mut in_text = false;

    loop {
        let collecting = para_depth.is_some() && nested == 0;
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.name().as_ref() {
                    b"w:body" if body_depth.is_none() => body_depth = Some(depth),
                    b"w:p" if para_depth.is_some() => nested += 1,
                    b"w:p" if body_depth.is_some_and(|b| depth == b + 1) => {
                        para_depth = Some(depth);
                        current.clear();
                    }
                    b"w:t" => in_text = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" if para_depth.is_none() && body_depth == Some(depth) => {
                    paragraphs.push(String::new())
                }
                b"w:tab" if collecting => current.push('\t'),
                b"w:br" | b"w:cr" if collecting => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text && collecting => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractError::CorruptDocument(format!("{DOCUMENT_PART}: {e}")))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"w:t" => in_text = false,
                    b"w:p" if para_depth == Some(depth) => {
                        paragraphs.push(std::mem::take(&mut current));
                        para_depth = None;
                    }
                    b"w:p" if para_depth.is_some() => nested = nested.saturating_sub(1),
                    b"w:body" => body_depth = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractError::CorruptDocument(format!(
                    "{DOCUMENT_PART} at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }

    Ok(paragraphs)
}

/// Paragraphs joined with newlines.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    Ok(paragraphs(bytes)?.join("\n"))
}

fn read_document_part(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::CorruptDocument(format!("not a docx container: {e}")))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::CorruptDocument(format!("{DOCUMENT_PART}: {e}")))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}
