//! Document text extraction: turns an uploaded resume into one flat string.
//!
//! Supported formats: plain text, PDF, and DOCX. Only the text survives;
//! headings, tables and layout are flattened in document order.

use std::io::{Cursor, Read};

use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use tracing::debug;

use crate::errors::CoreError;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const DOCX_BODY_PART: &str = "word/document.xml";

/// Upload size ceiling enforced by the HTTP layer.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Ceiling on the decompressed DOCX body; a small archive can inflate far past the upload limit.
const MAX_DOCX_XML_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    PlainText,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolves the declared format, by file extension first and content type second.
    pub fn detect(file_name: &str, content_type: Option<&str>) -> Result<Self, CoreError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.trim().to_ascii_lowercase());

        match extension.as_deref() {
            Some("txt") => return Ok(DocumentFormat::PlainText),
            Some("pdf") => return Ok(DocumentFormat::Pdf),
            Some("docx") => return Ok(DocumentFormat::Docx),
            _ => {}
        }

        let mime = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase());
        let format = match mime.as_deref() {
            Some("text/plain") => Some(DocumentFormat::PlainText),
            Some("application/pdf") => Some(DocumentFormat::Pdf),
            Some(DOCX_MIME) => Some(DocumentFormat::Docx),
            _ => None,
        };

        format.ok_or_else(|| {
            CoreError::UnsupportedFormat(
                extension
                    .or(mime)
                    .unwrap_or_else(|| "unknown".to_string()),
            )
        })
    }
}

/// An uploaded document awaiting extraction.
#[derive(Debug, Clone)]
pub struct DocumentHandle {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl DocumentHandle {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn format(&self) -> Result<DocumentFormat, CoreError> {
        DocumentFormat::detect(&self.file_name, self.content_type.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentTextExtractor;

impl DocumentTextExtractor {
    /// Extracts all text from `document`.
    ///
    /// Binary formats are parsed on the blocking pool; a parser panic is
    /// reported as an extraction failure rather than taking the task down.
    pub async fn extract(&self, document: &DocumentHandle) -> Result<String, CoreError> {
        let format = document.format()?;
        debug!(
            "Extracting text from '{}' as {:?} ({} bytes)",
            document.file_name,
            format,
            document.bytes.len()
        );

        match format {
            DocumentFormat::PlainText => plain_text(&document.bytes),
            DocumentFormat::Pdf => run_blocking(document.bytes.clone(), pdf_text).await,
            DocumentFormat::Docx => run_blocking(document.bytes.clone(), docx_text).await,
        }
    }
}

async fn run_blocking(
    bytes: Bytes,
    parse: fn(&[u8]) -> Result<String, CoreError>,
) -> Result<String, CoreError> {
    tokio::task::spawn_blocking(move || parse(&bytes))
        .await
        .map_err(|e| CoreError::Extraction(format!("document parser aborted: {e}")))?
}

fn plain_text(bytes: &[u8]) -> Result<String, CoreError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CoreError::Extraction(format!("text file is not valid UTF-8: {e}")))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

fn pdf_text(bytes: &[u8]) -> Result<String, CoreError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| CoreError::Extraction(format!("unreadable PDF: {e}")))
}

fn docx_extraction_error(e: &dyn std::fmt::Display) -> CoreError {
    CoreError::Extraction(format!("unreadable DOCX: {e}"))
}

/// Inflates the main document part, refusing to read more than `limit` bytes.
fn docx_body(bytes: &[u8], limit: usize) -> Result<String, CoreError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| docx_extraction_error(&e))?;
    let part = archive
        .by_name(DOCX_BODY_PART)
        .map_err(|e| docx_extraction_error(&e))?;

    let mut xml = Vec::new();
    part.take(limit as u64 + 1)
        .read_to_end(&mut xml)
        .map_err(|e| docx_extraction_error(&e))?;
    if xml.len() > limit {
        return Err(CoreError::Extraction(format!(
            "DOCX body exceeds {limit} bytes when decompressed"
        )));
    }
    String::from_utf8(xml).map_err(|e| docx_extraction_error(&e))
}

fn docx_text(bytes: &[u8]) -> Result<String, CoreError> {
    let xml = docx_body(bytes, MAX_DOCX_XML_BYTES)?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_run_text => {
                text.push_str(&t.unescape().map_err(|e| docx_extraction_error(&e))?);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(docx_extraction_error(&e)),
            _ => {}
        }
    }

    Ok(text)
}
