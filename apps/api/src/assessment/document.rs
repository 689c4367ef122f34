//! Document intake: turns an uploaded file into plain text for extraction.

use std::io::{Cursor, Read, Write};

use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::errors::AppError;

/// Upload formats the service can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

impl DocumentKind {
    /// Picks a reader from the file extension, falling back to the declared MIME type.
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Option<Self> {
        let extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => return Some(DocumentKind::Pdf),
            Some("docx") => return Some(DocumentKind::Docx),
            Some("txt" | "text" | "md") => return Some(DocumentKind::PlainText),
            _ => {}
        }

        let mime = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())?;
        match mime.as_str() {
            "application/pdf" => Some(DocumentKind::Pdf),
            DOCX_MIME => Some(DocumentKind::Docx),
            m if m.starts_with("text/") => Some(DocumentKind::PlainText),
            _ => None,
        }
    }
}

/// Extracts the text of an uploaded document.
///
/// PDFs are written to a request-scoped temporary file that is removed when the
/// handle drops, on success and failure alike. DOCX archives are read in memory.
pub async fn read_document(kind: DocumentKind, data: Bytes) -> Result<String, AppError> {
    let raw = match kind {
        DocumentKind::PlainText => String::from_utf8(data.to_vec())
            .map_err(|_| AppError::DocumentRead("File is not valid UTF-8 text".to_string()))?,
        DocumentKind::Pdf => tokio::task::spawn_blocking(move || extract_pdf_text(&data))
            .await
            .map_err(|e| AppError::DocumentRead(format!("PDF extraction aborted: {e}")))??,
        DocumentKind::Docx => tokio::task::spawn_blocking(move || extract_docx_text(&data))
            .await
            .map_err(|e| AppError::DocumentRead(format!("DOCX extraction aborted: {e}")))??,
    };

    let text = normalize_lines(&raw);
    debug!(chars = text.len(), ?kind, "Document text extracted");
    Ok(text)
}

fn extract_pdf_text(data: &[u8]) -> Result<String, AppError> {
    let mut temp = tempfile::Builder::new()
        .prefix("assessment-upload-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| AppError::Internal(e.into()))?;
    temp.write_all(data)
        .and_then(|_| temp.flush())
        .map_err(|e| AppError::Internal(e.into()))?;

    pdf_extract::extract_text(temp.path())
        .map_err(|e| AppError::DocumentRead(format!("Could not read PDF: {e}")))
}

/// Reads the paragraphs of `word/document.xml`, one line per paragraph.
fn extract_docx_text(data: &[u8]) -> Result<String, AppError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(docx_error)?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(docx_error)?
        .read_to_string(&mut xml)
        .map_err(docx_error)?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(docx_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"r" => in_run = false,
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            // Tab stops in paragraph properties also use <w:tab/>, only runs count
            Event::Empty(e) if in_run => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape().map_err(docx_error)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    paragraphs.push(current);

    Ok(paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn docx_error(e: impl std::fmt::Display) -> AppError {
    AppError::DocumentRead(format!("Could not read DOCX: {e}"))
}

/// Trims every line and drops blank ones, joining the rest with `\n`.
fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds a minimal DOCX with one paragraph per entry. Entries are inserted as raw XML text.
#[cfg(test)]
pub(crate) fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!(r#"<w:p><w:r><w:t xml:space="preserve">{p}</w:t></w:r></w:p>"#))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    zip_with_document(&xml)
}

#[cfg(test)]
fn zip_with_document(xml: &str) -> Vec<u8> {
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}
