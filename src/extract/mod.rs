pub mod ooxml;
pub mod pdf;

use tracing::{debug, warn};

use crate::error::{Result, ServiceError};
use crate::xlsx;

/// Document types we can pull text out of, keyed by file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    Word,
    Spreadsheet,
    Presentation,
}

const SUFFIXES: [(&str, DocumentKind); 5] = [
    (".txt", DocumentKind::PlainText),
    (".pdf", DocumentKind::Pdf),
    (".docx", DocumentKind::Word),
    (".xlsx", DocumentKind::Spreadsheet),
    (".pptx", DocumentKind::Presentation),
];

impl DocumentKind {
    /// Case-sensitive suffix match on the declared file name.
    pub fn detect(file_name: &str) -> Result<Self> {
        SUFFIXES
            .iter()
            .find(|(suffix, _)| file_name.ends_with(suffix))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ServiceError::UnsupportedFormat(file_name.to_string()))
    }

    pub fn suffix(&self) -> &'static str {
        SUFFIXES
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(suffix, _)| *suffix)
            .unwrap_or_default()
    }
}

/// Raw text of one upload. Lives only for the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub text: String,
    pub kind: DocumentKind,
}

/// Extract the text of `bytes`, dispatching on the suffix of `declared_name`.
///
/// Parser failures surface as `ExtractionFailed` with the cause chain as text.
pub fn extract(bytes: &[u8], declared_name: &str) -> Result<ExtractedDocument> {
    let kind = DocumentKind::detect(declared_name)?;
    debug!("Extracting {} ({} bytes) as {:?}", declared_name, bytes.len(), kind);

    let text = match kind {
        DocumentKind::PlainText => decode_text(bytes),
        DocumentKind::Pdf => pdf::pdf_text(bytes),
        DocumentKind::Word => ooxml::docx_text(bytes),
        DocumentKind::Spreadsheet => xlsx::workbook_text(bytes),
        DocumentKind::Presentation => ooxml::pptx_text(bytes),
    }
    .map_err(|e| {
        warn!("Extraction failed for {}: {:#}", declared_name, e);
        ServiceError::ExtractionFailed(format!("{:#}", e))
    })?;

    Ok(ExtractedDocument { text, kind })
}

/// Strict UTF-8 with an optional BOM.
fn decode_text(bytes: &[u8]) -> anyhow::Result<String> {
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if had_errors {
        anyhow::bail!("'utf-8' codec can't decode the file");
    }
    Ok(text.into_owned())
}
