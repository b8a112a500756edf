use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::chunker;
use crate::error::{Result, ServiceError};
use crate::extract::{self, DocumentKind};

use super::language::LanguageTable;
use super::resolver::PathResolver;

/// A file as received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedDocument {
    pub kind: DocumentKind,
    pub chunks: usize,
    pub translated_text: String,
}

/// Extract, chunk, translate and reassemble an uploaded document.
pub struct TranslationPipeline {
    languages: LanguageTable,
    resolver: Arc<dyn PathResolver>,
    max_chunk_length: usize,
}

impl TranslationPipeline {
    pub fn new(languages: LanguageTable, resolver: Arc<dyn PathResolver>, max_chunk_length: usize) -> Self {
        Self {
            languages,
            resolver,
            max_chunk_length,
        }
    }

    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    pub async fn translate(
        &self,
        document: UploadedDocument,
        source_name: &str,
        target_name: &str,
    ) -> Result<TranslatedDocument> {
        let file_name = document.file_name.clone();
        // parsing office files is CPU bound
        let extracted = tokio::task::spawn_blocking(move || extract::extract(&document.bytes, &document.file_name))
            .await
            .map_err(|e| ServiceError::ExtractionFailed(format!("extraction task failed: {}", e)))??;

        if extracted.text.trim().is_empty() {
            return Err(ServiceError::EmptyInput);
        }

        let pair = self.languages.pair(source_name, target_name)?;
        let path = self.resolver.resolve(&pair).await?;
        info!(
            "Translating {} ({} chars) {} via {:?}",
            file_name,
            extracted.text.chars().count(),
            pair,
            path.model_ids()
        );

        let mut pieces = Vec::new();
        for chunk in chunker::chunk(&extracted.text, self.max_chunk_length) {
            debug!("Translating chunk {} ({} chars)", chunk.index, chunk.text.chars().count());
            let translated = path.apply(&chunk.text).await.map_err(|e| {
                warn!("Chunk {} of {} failed: {:#}", chunk.index, file_name, e);
                ServiceError::TranslationFailed(format!("{:#}", e))
            })?;
            pieces.push(translated);
        }

        Ok(TranslatedDocument {
            kind: extracted.kind,
            chunks: pieces.len(),
            translated_text: pieces.join("\n"),
        })
    }
}
