use axum::http::StatusCode;
use thiserror::Error;

/// Every way a translation or chart request can fail.
///
/// Causes from parsers and collaborators are kept as text, so the error stays
/// `Clone` and can be handed out of the shared resolver cache.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("File type not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Error extracting text: {0}")]
    ExtractionFailed(String),

    #[error("No text extracted from the file.")]
    EmptyInput,

    #[error("Unsupported language: {source_lang} -> {target_lang}")]
    UnsupportedLanguage {
        source_lang: String,
        target_lang: String,
    },

    #[error("No model available for {0} -> {1}")]
    NoModelAvailable(String, String),

    #[error("Translation failed: {0}")]
    TranslationFailed(String),

    #[error("Unknown column(s): {}", quoted(.0))]
    UnknownColumn(Vec<String>),

    #[error("Invalid chart type: {0}")]
    UnsupportedChartKind(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Chart rendering failed: {0}")]
    RenderFailed(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// HTTP status reported for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::UnsupportedFormat(_)
            | ServiceError::EmptyInput
            | ServiceError::UnsupportedLanguage { .. }
            | ServiceError::NoModelAvailable(..)
            | ServiceError::UnknownColumn(_)
            | ServiceError::UnsupportedChartKind(_) => StatusCode::BAD_REQUEST,
            ServiceError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::ExtractionFailed(_) | ServiceError::TranslationFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServiceError::RenderFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{}'", name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_column_names_every_missing_column() {
        let err = ServiceError::UnknownColumn(vec!["month".into(), "revenue".into()]);
        assert_eq!(err.to_string(), "Unknown column(s): 'month', 'revenue'");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::EmptyInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServiceError::NoModelAvailable("fr".into(), "de".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::ExtractionFailed("bad zip".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::TranslationFailed("timeout".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(ServiceError::UnsupportedChartKind("donut".into()).is_client_error());
        assert!(!ServiceError::RenderFailed("down".into()).is_client_error());
    }
}
