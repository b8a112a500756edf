use std::collections::HashMap;
use std::fmt;

use crate::config::LanguageEntry;
use crate::error::{Result, ServiceError};

/// Source and target ISO 639-1 codes. Equal codes are allowed and only
/// resolve if the catalog has an identity model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

/// Maps the human-readable names offered by the upload form to codes.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    codes: HashMap<String, String>,
}

impl LanguageTable {
    pub fn new(entries: &[LanguageEntry]) -> Self {
        let codes = entries
            .iter()
            .map(|e| (e.name.clone(), e.code.clone()))
            .collect();
        Self { codes }
    }

    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.codes.get(name).map(String::as_str)
    }

    /// Resolve both names, failing if either one is unknown.
    pub fn pair(&self, source_name: &str, target_name: &str) -> Result<LanguagePair> {
        match (self.code_for(source_name), self.code_for(target_name)) {
            (Some(source), Some(target)) => Ok(LanguagePair::new(source, target)),
            _ => Err(ServiceError::UnsupportedLanguage {
                source_lang: source_name.to_string(),
                target_lang: target_name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslationConfig;

    fn table() -> LanguageTable {
        LanguageTable::new(&TranslationConfig::default().languages)
    }

    #[test]
    fn test_known_names_map_to_codes() {
        let pair = table().pair("Francais", "Anglais").unwrap();
        assert_eq!(pair, LanguagePair::new("fr", "en"));
        assert_eq!(pair.to_string(), "fr-en");
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = table().pair("Francais", "Klingon").unwrap_err();
        assert_eq!(
            err,
            ServiceError::UnsupportedLanguage {
                source_lang: "Francais".into(),
                target_lang: "Klingon".into(),
            }
        );
        // names are matched exactly, codes are not accepted as names
        assert!(table().pair("fr", "en").is_err());
    }
}
