use std::collections::HashMap;

use crate::config::{ModelEntry, TranslationConfig};
use crate::error::{Result, ServiceError};

use super::language::LanguagePair;
use super::path::TranslationPath;

/// Known direct models, keyed by language pair, plus the pivot language used
/// to bridge pairs that have none.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: HashMap<LanguagePair, String>,
    pivot: String,
}

impl ModelCatalog {
    pub fn new(entries: &[ModelEntry], pivot: impl Into<String>) -> Self {
        let models = entries
            .iter()
            .map(|e| (LanguagePair::new(&e.source, &e.target), e.model_id.clone()))
            .collect();
        Self {
            models,
            pivot: pivot.into(),
        }
    }

    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(&config.models, config.pivot_language.clone())
    }

    pub fn pivot(&self) -> &str {
        &self.pivot
    }

    pub fn direct(&self, source: &str, target: &str) -> Option<&str> {
        self.models
            .get(&LanguagePair::new(source, target))
            .map(String::as_str)
    }

    /// Decide which models translate `pair`, without loading anything.
    ///
    /// A direct model wins. Otherwise, when neither side is the pivot and both
    /// legs through the pivot exist, the pair goes through two hops.
    pub fn plan(&self, pair: &LanguagePair) -> Result<TranslationPath<String>> {
        if let Some(model_id) = self.direct(&pair.source, &pair.target) {
            return Ok(TranslationPath::Direct(model_id.to_string()));
        }

        if pair.source != self.pivot && pair.target != self.pivot {
            let to_pivot = self.direct(&pair.source, &self.pivot);
            let from_pivot = self.direct(&self.pivot, &pair.target);
            if let (Some(to_pivot), Some(from_pivot)) = (to_pivot, from_pivot) {
                return Ok(TranslationPath::Pivot(
                    to_pivot.to_string(),
                    from_pivot.to_string(),
                ));
            }
        }

        Err(ServiceError::NoModelAvailable(
            pair.source.clone(),
            pair.target.clone(),
        ))
    }
}
