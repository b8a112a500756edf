use std::sync::Arc;

use async_trait::async_trait;

/// A loaded translation model for one direction (e.g. fr -> en).
#[async_trait]
pub trait TranslationModel: Send + Sync {
    /// Translate one bounded segment of text.
    async fn translate(&self, text: &str) -> Result<String, anyhow::Error>;
}

/// Loads translation models by identifier - actual inference lives in the
/// model server.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Load (or warm up) `model_id` and return a handle to it.
    ///
    /// # Arguments
    /// * `model_id` - Catalog identifier, e.g. `Helsinki-NLP/opus-mt-fr-en`
    async fn load_model(&self, model_id: &str) -> Result<Arc<dyn TranslationModel>, anyhow::Error>;
}
