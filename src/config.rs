use std::path::Path;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::chunker::DEFAULT_MAX_CHUNK_LENGTH;

/// Environment variables prefixed with this override file values,
/// e.g. `LINGUA__SYSTEM_CONFIG__PORT=9000`.
pub const ENV_PREFIX: &str = "LINGUA";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub system_config: SystemConfig,
    pub inference_config: InferenceConfig,
    pub translation_config: TranslationConfig,
    pub chart_config: ChartConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub max_upload_bytes: usize,
}

/// Where the model server lives and which generation model backs the
/// chart description hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub base_url: String,
    pub generation_model: String,
    pub generation_max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub max_chunk_length: usize,
    pub model_cache_capacity: u64,
    pub pivot_language: String,
    pub languages: Vec<LanguageEntry>,
    pub models: Vec<ModelEntry>,
}

/// Human-readable language name as submitted by the upload form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub source: String,
    pub target: String,
    pub model_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub histogram_bins: usize,
    pub width: u32,
    pub height: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            static_dir: "static".to_string(),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            generation_model: "tiiuae/falcon-7b-instruct".to_string(),
            generation_max_length: 50,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let languages = [("Anglais", "en"), ("Francais", "fr"), ("Arabe", "ar"), ("Espagnol", "es")]
            .into_iter()
            .map(|(name, code)| LanguageEntry {
                name: name.to_string(),
                code: code.to_string(),
            })
            .collect();

        let models = [("fr", "en"), ("en", "fr"), ("ar", "en"), ("en", "ar"), ("es", "en"), ("en", "es")]
            .into_iter()
            .map(|(source, target)| ModelEntry {
                source: source.to_string(),
                target: target.to_string(),
                model_id: format!("Helsinki-NLP/opus-mt-{}-{}", source, target),
            })
            .collect();

        Self {
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            model_cache_capacity: 10,
            pivot_language: "en".to_string(),
            languages,
            models,
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 10,
            width: 2000,
            height: 1200,
        }
    }
}

impl Config {
    /// Load configuration from an optional YAML/JSON/TOML file, then apply
    /// `LINGUA__`-prefixed environment overrides. Missing values fall back to
    /// the defaults above.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let translation = &self.translation_config;
        if translation.max_chunk_length == 0 {
            bail!("translation_config.max_chunk_length must be greater than zero");
        }
        if translation.model_cache_capacity == 0 {
            bail!("translation_config.model_cache_capacity must be greater than zero");
        }
        if translation.languages.is_empty() {
            bail!("translation_config.languages must not be empty");
        }
        if self.chart_config.histogram_bins == 0 {
            bail!("chart_config.histogram_bins must be greater than zero");
        }
        Ok(())
    }
}
