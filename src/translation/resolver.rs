use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use tracing::{debug, info};

use crate::error::{Result, ServiceError};

use super::catalog::ModelCatalog;
use super::interface::TranslationBackend;
use super::language::LanguagePair;
use super::path::{ModelHandle, TranslationPath};

pub type ResolvedPath = Arc<TranslationPath<ModelHandle>>;

/// Turns a language pair into a loaded translation path.
#[async_trait]
pub trait PathResolver: Send + Sync {
    async fn resolve(&self, pair: &LanguagePair) -> Result<ResolvedPath>;
}

/// Resolves language pairs against the model catalog and keeps the loaded
/// paths in a bounded LRU cache.
///
/// Concurrent resolutions of the same pair share a single load: the first
/// caller loads, the others wait for its result. Failed loads are not cached.
pub struct ModelResolver {
    catalog: ModelCatalog,
    backend: Arc<dyn TranslationBackend>,
    cache: Cache<LanguagePair, ResolvedPath>,
}

impl ModelResolver {
    pub fn new(catalog: ModelCatalog, backend: Arc<dyn TranslationBackend>, capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            catalog,
            backend,
            cache,
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Number of cached pairs once pending evictions have been applied.
    pub async fn cached_pairs(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    async fn load(&self, pair: &LanguagePair, plan: TranslationPath<String>) -> Result<ResolvedPath> {
        info!("Loading translation path for {}: {:?}", pair, plan);

        let path = match plan {
            TranslationPath::Direct(model_id) => TranslationPath::Direct(self.load_model(&model_id).await?),
            TranslationPath::Pivot(to_pivot, from_pivot) => {
                let to_pivot = self.load_model(&to_pivot).await?;
                let from_pivot = self.load_model(&from_pivot).await?;
                TranslationPath::Pivot(to_pivot, from_pivot)
            }
        };

        Ok(Arc::new(path))
    }

    async fn load_model(&self, model_id: &str) -> Result<ModelHandle> {
        let model = self.backend.load_model(model_id).await.map_err(|e| {
            ServiceError::TranslationFailed(format!("failed to load model {}: {:#}", model_id, e))
        })?;
        Ok(ModelHandle::new(model_id, model))
    }
}

#[async_trait]
impl PathResolver for ModelResolver {
    async fn resolve(&self, pair: &LanguagePair) -> Result<ResolvedPath> {
        // planning is pure, so unresolvable pairs never touch the cache
        let plan = self.catalog.plan(pair)?;
        debug!("Resolving {} via {:?}", pair, plan);

        self.cache
            .try_get_with(pair.clone(), self.load(pair, plan))
            .await
            .map_err(|e: Arc<ServiceError>| e.as_ref().clone())
    }
}
