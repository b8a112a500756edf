use std::sync::Arc;

use crate::charts::{
    ChartDispatcher, ChartRenderer, ChartService, RemoteChartRenderer, RemoteTextGenerator, TextGenerator,
};
use crate::config::Config;
use crate::inference_service::InferenceServiceClient;
use crate::translation::{
    LanguageTable, ModelCatalog, ModelResolver, RemoteTranslationBackend, TranslationBackend, TranslationPipeline,
};

/// Shared handles for every request. The resolver cache inside `translator`
/// lives as long as the state does.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub inference_service: Arc<InferenceServiceClient>,
    pub translator: Arc<TranslationPipeline>,
    pub charts: Arc<ChartService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let inference_service = Arc::new(InferenceServiceClient::new(config.inference_config.base_url.clone()));

        let backend = Arc::new(RemoteTranslationBackend::new(inference_service.clone()));
        let renderer = Arc::new(RemoteChartRenderer::new(
            inference_service.clone(),
            config.chart_config.width,
            config.chart_config.height,
        ));
        let generator = Arc::new(RemoteTextGenerator::new(
            inference_service.clone(),
            config.inference_config.generation_model.clone(),
            config.inference_config.generation_max_length,
        ));

        Self::with_collaborators(config, inference_service, backend, renderer, generator)
    }

    /// Wire the services around explicit collaborators.
    pub fn with_collaborators(
        config: Config,
        inference_service: Arc<InferenceServiceClient>,
        backend: Arc<dyn TranslationBackend>,
        renderer: Arc<dyn ChartRenderer>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let translation = &config.translation_config;
        let resolver = ModelResolver::new(
            ModelCatalog::from_config(translation),
            backend,
            translation.model_cache_capacity,
        );
        let translator = TranslationPipeline::new(
            LanguageTable::new(&translation.languages),
            Arc::new(resolver),
            translation.max_chunk_length,
        );

        let dispatcher = ChartDispatcher::new(renderer, config.chart_config.histogram_bins);
        let charts = ChartService::new(dispatcher, generator);

        Self {
            config: Arc::new(config),
            inference_service,
            translator: Arc::new(translator),
            charts: Arc::new(charts),
        }
    }
}
