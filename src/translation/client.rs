use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::inference_service::{InferenceServiceClient, LoadModelRequest, TranslateRequest, TRANSLATION_TASK};

use super::interface::{TranslationBackend, TranslationModel};

/// Loads translation models on the inference service.
pub struct RemoteTranslationBackend {
    inference_service: Arc<InferenceServiceClient>,
}

impl RemoteTranslationBackend {
    pub fn new(inference_service: Arc<InferenceServiceClient>) -> Self {
        Self { inference_service }
    }
}

#[async_trait]
impl TranslationBackend for RemoteTranslationBackend {
    async fn load_model(&self, model_id: &str) -> Result<Arc<dyn TranslationModel>, anyhow::Error> {
        let response = self
            .inference_service
            .load_model(LoadModelRequest {
                model_id: model_id.to_string(),
                task: TRANSLATION_TASK.to_string(),
            })
            .await?;

        if response.success {
            debug!("Model loaded: {}", model_id);
            Ok(Arc::new(RemoteTranslationModel {
                inference_service: self.inference_service.clone(),
                model_id: model_id.to_string(),
            }))
        } else {
            let error_msg = response.error.unwrap_or_else(|| "Unknown error".to_string());
            error!("Loading {} failed: {}", model_id, error_msg);
            Err(anyhow::anyhow!("model load failed: {}", error_msg))
        }
    }
}

/// A model the inference service has already loaded.
pub struct RemoteTranslationModel {
    inference_service: Arc<InferenceServiceClient>,
    model_id: String,
}

#[async_trait]
impl TranslationModel for RemoteTranslationModel {
    async fn translate(&self, text: &str) -> Result<String, anyhow::Error> {
        let response = self
            .inference_service
            .translate(TranslateRequest {
                model_id: self.model_id.clone(),
                text: text.to_string(),
            })
            .await?;

        if response.success {
            Ok(response.translation_text)
        } else {
            let error_msg = response.error.unwrap_or_else(|| "Unknown error".to_string());
            error!("Translation with {} failed: {}", self.model_id, error_msg);
            Err(anyhow::anyhow!("translation failed: {}", error_msg))
        }
    }
}
