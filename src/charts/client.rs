use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::inference_service::{GenerateRequest, InferenceServiceClient, RenderRequest};

use super::dispatcher::ChartSpec;
use super::interface::{ChartRenderer, TextGenerator};

/// Renders charts on the inference service at a fixed figure size.
pub struct RemoteChartRenderer {
    inference_service: Arc<InferenceServiceClient>,
    width: u32,
    height: u32,
}

impl RemoteChartRenderer {
    pub fn new(inference_service: Arc<InferenceServiceClient>, width: u32, height: u32) -> Self {
        Self {
            inference_service,
            width,
            height,
        }
    }
}

#[async_trait]
impl ChartRenderer for RemoteChartRenderer {
    async fn render(&self, spec: &ChartSpec) -> Result<Vec<u8>, anyhow::Error> {
        let png = self
            .inference_service
            .render_chart(RenderRequest {
                spec,
                width: self.width,
                height: self.height,
            })
            .await?;
        debug!("Rendered {} chart ({} bytes)", spec.kind(), png.len());
        Ok(png)
    }
}

pub struct RemoteTextGenerator {
    inference_service: Arc<InferenceServiceClient>,
    model_id: String,
    max_length: usize,
}

impl RemoteTextGenerator {
    pub fn new(inference_service: Arc<InferenceServiceClient>, model_id: String, max_length: usize) -> Self {
        Self {
            inference_service,
            model_id,
            max_length,
        }
    }
}

#[async_trait]
impl TextGenerator for RemoteTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, anyhow::Error> {
        let response = self
            .inference_service
            .generate(GenerateRequest {
                model_id: self.model_id.clone(),
                prompt: prompt.to_string(),
                max_length: self.max_length,
            })
            .await?;

        if response.success {
            Ok(response.generated_text)
        } else {
            let error_msg = response.error.unwrap_or_else(|| "Unknown error".to_string());
            error!("Generation with {} failed: {}", self.model_id, error_msg);
            Err(anyhow::anyhow!("generation failed: {}", error_msg))
        }
    }
}
