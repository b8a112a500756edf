use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// HTTP client for the model server that hosts translation, generation and
/// chart rendering.
#[derive(Debug, Clone)]
pub struct InferenceServiceClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadModelRequest {
    pub model_id: String,
    pub task: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadModelResponse {
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub model_id: String,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    #[serde(default)]
    pub translation_text: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model_id: String,
    pub prompt: String,
    pub max_length: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub generated_text: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenderRequest<'a, S: Serialize> {
    pub spec: &'a S,
    pub width: u32,
    pub height: u32,
}

pub const TRANSLATION_TASK: &str = "translation";

impl InferenceServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn load_model(&self, request: LoadModelRequest) -> Result<LoadModelResponse> {
        let url = format!("{}/models/load", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        let result: LoadModelResponse = response.json().await?;
        Ok(result)
    }

    pub async fn translate(&self, request: TranslateRequest) -> Result<TranslateResponse> {
        let url = format!("{}/translate", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        let result: TranslateResponse = response.json().await?;
        Ok(result)
    }

    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let url = format!("{}/generate", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        let result: GenerateResponse = response.json().await?;
        Ok(result)
    }

    /// Returns the PNG bytes of the rendered chart.
    pub async fn render_chart<S: Serialize + Sync>(&self, request: RenderRequest<'_, S>) -> Result<Vec<u8>> {
        let url = format!("{}/charts/render", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .context("chart renderer rejected the request")?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}
