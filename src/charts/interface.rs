use async_trait::async_trait;

use super::dispatcher::ChartSpec;

/// Turns a projected chart request into PNG bytes.
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(&self, spec: &ChartSpec) -> Result<Vec<u8>, anyhow::Error>;
}

/// Free-text generation, used to read chart parameters out of a description.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, anyhow::Error>;
}
