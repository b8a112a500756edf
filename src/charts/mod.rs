pub mod client;
pub mod dispatcher;
pub mod hints;
pub mod interface;
pub mod table;

use std::sync::Arc;

use tracing::info;

use crate::error::{Result, ServiceError};

pub use client::{RemoteChartRenderer, RemoteTextGenerator};
pub use dispatcher::{ChartDispatcher, ChartKind, ChartSpec};
pub use hints::ChartParameters;
pub use interface::{ChartRenderer, TextGenerator};
pub use table::Table;

/// Spreadsheet upload + chart parameters -> PNG.
pub struct ChartService {
    dispatcher: ChartDispatcher,
    generator: Arc<dyn TextGenerator>,
}

impl ChartService {
    pub fn new(dispatcher: ChartDispatcher, generator: Arc<dyn TextGenerator>) -> Self {
        Self { dispatcher, generator }
    }

    pub async fn visualize(&self, bytes: Vec<u8>, params: ChartParameters, description: Option<&str>) -> Result<Vec<u8>> {
        let table = tokio::task::spawn_blocking(move || Table::from_xlsx(&bytes))
            .await
            .map_err(|e| ServiceError::ExtractionFailed(format!("spreadsheet task failed: {}", e)))??;

        let params = hints::infer_missing(params, description, table.columns(), self.generator.as_ref()).await;
        let (chart_type, x_column, y_column) = match params {
            ChartParameters {
                chart_type: Some(chart_type),
                x_column: Some(x_column),
                y_column: Some(y_column),
            } => (chart_type, x_column, y_column),
            incomplete => {
                return Err(ServiceError::InvalidRequest(format!(
                    "missing field(s): {}",
                    incomplete.missing().join(", ")
                )))
            }
        };

        info!("Chart request: {} of {} by {}", chart_type, y_column, x_column);
        self.dispatcher.dispatch(&table, &chart_type, &x_column, &y_column).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::tests::sample_workbook;
    use async_trait::async_trait;

    struct Png;

    #[async_trait]
    impl ChartRenderer for Png {
        async fn render(&self, _spec: &ChartSpec) -> anyhow::Result<Vec<u8>> {
            Ok(b"\x89PNG\r\n\x1a\n".to_vec())
        }
    }

    struct Suggests(&'static str);

    #[async_trait]
    impl TextGenerator for Suggests {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn service(suggestion: &'static str) -> ChartService {
        ChartService::new(ChartDispatcher::new(Arc::new(Png), 10), Arc::new(Suggests(suggestion)))
    }

    fn workbook() -> Vec<u8> {
        sample_workbook(("month", "sales"), &[("jan", 10.0), ("feb", 12.0)])
    }

    #[tokio::test]
    async fn test_description_fills_missing_fields() {
        let params = ChartParameters {
            chart_type: None,
            x_column: Some("Month".into()),
            y_column: Some("Sales".into()),
        };
        let png = service("chart_type: pie")
            .visualize(workbook(), params, Some("share of sales"))
            .await
            .unwrap();
        assert!(png.starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn test_missing_fields_without_description() {
        let err = service("")
            .visualize(workbook(), ChartParameters::default(), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::InvalidRequest("missing field(s): chart_type, x_column, y_column".into())
        );
    }

    #[tokio::test]
    async fn test_unreadable_spreadsheet() {
        let params = ChartParameters {
            chart_type: Some("bar".into()),
            x_column: Some("month".into()),
            y_column: Some("sales".into()),
        };
        let err = service("").visualize(b"not a workbook".to_vec(), params, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::ExtractionFailed(_)));
    }
}
