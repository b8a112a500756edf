use std::collections::HashMap;
use std::path::Path;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::charts::ChartParameters;
use crate::error::ServiceError;
use crate::state::AppState;
use crate::translation::UploadedDocument;

type ErrorResponse = (StatusCode, Json<Value>);

pub fn create_routes(state: AppState) -> Router<AppState> {
    let system_config = &state.config.system_config;
    let static_dir = Path::new(&system_config.static_dir);

    Router::new()
        // Health check
        .route("/api/health", get(health_check))

        // Services
        .route("/upload/", post(upload))
        .route("/visualize/", post(visualize))

        // Static file serving
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(system_config.max_upload_bytes))
}

/// The full application: routes, HTTP tracing and CORS.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let inference_healthy = state.inference_service.health_check().await.unwrap_or(false);
    Json(json!({
        "status": "ok",
        "inference_service": inference_healthy
    }))
}

async fn upload(State(state): State<AppState>, multipart: Multipart) -> Result<Json<Value>, ErrorResponse> {
    let span = info_span!("upload", request_id = %Uuid::new_v4());

    async move {
        let mut form = read_form(multipart).await.map_err(detail)?;
        let document = form.file.take().ok_or_else(|| missing("file")).map_err(detail)?;
        let src_lang = form.require("src_lang").map_err(detail)?;
        let tgt_lang = form.require("tgt_lang").map_err(detail)?;
        info!("Translating {} from {} to {}", document.file_name, src_lang, tgt_lang);

        let translated = state
            .translator
            .translate(document, &src_lang, &tgt_lang)
            .await
            .map_err(detail)?;
        info!("Translated {} chunk(s)", translated.chunks);

        Ok(Json(json!({ "translated_text": translated.translated_text })))
    }
    .instrument(span)
    .await
}

async fn visualize(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ErrorResponse> {
    let span = info_span!("visualize", request_id = %Uuid::new_v4());

    async move {
        let mut form = read_form(multipart).await.map_err(chart_error)?;
        let document = form.file.take().ok_or_else(|| missing("file")).map_err(chart_error)?;
        let params = ChartParameters {
            chart_type: form.optional("chart_type"),
            x_column: form.optional("x_column"),
            y_column: form.optional("y_column"),
        };
        let description = form.optional("description");

        let png = state
            .charts
            .visualize(document.bytes, params, description.as_deref())
            .await
            .map_err(chart_error)?;

        Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
    }
    .instrument(span)
    .await
}

/// Multipart fields of one request: at most one `file` plus text fields.
#[derive(Default)]
struct Form {
    file: Option<UploadedDocument>,
    fields: HashMap<String, String>,
}

impl Form {
    fn require(&mut self, name: &str) -> Result<String, ServiceError> {
        self.fields.remove(name).ok_or_else(|| missing(name))
    }

    /// Blank values count as absent.
    fn optional(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name).filter(|value| !value.trim().is_empty())
    }
}

async fn read_form(mut multipart: Multipart) -> Result<Form, ServiceError> {
    let mut form = Form::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_body)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(invalid_body)?;
            form.file = Some(UploadedDocument::new(file_name, bytes.to_vec()));
        } else {
            let value = field.text().await.map_err(invalid_body)?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

fn invalid_body(err: axum::extract::multipart::MultipartError) -> ServiceError {
    ServiceError::InvalidRequest(err.body_text())
}

fn missing(name: &str) -> ServiceError {
    ServiceError::InvalidRequest(format!("missing field: {}", name))
}

fn log_failure(err: &ServiceError) {
    if err.is_client_error() {
        warn!("Request rejected: {}", err);
    } else {
        error!("Request failed: {}", err);
    }
}

/// Translation errors use FastAPI's `{"detail": ...}` shape.
fn detail(err: ServiceError) -> ErrorResponse {
    log_failure(&err);
    (err.status_code(), Json(json!({ "detail": err.to_string() })))
}

/// Chart errors use `{"error": ...}`; a spreadsheet we cannot read is the
/// caller's fault here.
fn chart_error(err: ServiceError) -> ErrorResponse {
    log_failure(&err);
    let status = match err {
        ServiceError::ExtractionFailed(_) => StatusCode::BAD_REQUEST,
        _ => err.status_code(),
    };
    (status, Json(json!({ "error": err.to_string() })))
}
