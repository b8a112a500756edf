use std::io::{Cursor, Write};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use dashmap::DashMap;
use serde_json::Value;
use tower::ServiceExt;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use lingua_backend::charts::{ChartRenderer, ChartSpec, TextGenerator};
use lingua_backend::config::Config;
use lingua_backend::inference_service::InferenceServiceClient;
use lingua_backend::routes::build_app;
use lingua_backend::state::AppState;
use lingua_backend::translation::{TranslationBackend, TranslationModel};

const BOUNDARY: &str = "lingua-test-boundary";
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Word-for-word dictionary standing in for a real model.
struct Glossary(&'static [(&'static str, &'static str)]);

#[async_trait]
impl TranslationModel for Glossary {
    async fn translate(&self, text: &str) -> anyhow::Result<String> {
        let words: Vec<&str> = text
            .split_whitespace()
            .map(|word| {
                self.0
                    .iter()
                    .find(|(from, _)| from.eq_ignore_ascii_case(word))
                    .map(|(_, to)| *to)
                    .unwrap_or(word)
            })
            .collect();
        Ok(words.join(" "))
    }
}

#[derive(Default)]
struct FakeBackend {
    loads: DashMap<String, usize>,
}

#[async_trait]
impl TranslationBackend for FakeBackend {
    async fn load_model(&self, model_id: &str) -> anyhow::Result<Arc<dyn TranslationModel>> {
        *self.loads.entry(model_id.to_string()).or_insert(0) += 1;
        Ok(Arc::new(Glossary(&[("bonjour", "Hello"), ("le", "the"), ("monde", "world")])))
    }
}

#[derive(Default)]
struct FakeRenderer {
    rendered: DashMap<String, usize>,
}

#[async_trait]
impl ChartRenderer for FakeRenderer {
    async fn render(&self, spec: &ChartSpec) -> anyhow::Result<Vec<u8>> {
        *self.rendered.entry(spec.kind().to_string()).or_insert(0) += 1;
        let mut png = PNG_MAGIC.to_vec();
        png.extend_from_slice(b"fake image data");
        Ok(png)
    }
}

struct SilentGenerator;

#[async_trait]
impl TextGenerator for SilentGenerator {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        Ok(String::new())
    }
}

struct Harness {
    app: Router,
    backend: Arc<FakeBackend>,
    renderer: Arc<FakeRenderer>,
}

fn harness() -> Harness {
    let backend = Arc::new(FakeBackend::default());
    let renderer = Arc::new(FakeRenderer::default());
    // nothing listens here, so the health probe reports the service as down
    let inference_service = Arc::new(InferenceServiceClient::new("http://127.0.0.1:9"));

    let state = AppState::with_collaborators(
        Config::default(),
        inference_service,
        backend.clone(),
        renderer.clone(),
        Arc::new(SilentGenerator),
    );

    Harness {
        app: build_app(state),
        backend,
        renderer,
    }
}

fn multipart_request(uri: &str, fields: &[(&str, &str)], file: (&str, &[u8])) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, file.0
        )
        .as_bytes(),
    );
    body.extend_from_slice(file.1);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A one-sheet workbook with inline strings: header row then (label, number) rows.
fn workbook(header: (&str, &str), rows: &[(&str, f64)]) -> Vec<u8> {
    let cell_text = |reference: String, text: &str| {
        format!(r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#, reference, text)
    };
    let mut sheet = String::from("<worksheet><sheetData>");
    sheet.push_str(&format!(
        r#"<row r="1">{}{}</row>"#,
        cell_text("A1".into(), header.0),
        cell_text("B1".into(), header.1)
    ));
    for (i, (label, value)) in rows.iter().enumerate() {
        let r = i + 2;
        sheet.push_str(&format!(
            r#"<row r="{r}">{}<c r="B{r}"><v>{}</v></c></row>"#,
            cell_text(format!("A{}", r), label),
            value
        ));
    }
    sheet.push_str("</sheetData></worksheet>");

    let parts = [
        (
            "xl/workbook.xml",
            r#"<workbook xmlns:r="r"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<Relationships><Relationship Id="rId1" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
        ),
        ("xl/worksheets/sheet1.xml", sheet),
    ];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in parts {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn sales_workbook() -> Vec<u8> {
    workbook(("month", "sales"), &[("jan", 10.0), ("feb", 12.0), ("mar", 9.5)])
}

#[tokio::test]
async fn test_upload_translates_plain_text() {
    let harness = harness();
    let request = multipart_request(
        "/upload/",
        &[("src_lang", "Francais"), ("tgt_lang", "Anglais")],
        ("hello.txt", "Bonjour le monde".as_bytes()),
    );

    let response = harness.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let translated = body["translated_text"].as_str().unwrap();
    assert!(!translated.is_empty());
    assert_ne!(translated, "Bonjour le monde");
    assert_eq!(translated, "Hello the world");
    assert_eq!(*harness.backend.loads.get("Helsinki-NLP/opus-mt-fr-en").unwrap(), 1);
}

#[tokio::test]
async fn test_repeated_uploads_reuse_loaded_models() {
    let harness = harness();
    for _ in 0..3 {
        let request = multipart_request(
            "/upload/",
            &[("src_lang", "Francais"), ("tgt_lang", "Arabe")],
            ("hello.txt", "Bonjour".as_bytes()),
        );
        let response = harness.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(*harness.backend.loads.get("Helsinki-NLP/opus-mt-fr-en").unwrap(), 1);
    assert_eq!(*harness.backend.loads.get("Helsinki-NLP/opus-mt-en-ar").unwrap(), 1);
}

#[tokio::test]
async fn test_upload_errors_carry_detail() {
    let harness = harness();

    let cases: [(&str, &str, &str, &[u8], StatusCode); 4] = [
        ("Francais", "Anglais", "image.png", b"\x89PNG", StatusCode::BAD_REQUEST),
        ("Francais", "Klingon", "hello.txt", b"Bonjour", StatusCode::BAD_REQUEST),
        ("Francais", "Anglais", "blank.txt", b"   \n", StatusCode::BAD_REQUEST),
        ("Francais", "Anglais", "broken.docx", b"not a zip", StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (src, tgt, file_name, bytes, status) in cases {
        let request = multipart_request("/upload/", &[("src_lang", src), ("tgt_lang", tgt)], (file_name, bytes));
        let response = harness.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), status, "{}", file_name);
        let body = json_body(response).await;
        assert!(body["detail"].is_string(), "{}: {}", file_name, body);
    }
}

#[tokio::test]
async fn test_upload_missing_language_is_unprocessable() {
    let harness = harness();
    let request = multipart_request("/upload/", &[("src_lang", "Francais")], ("hello.txt", b"Bonjour".as_slice()));

    let response = harness.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["detail"], "Invalid request: missing field: tgt_lang");
}

#[tokio::test]
async fn test_visualize_returns_png() {
    let harness = harness();
    let request = multipart_request(
        "/visualize/",
        &[("chart_type", "bar"), ("x_column", "Month"), ("y_column", "Sales")],
        ("ventes.xlsx", sales_workbook().as_slice()),
    );

    let response = harness.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(PNG_MAGIC));
    assert_eq!(*harness.renderer.rendered.get("bar").unwrap(), 1);
}

#[tokio::test]
async fn test_visualize_unknown_column_renders_nothing() {
    let harness = harness();
    let request = multipart_request(
        "/visualize/",
        &[("chart_type", "bar"), ("x_column", "Week"), ("y_column", "Sales")],
        ("ventes.xlsx", sales_workbook().as_slice()),
    );

    let response = harness.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("'week'"));
    assert!(harness.renderer.rendered.is_empty());
}

#[tokio::test]
async fn test_visualize_validation_errors() {
    let harness = harness();

    let request = multipart_request(
        "/visualize/",
        &[("chart_type", "radar"), ("x_column", "month"), ("y_column", "sales")],
        ("ventes.xlsx", sales_workbook().as_slice()),
    );
    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid chart type: radar");

    let request = multipart_request(
        "/visualize/",
        &[("chart_type", "bar"), ("x_column", "month"), ("y_column", "sales")],
        ("ventes.xlsx", b"month,sales\njan,10".as_slice()),
    );
    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = multipart_request("/visualize/", &[("x_column", "month")], ("ventes.xlsx", sales_workbook().as_slice()));
    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(response).await["error"].as_str().unwrap().contains("chart_type"));

    assert!(harness.renderer.rendered.is_empty());
}

#[tokio::test]
async fn test_health_reports_inference_service() {
    let harness = harness();
    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();

    let response = harness.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["inference_service"], false);
}

#[tokio::test]
async fn test_index_page_is_served() {
    let harness = harness();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let response = harness.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("/upload/"));
}
