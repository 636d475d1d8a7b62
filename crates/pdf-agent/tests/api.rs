//! HTTP-level tests over in-process fakes

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

use common::{
    multipart_body, sample_pdf, state_with_store, test_state, FlakyStore, HashEmbedder,
    ScriptedChat, BOUNDARY,
};
use pdf_agent::error::RETRIEVER_NOT_INITIALIZED;
use pdf_agent::ingestion::{IngestPipeline, MetadataOverrides};
use pdf_agent::providers::VectorStoreProvider;
use pdf_agent::retrieval::SelfQueryRetriever;
use pdf_agent::server::build_router;

const CV_LINES: &[&str] = &[
    "Jane Doe Curriculum Vitae",
    "Skills: Rust, distributed systems, technical writing",
    "Experience: eight years building storage engines",
];

const REPORT_LINES: &[&str] = &[
    "Quarterly Report",
    "Revenue grew in every region during the quarter",
    "Headcount remained flat",
];

fn upload_request(filename: &str, pdf: &[u8], fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload-pdf")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(filename, pdf, fields)))
        .unwrap()
}

fn ask_request(query: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn expected_chunks(dir: &Path, pdf: &[u8]) -> usize {
    let path = dir.join("expected.pdf");
    std::fs::write(&path, pdf).unwrap();
    IngestPipeline::new(500, 200)
        .chunk_file(&path, &MetadataOverrides::default())
        .unwrap()
        .len()
}

#[tokio::test]
async fn test_upload_indexes_every_chunk() {
    let uploads = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let llm = ScriptedChat::new(&[]);
    let (state, store) = test_state(uploads.path(), llm.clone());
    let app = build_router(state);

    let pdf = sample_pdf("Jane Doe CV", CV_LINES);
    let expected = expected_chunks(scratch.path(), &pdf);
    assert!(expected > 0);

    let (status, body) = send_json(&app, upload_request("cv.pdf", &pdf, &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "File 'cv.pdf' uploaded and indexed successfully."
    );
    assert_eq!(store.len().await.unwrap(), expected);
    assert!(uploads.path().join("cv.pdf").exists());

    // Uploading again appends
    let (status, _) = send(&app, upload_request("cv.pdf", &pdf, &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.len().await.unwrap(), expected * 2);

    // Indexing never calls the chat model
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_ask_before_initialize_is_rejected() {
    let uploads = tempfile::tempdir().unwrap();
    let llm = ScriptedChat::new(&["Final Answer: should not be used"]);
    let (state, _store) = test_state(uploads.path(), llm.clone());
    let app = build_router(state);

    let (status, body) = send_json(&app, ask_request("What skills are listed?")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], RETRIEVER_NOT_INITIALIZED);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_corrupt_upload_is_server_error() {
    let uploads = tempfile::tempdir().unwrap();
    let (state, store) = test_state(uploads.path(), ScriptedChat::new(&[]));
    let app = build_router(state);

    let (status, body) =
        send_json(&app, upload_request("broken.pdf", b"this is not a pdf", &[])).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["detail"].as_str().unwrap().is_empty());
    assert_eq!(store.len().await.unwrap(), 0);

    // Service keeps running
    let (status, body) = send(&app, empty_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_upload_without_file_is_server_error() {
    let uploads = tempfile::tempdir().unwrap();
    let (state, _store) = test_state(uploads.path(), ScriptedChat::new(&[]));
    let app = build_router(state);

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nNo file\r\n--{BOUNDARY}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload-pdf")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("No file"));
}

#[tokio::test]
async fn test_malformed_ask_body_has_detail() {
    let uploads = tempfile::tempdir().unwrap();
    let llm = ScriptedChat::new(&[]);
    let (state, _store) = test_state(uploads.path(), llm.clone());
    let app = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"q": 1}"#))
        .unwrap();
    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("query"));

    let request = Request::builder()
        .method("POST")
        .uri("/ask")
        .body(Body::from(r#"{"query": "hi"}"#))
        .unwrap();
    let (status, body) = send_json(&app, request).await;
    assert!(status.is_client_error());
    assert!(!body["detail"].as_str().unwrap().is_empty());

    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_upload_without_multipart_has_detail() {
    let uploads = tempfile::tempdir().unwrap();
    let (state, store) = test_state(uploads.path(), ScriptedChat::new(&[]));
    let app = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/upload-pdf")
        .header(header::CONTENT_TYPE, "application/pdf")
        .body(Body::from(sample_pdf("CV", CV_LINES)))
        .unwrap();
    let (status, body) = send_json(&app, request).await;
    assert!(status.is_client_error());
    assert!(!body["detail"].as_str().unwrap().is_empty());
    assert_eq!(store.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unparseable_agent_output_is_server_error() {
    let uploads = tempfile::tempdir().unwrap();
    let llm = ScriptedChat::new(&["I am not sure what to do here."]);
    let (state, _store) = test_state(uploads.path(), llm.clone());
    let app = build_router(state);

    let (status, _) = send(&app, empty_request("POST", "/retriever/initialize")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(&app, ask_request("What skills are listed?")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["detail"].as_str().unwrap().is_empty());
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_failed_initialize_leaves_service_unready() {
    let uploads = tempfile::tempdir().unwrap();
    let llm = ScriptedChat::new(&[]);
    let store = FlakyStore::unreachable();
    let state = state_with_store(uploads.path(), llm.clone(), store.clone());

    // Startup path: failure is reported and the slot stays empty
    assert!(state.initialize_retriever().await.is_err());
    assert!(!state.is_ready());

    let app = build_router(state);
    let (status, body) = send_json(&app, empty_request("POST", "/retriever/initialize")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("unreachable"));

    let (status, _) = send(&app, empty_request("GET", "/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = send_json(&app, ask_request("What skills are listed?")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], RETRIEVER_NOT_INITIALIZED);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_failed_reinitialize_keeps_previous_retriever() {
    let uploads = tempfile::tempdir().unwrap();
    let store = FlakyStore::unreachable();
    let state = state_with_store(uploads.path(), ScriptedChat::new(&[]), store.clone());
    let app = build_router(state);

    store.set_reachable(true);
    let (status, _) = send(&app, empty_request("POST", "/retriever/initialize")).await;
    assert_eq!(status, StatusCode::OK);

    store.set_reachable(false);
    let (status, _) = send(&app, empty_request("POST", "/retriever/initialize")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(&app, empty_request("GET", "/ready")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_follows_retriever() {
    let uploads = tempfile::tempdir().unwrap();
    let (state, _store) = test_state(uploads.path(), ScriptedChat::new(&[]));
    let app = build_router(state);

    let (status, _) = send(&app, empty_request("GET", "/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = send_json(&app, empty_request("POST", "/retriever/initialize")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Retriever initialized successfully.");

    let (status, _) = send(&app, empty_request("GET", "/ready")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let uploads = tempfile::tempdir().unwrap();
    let (state, _store) = test_state(uploads.path(), ScriptedChat::new(&[]));
    let app = build_router(state);

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/ask")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_ask_answers_from_uploaded_pdf() {
    let uploads = tempfile::tempdir().unwrap();
    let llm = ScriptedChat::new(&[
        " I should look in the uploaded PDFs.\nAction: PDF_QA\nAction Input: What skills does Jane have?",
        "```json\n{\"query\": \"skills\", \"filter\": \"NO_FILTER\"}\n```",
        "Jane knows Rust and distributed systems.",
        " I now know the final answer\nFinal Answer: Jane knows Rust and distributed systems.",
    ]);
    let (state, _store) = test_state(uploads.path(), llm.clone());
    let app = build_router(state);

    let (status, _) = send(&app, empty_request("POST", "/retriever/initialize")).await;
    assert_eq!(status, StatusCode::OK);

    let pdf = sample_pdf("Jane Doe CV", CV_LINES);
    let (status, _) = send(&app, upload_request("cv.pdf", &pdf, &[])).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(&app, ask_request("What skills does Jane have?")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Jane knows Rust and distributed systems.");
    assert_eq!(llm.calls(), 4);

    // The QA call saw the retrieved PDF text as context
    let requests = llm.requests.lock();
    let qa_prompt: String = requests[2]
        .messages
        .iter()
        .map(|m| m.content.clone())
        .collect::<Vec<_>>()
        .join("\n");
    assert!(qa_prompt.contains("Rust"));
}

#[tokio::test]
async fn test_self_query_filter_selects_document_type() {
    let uploads = tempfile::tempdir().unwrap();
    let (state, store) = test_state(uploads.path(), ScriptedChat::new(&[]));
    let app = build_router(state);

    let cv = sample_pdf("Jane Doe CV", CV_LINES);
    let report = sample_pdf("Quarterly Report", REPORT_LINES);
    let (status, _) = send(
        &app,
        upload_request("cv.pdf", &cv, &[("document_type", "CV")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        upload_request("report.pdf", &report, &[("document_type", "Report")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let llm = ScriptedChat::new(&[
        "```json\n{\"query\": \"skills\", \"filter\": \"eq(\\\"document_type\\\", \\\"CV\\\")\"}\n```",
    ]);
    let retriever = SelfQueryRetriever::new(llm, Arc::new(HashEmbedder), store, 10);

    let chunks = retriever.retrieve("What skills are in the CV?").await.unwrap();
    assert!(!chunks.is_empty());
    for chunk in &chunks {
        assert_eq!(chunk.metadata.document_type.as_deref(), Some("CV"));
        assert_eq!(chunk.metadata.source, uploads.path().join("cv.pdf").display().to_string());
    }
}
