//! API routes for the PDF agent server

pub mod ask;
pub mod retriever;
pub mod upload;

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload - with larger body limit for PDFs
        .route(
            "/upload-pdf",
            post(upload::upload_pdf).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/ask", post(ask::ask))
        .route("/retriever/initialize", post(retriever::initialize))
}
