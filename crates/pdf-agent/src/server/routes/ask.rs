//! Question answering endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse};

/// POST /ask - Answer a question with the PDF/web agent
pub async fn ask(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>> {
    let Json(request) = payload?;
    tracing::info!("Question: {}", request.query);
    let answer = state.ask(&request.query).await?;
    Ok(Json(AskResponse { answer }))
}
