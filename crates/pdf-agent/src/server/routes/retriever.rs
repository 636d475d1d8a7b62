//! Retriever (re)initialization endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::MessageResponse;

/// POST /retriever/initialize - Attach to the index and install a new retriever
pub async fn initialize(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    state.initialize_retriever().await?;
    Ok(Json(MessageResponse::new("Retriever initialized successfully.")))
}
