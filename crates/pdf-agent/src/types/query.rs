//! Request types

use serde::{Deserialize, Serialize};

/// Body of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// Free-text question
    pub query: String,
}
