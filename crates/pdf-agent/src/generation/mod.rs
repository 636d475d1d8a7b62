//! Answer generation over retrieved context

pub mod chain;
pub mod prompt;

pub use chain::{ChainAnswer, RetrievalChain};
pub use prompt::{PromptBuilder, QA_SYSTEM_PROMPT};
