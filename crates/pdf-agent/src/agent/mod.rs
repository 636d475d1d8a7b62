//! Tool-using agents

pub mod output;
mod react;
mod tool;

pub use output::{AgentAction, AgentDecision};
pub use react::{AgentOutcome, AgentStep, ReactAgent, DEFAULT_MAX_ITERATIONS, STOPPED_OUTPUT};
pub use tool::{Tool, ToolRegistry};
