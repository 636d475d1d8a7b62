//! Tool trait and the ordered registry an agent picks from

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

/// A callable tool exposed to an agent
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the agent uses in `Action:` lines
    fn name(&self) -> &str;

    /// One-line description shown in the agent prompt
    fn description(&self) -> &str;

    /// Run the tool on the raw action input
    async fn invoke(&self, input: &str) -> Result<String>;
}

/// Ordered set of tools. Order is preserved in the agent prompt.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name in place
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(i) => self.tools[i] = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// `name: description` lines for the prompt
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
