//! Supervisor that routes a query to exactly one sub-agent
//!
//! The routing LLM picks an agent by name; the chosen agent runs its own
//! ReAct loop and its final answer is returned. Invocations share no state.

use std::sync::Arc;

use crate::agent::{ReactAgent, ToolRegistry};
use crate::error::{Error, Result};
use crate::providers::{ChatMessage, ChatModel, ChatRequest};
use crate::tools::{AddTool, MockWebSearchTool, MultiplyTool};

/// Routing policy for the maths/research workflow
pub const SUPERVISOR_PROMPT: &str = "You are a supervisor managing two agents: a research expert and a maths expert.\n\
If the query is about mathematics, use the maths expert.\n\
If the query is about current events or information lookup, use the research expert.";

pub const MATHS_EXPERT: &str = "maths_expert";
pub const RESEARCH_EXPERT: &str = "research_expert";

const MATHS_PROMPT: &str = "You are an excellent AI assistant in mathematics.";
const RESEARCH_PROMPT: &str =
    "You are an expert research assistant. Use the web search tool to find current information.";

/// The answer of the agent a query was routed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorOutput {
    /// Name of the agent that handled the query
    pub agent: String,
    /// That agent's final message
    pub message: String,
}

/// LLM-driven router over named agents
pub struct Supervisor {
    llm: Arc<dyn ChatModel>,
    prompt: String,
    agents: Vec<ReactAgent>,
}

impl Supervisor {
    pub fn new(llm: Arc<dyn ChatModel>, prompt: impl Into<String>) -> Self {
        Self {
            llm,
            prompt: prompt.into(),
            agents: Vec::new(),
        }
    }

    pub fn with_agent(mut self, agent: ReactAgent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(ReactAgent::name).collect()
    }

    fn routing_request(&self, query: &str) -> ChatRequest {
        let roster = self
            .agents
            .iter()
            .map(|a| format!("- {} (tools: {})", a.name(), a.tools().names().join(", ")))
            .collect::<Vec<_>>()
            .join("\n");

        let system = format!(
            "{}\n\nAvailable agents:\n{}\n\nReply with only the name of the one agent that should handle the query.",
            self.prompt, roster
        );
        ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(query)])
    }

    /// Resolve a routing reply to an agent, taking the earliest name mentioned.
    ///
    /// `maths_expert` also matches "maths expert", the wording the prompt uses.
    fn select(&self, reply: &str) -> Result<&ReactAgent> {
        let reply_lower = reply.to_lowercase();
        self.agents
            .iter()
            .filter_map(|agent| {
                let name = agent.name().to_lowercase();
                let spaced = name.replace('_', " ");
                [name.as_str(), spaced.as_str()]
                    .iter()
                    .filter_map(|needle| reply_lower.find(needle))
                    .min()
                    .map(|pos| (pos, agent))
            })
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, agent)| agent)
            .ok_or_else(|| {
                Error::Routing(format!(
                    "Supervisor replied `{}`, expected one of [{}]",
                    reply.trim(),
                    self.agent_names().join(", ")
                ))
            })
    }

    /// Route `query` to one agent and return its final message
    pub async fn invoke(&self, query: &str) -> Result<SupervisorOutput> {
        if self.agents.is_empty() {
            return Err(Error::Routing("Supervisor has no agents".to_string()));
        }

        let reply = self.llm.complete(self.routing_request(query)).await?;
        let agent = self.select(&reply)?;
        tracing::info!(agent = agent.name(), "Routed query");

        let outcome = agent.run(query).await?;
        Ok(SupervisorOutput {
            agent: agent.name().to_string(),
            message: outcome.output,
        })
    }
}

/// Research and maths agents under one supervisor, all sharing `llm`
pub fn build_math_search_workflow(llm: Arc<dyn ChatModel>, max_iterations: usize) -> Supervisor {
    let research = ReactAgent::new(
        RESEARCH_EXPERT,
        llm.clone(),
        ToolRegistry::new().with(Arc::new(MockWebSearchTool)),
    )
    .with_instructions(RESEARCH_PROMPT)
    .with_max_iterations(max_iterations);

    let maths = ReactAgent::new(
        MATHS_EXPERT,
        llm.clone(),
        ToolRegistry::new()
            .with(Arc::new(AddTool))
            .with(Arc::new(MultiplyTool)),
    )
    .with_instructions(MATHS_PROMPT)
    .with_max_iterations(max_iterations);

    Supervisor::new(llm, SUPERVISOR_PROMPT)
        .with_agent(research)
        .with_agent(maths)
}
