//! Zero-shot ReAct agent loop
//!
//! The model sees the tool list and a Thought/Action/Observation transcript,
//! generates until `Observation:`, and the loop runs the named tool and feeds
//! its output back until the model emits `Final Answer:`.

use std::sync::Arc;

use crate::error::Result;
use crate::providers::{ChatModel, ChatRequest};

use super::output::{self, AgentAction, AgentDecision};
use super::tool::ToolRegistry;

/// Default iteration cap
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Output when the iteration cap is hit
pub const STOPPED_OUTPUT: &str = "Agent stopped due to iteration limit or time limit.";

const PREFIX: &str =
    "Answer the following questions as best you can. You have access to the following tools:";

const FORMAT_INSTRUCTIONS: &str = "Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";

const SUFFIX: &str = "Begin!

Question: {input}
Thought:";

const STOP_SEQUENCES: [&str; 2] = ["\nObservation:", "\n\tObservation:"];

/// One executed tool call
#[derive(Debug, Clone)]
pub struct AgentStep {
    pub action: AgentAction,
    pub observation: String,
}

/// Result of an agent run
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// Final answer, or [`STOPPED_OUTPUT`]
    pub output: String,
    /// Intermediate steps in order
    pub steps: Vec<AgentStep>,
}

/// Tool-using ReAct agent
pub struct ReactAgent {
    name: String,
    llm: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    instructions: Option<String>,
    max_iterations: usize,
}

impl ReactAgent {
    pub fn new(name: impl Into<String>, llm: Arc<dyn ChatModel>, tools: ToolRegistry) -> Self {
        Self {
            name: name.into(),
            llm,
            tools,
            instructions: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Persona line placed before the standard prefix
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Render the prompt header for this agent's tools
    pub fn prompt_template(&self) -> String {
        let mut prompt = String::new();
        if let Some(instructions) = &self.instructions {
            prompt.push_str(instructions);
            prompt.push_str("\n\n");
        }
        prompt.push_str(PREFIX);
        prompt.push_str("\n\n");
        prompt.push_str(&self.tools.describe());
        prompt.push_str("\n\n");
        prompt.push_str(&FORMAT_INSTRUCTIONS.replace("{tool_names}", &self.tools.names().join(", ")));
        prompt.push_str("\n\n");
        prompt.push_str(SUFFIX);
        prompt
    }

    fn scratchpad(steps: &[AgentStep]) -> String {
        steps
            .iter()
            .map(|step| {
                format!(
                    "{}\nObservation: {}\nThought: ",
                    step.action.log, step.observation
                )
            })
            .collect()
    }

    /// Run the loop on `input`
    pub async fn run(&self, input: &str) -> Result<AgentOutcome> {
        let header = self.prompt_template().replace("{input}", input);
        let mut steps: Vec<AgentStep> = Vec::new();

        for iteration in 0..self.max_iterations {
            let prompt = format!("{}{}", header, Self::scratchpad(&steps));
            let request = ChatRequest::prompt(prompt).with_stop(STOP_SEQUENCES);
            let mut text = self.llm.complete(request).await?;

            // drop any observation the model wrote for itself
            if let Some(pos) = text.find("\nObservation:") {
                text.truncate(pos);
            }

            match output::parse(&text)? {
                AgentDecision::Finish { output, .. } => {
                    tracing::info!(
                        agent = %self.name,
                        iterations = iteration + 1,
                        "Agent finished"
                    );
                    return Ok(AgentOutcome { output, steps });
                }
                AgentDecision::Action(action) => {
                    let observation = self.observe(&action).await?;
                    tracing::debug!(
                        agent = %self.name,
                        tool = %action.tool,
                        input = %action.tool_input,
                        "Observation: {}",
                        observation
                    );
                    steps.push(AgentStep { action, observation });
                }
            }
        }

        tracing::warn!(
            agent = %self.name,
            max_iterations = self.max_iterations,
            "Agent hit iteration limit"
        );
        Ok(AgentOutcome {
            output: STOPPED_OUTPUT.to_string(),
            steps,
        })
    }

    async fn observe(&self, action: &AgentAction) -> Result<String> {
        match self.tools.get(&action.tool) {
            Some(tool) => tool.invoke(&action.tool_input).await,
            None => Ok(format!(
                "{} is not a valid tool, try one of [{}].",
                action.tool,
                self.tools.names().join(", ")
            )),
        }
    }
}
