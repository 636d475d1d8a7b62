//! Parser for ReAct-formatted model output

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Error, Result};

const FINAL_ANSWER: &str = "Final Answer:";

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAction {
    pub tool: String,
    pub tool_input: String,
    /// Raw model text that produced the action
    pub log: String,
}

/// What the model decided to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentDecision {
    Action(AgentAction),
    Finish { output: String, log: String },
}

fn action_pattern() -> &'static Regex {
    static ACTION: OnceLock<Regex> = OnceLock::new();
    ACTION.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
            .expect("Invalid regex")
    })
}

/// Parse one model turn into an action or a final answer
pub fn parse(text: &str) -> Result<AgentDecision> {
    let includes_answer = text.contains(FINAL_ANSWER);

    if let Some(caps) = action_pattern().captures(text) {
        if includes_answer {
            return Err(Error::Agent(format!(
                "Parsing LLM output produced both a final answer and a parse-able action: {}",
                text
            )));
        }

        let tool = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
        let tool_input = caps
            .get(2)
            .map_or("", |m| m.as_str())
            .trim()
            .trim_matches('"')
            .to_string();

        return Ok(AgentDecision::Action(AgentAction {
            tool,
            tool_input,
            log: text.to_string(),
        }));
    }

    if includes_answer {
        let output = text
            .rsplit(FINAL_ANSWER)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        return Ok(AgentDecision::Finish {
            output,
            log: text.to_string(),
        });
    }

    if !text.contains("Action:") {
        Err(Error::Agent(format!(
            "Could not parse LLM output, missing 'Action:' after 'Thought:': `{}`",
            text
        )))
    } else {
        Err(Error::Agent(format!(
            "Could not parse LLM output, missing 'Action Input:' after 'Action:': `{}`",
            text
        )))
    }
}
