use regex::Regex;

use crate::error::{Result, ScoutError};

const FINAL_ANSWER: &str = "Final Answer:";
const ACTION_PATTERN: &str = r"(?s)Action\s*\d*\s*:(.*?)\nAction\s*\d*\s*Input\s*\d*\s*:\s*(.*)";

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentAction {
    pub tool: String,
    pub tool_input: String,
    /// Raw model text that produced this action; replayed in the scratchpad.
    pub log: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentFinish {
    pub output: String,
    pub log: String,
}

/// What one model invocation asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutput {
    Finish(AgentFinish),
    Action(AgentAction),
}

/// Classifies raw ReAct-style model text.
#[derive(Debug, Clone)]
pub struct OutputParser {
    action: Regex,
}

impl OutputParser {
    pub fn new() -> Result<Self> {
        let action = Regex::new(ACTION_PATTERN)
            .map_err(|e| ScoutError::Protocol(format!("invalid action pattern: {e}")))?;
        Ok(Self { action })
    }

    pub fn parse(&self, text: &str) -> Result<AgentOutput> {
        if let Some((_, answer)) = text.rsplit_once(FINAL_ANSWER) {
            return Ok(AgentOutput::Finish(AgentFinish {
                output: answer.trim().to_string(),
                log: text.to_string(),
            }));
        }

        let caps = self.action.captures(text).ok_or_else(|| ScoutError::Parse {
            raw: text.to_string(),
        })?;
        let tool = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let input = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        Ok(AgentOutput::Action(AgentAction {
            tool: tool.to_string(),
            tool_input: input.trim().trim_matches('"').to_string(),
            log: text.to_string(),
        }))
    }
}
