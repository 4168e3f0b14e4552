//! Instruction template for the research agent.
//!
//! Rendering is a pure function of the question, the intermediate steps of the
//! current run, the conversation history and the registered tools.

use std::collections::HashMap;

use regex::Regex;

use crate::agent::AgentStep;
use crate::error::{Result, ScoutError};
use crate::tool::ToolRegistry;

pub const AGENT_TEMPLATE: &str = r#"Answer the following questions as best you can. You have access to the following tools:

{tools}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question


Previous conversation history:
{history}

New question: {input}
{agent_scratchpad}"#;

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    tools: String,
    tool_names: String,
    placeholder: Regex,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>, tools: &ToolRegistry) -> Result<Self> {
        let placeholder = Regex::new(r"\{(\w+)\}")
            .map_err(|e| ScoutError::Protocol(format!("invalid placeholder pattern: {e}")))?;
        let catalog: Vec<String> = tools
            .iter()
            .map(|tool| format!("{}: {}", tool.name(), tool.description()))
            .collect();
        Ok(Self {
            template: template.into(),
            tools: catalog.join("\n"),
            tool_names: tools.names().join(", "),
            placeholder,
        })
    }

    pub fn agent(tools: &ToolRegistry) -> Result<Self> {
        Self::new(AGENT_TEMPLATE, tools)
    }

    pub fn render(&self, input: &str, steps: &[AgentStep], history: &str) -> String {
        let scratchpad = scratchpad(steps);
        let vars: HashMap<&str, &str> = HashMap::from([
            ("tools", self.tools.as_str()),
            ("tool_names", self.tool_names.as_str()),
            ("history", history),
            ("input", input),
            ("agent_scratchpad", scratchpad.as_str()),
        ]);
        // Single pass, so placeholder-looking text inside values stays literal.
        self.placeholder
            .replace_all(&self.template, |caps: &regex::Captures| {
                match vars.get(&caps[1]) {
                    Some(value) => value.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Each step's raw model text followed by its observation, oldest first.
pub fn scratchpad(steps: &[AgentStep]) -> String {
    let mut thoughts = String::new();
    for step in steps {
        thoughts.push_str(&step.action.log);
        thoughts.push_str("\nObservation: ");
        thoughts.push_str(&step.observation);
        thoughts.push_str("\nThought: ");
    }
    thoughts
}
