use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use crate::error::{Result, ScoutError};
use crate::llm::{truncate_at_stop, LanguageModel};
use crate::memory::WindowMemory;
use crate::parser::{AgentAction, AgentOutput, OutputParser};
use crate::prompt::PromptTemplate;
use crate::tool::ToolRegistry;

/// Stop sequence that keeps the model from writing its own observations.
pub const OBSERVATION_STOP: &str = "\nObservation:";

/// One completed action and what the tool returned for it.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStep {
    pub action: AgentAction,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentState {
    Thinking,
    Acting(AgentAction),
    Done(String),
}

/// Outcome of one question: the final answer and the steps taken to reach it.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub output: String,
    pub steps: Vec<AgentStep>,
}

/// A ReAct agent alternating between the model and a fixed set of tools.
///
/// Intermediate steps live for one question; the window memory lives as long
/// as the agent and is shared by every question asked through it.
pub struct Agent<M: LanguageModel> {
    model: Arc<M>,
    tools: ToolRegistry,
    prompt: PromptTemplate,
    parser: OutputParser,
    memory: WindowMemory,
    stop: Vec<String>,
    max_iterations: usize,
    model_timeout: Duration,
    tool_timeout: Duration,
}

impl<M: LanguageModel> Agent<M> {
    pub fn new(model: Arc<M>, tools: ToolRegistry) -> Result<Self> {
        let prompt = PromptTemplate::agent(&tools)?;
        Ok(Self {
            model,
            tools,
            prompt,
            parser: OutputParser::new()?,
            memory: WindowMemory::default(),
            stop: vec![OBSERVATION_STOP.to_string()],
            max_iterations: 15,
            model_timeout: Duration::from_secs(60),
            tool_timeout: Duration::from_secs(20),
        })
    }

    pub fn with_memory(mut self, memory: WindowMemory) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_model_timeout(mut self, limit: Duration) -> Self {
        self.model_timeout = limit;
        self
    }

    pub fn with_tool_timeout(mut self, limit: Duration) -> Self {
        self.tool_timeout = limit;
        self
    }

    pub fn memory(&self) -> &WindowMemory {
        &self.memory
    }

    /// Answer `question`, returning only the final answer.
    pub async fn run(&mut self, question: &str) -> Result<String> {
        Ok(self.run_with_steps(question).await?.output)
    }

    /// Answer `question`, keeping every (action, observation) pair.
    ///
    /// Fails with `IterationsExhausted` once the model has been invoked
    /// `max_iterations` times without producing a final answer.
    pub async fn run_with_steps(&mut self, question: &str) -> Result<AgentRun> {
        let mut steps: Vec<AgentStep> = Vec::new();
        let mut iterations = 0usize;
        let mut state = AgentState::Thinking;

        loop {
            state = match state {
                AgentState::Thinking => {
                    if iterations >= self.max_iterations {
                        return Err(ScoutError::IterationsExhausted {
                            max: self.max_iterations,
                        });
                    }
                    iterations += 1;
                    debug!(iteration = iterations, steps = steps.len(), "agent thinking");
                    self.think(question, &steps).await?
                }
                AgentState::Acting(action) => {
                    let observation = self.act(&action).await?;
                    steps.push(AgentStep {
                        action,
                        observation,
                    });
                    AgentState::Thinking
                }
                AgentState::Done(output) => {
                    self.memory.save(question, output.as_str());
                    return Ok(AgentRun { output, steps });
                }
            };
        }
    }

    async fn think(&self, question: &str, steps: &[AgentStep]) -> Result<AgentState> {
        let prompt = self.prompt.render(question, steps, &self.memory.render());
        let raw = timeout(self.model_timeout, self.model.complete(&prompt, &self.stop))
            .await
            .map_err(|_| ScoutError::Timeout {
                operation: "model call".into(),
                after: self.model_timeout,
            })??;

        match self.parser.parse(truncate_at_stop(&raw, &self.stop))? {
            AgentOutput::Finish(finish) => Ok(AgentState::Done(finish.output)),
            AgentOutput::Action(action) => {
                if self.tools.get(&action.tool).is_none() {
                    return Err(ScoutError::ToolNotFound(action.tool));
                }
                Ok(AgentState::Acting(action))
            }
        }
    }

    async fn act(&self, action: &AgentAction) -> Result<String> {
        debug!(tool = %action.tool, input = %action.tool_input, "agent acting");
        timeout(
            self.tool_timeout,
            self.tools.call(&action.tool, &action.tool_input),
        )
        .await
        .map_err(|_| ScoutError::Timeout {
            operation: format!("tool `{}`", action.tool),
            after: self.tool_timeout,
        })?
    }
}
