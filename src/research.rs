//! Agent-loop strategy: a search-augmented ReAct agent answers the profile
//! questions one after another within a single session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::agent::Agent;
use crate::error::Result;
use crate::llm::LanguageModel;
use crate::memory::WindowMemory;
use crate::profile::{
    keywords_question, overview_question, products_question, CompanyProfile, CompanyQuery,
    ProfileStrategy,
};
use crate::tool::ToolRegistry;

pub struct ResearchStrategy<M: LanguageModel> {
    model: Arc<M>,
    tools: ToolRegistry,
    memory_window: usize,
    max_iterations: usize,
    model_timeout: Duration,
    tool_timeout: Duration,
}

impl<M: LanguageModel> ResearchStrategy<M> {
    pub fn new(model: Arc<M>, tools: ToolRegistry) -> Self {
        Self {
            model,
            tools,
            memory_window: 2,
            max_iterations: 15,
            model_timeout: Duration::from_secs(60),
            tool_timeout: Duration::from_secs(20),
        }
    }

    pub fn with_memory_window(mut self, k: usize) -> Self {
        self.memory_window = k.max(1);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_timeouts(mut self, model: Duration, tool: Duration) -> Self {
        self.model_timeout = model;
        self.tool_timeout = tool;
        self
    }

    /// A fresh session: empty memory, shared by the questions of one request.
    fn session(&self) -> Result<Agent<M>> {
        Ok(Agent::new(self.model.clone(), self.tools.clone())?
            .with_memory(WindowMemory::new(self.memory_window))
            .with_max_iterations(self.max_iterations)
            .with_model_timeout(self.model_timeout)
            .with_tool_timeout(self.tool_timeout))
    }
}

#[async_trait]
impl<M: LanguageModel + 'static> ProfileStrategy for ResearchStrategy<M> {
    fn name(&self) -> &str {
        "research-agent"
    }

    async fn profile(&self, query: &CompanyQuery) -> Result<CompanyProfile> {
        info!(company = %query.company, country = %query.country, "agent profile started");
        let mut agent = self.session()?;

        let overview = agent.run(&overview_question(query)).await?;
        let products = agent.run(&products_question(query)).await?;
        let keywords = agent.run(&keywords_question(query)).await?;

        Ok(CompanyProfile {
            overview,
            products,
            keywords,
            image: None,
            address: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubModel;
    use crate::tool::Tool;

    struct CannedSearch;

    #[async_trait]
    impl Tool for CannedSearch {
        fn name(&self) -> &str {
            "Search"
        }

        fn description(&self) -> &str {
            "useful for when you need to answer questions about current events"
        }

        async fn call(&self, _input: &str) -> Result<String> {
            Ok("Acme Corp is an anvil maker based in Lagos.".into())
        }
    }

    #[tokio::test]
    async fn answers_three_questions_with_shared_history() {
        let model = StubModel::new(vec![
            "Thought: search\nAction: Search\nAction Input: Acme Corp Nigeria".into(),
            "Final Answer: Acme Corp makes anvils.".into(),
            "Final Answer: Anvils and rocket skates.".into(),
            "Final Answer: anvils, Lagos".into(),
        ]);
        let mut tools = ToolRegistry::new();
        tools.register(CannedSearch);
        let strategy = ResearchStrategy::new(model.clone(), tools);

        let profile = strategy
            .profile(&CompanyQuery::new("Acme-Corp", "Nigeria"))
            .await
            .unwrap();

        assert_eq!(profile.overview, "Acme Corp makes anvils.");
        assert_eq!(profile.products, "Anvils and rocket skates.");
        assert_eq!(profile.keywords, "anvils, Lagos");
        assert!(profile.image.is_none());
        assert!(profile.address.is_none());

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 4);
        assert!(prompts[0]
            .contains("New question: A brief overview of the company Acme-Corp in Nigeria"));
        assert!(prompts[2].contains(
            "Human: A brief overview of the company Acme-Corp in Nigeria\nAI: Acme Corp makes anvils."
        ));
        // The second question starts with a clean scratchpad.
        assert!(prompts[1].contains("Observation: Acme Corp is an anvil maker"));
        assert!(!prompts[2].contains("Observation: Acme Corp is an anvil maker"));
    }

    #[tokio::test]
    async fn sessions_do_not_share_memory() {
        let model = StubModel::new(
            ["a", "b", "c", "d", "e", "f"]
                .iter()
                .map(|s| format!("Final Answer: {s}"))
                .collect(),
        );
        let strategy = ResearchStrategy::new(model.clone(), ToolRegistry::new());
        let query = CompanyQuery::new("Acme", "Ghana");

        strategy.profile(&query).await.unwrap();
        strategy.profile(&query).await.unwrap();

        let prompts = model.prompts();
        assert!(prompts[3].contains("Previous conversation history:\n\n"));
    }
}
