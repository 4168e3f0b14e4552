use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Result, ScoutError};

/// A named, described callable the agent may invoke instead of answering.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn call(&self, input: &str) -> Result<String>;
}

/// Tools in registration order. Order is part of the rendered prompt, so a
/// map with unstable iteration is not used here.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registering a name twice replaces the earlier tool in place.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(slot) => *slot = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> + '_ {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch by exact, case-sensitive name.
    pub async fn call(&self, name: &str, input: &str) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| ScoutError::ToolNotFound(name.to_string()))?;
        tool.call(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper(&'static str);

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "Uppercases its input"
        }

        async fn call(&self, input: &str) -> Result<String> {
            Ok(input.to_uppercase())
        }
    }

    #[tokio::test]
    async fn dispatches_by_exact_name() {
        let mut tools = ToolRegistry::new();
        tools.register(Upper("Search"));

        assert_eq!(tools.call("Search", "acme").await.unwrap(), "ACME");
        assert!(matches!(
            tools.call("search", "acme").await,
            Err(ScoutError::ToolNotFound(name)) if name == "search"
        ));
    }

    #[test]
    fn keeps_registration_order_and_replaces_duplicates() {
        let mut tools = ToolRegistry::new();
        tools.register(Upper("Search"));
        tools.register(Upper("Lookup"));
        tools.register(Upper("Search"));

        assert_eq!(tools.names(), vec!["Search", "Lookup"]);
        assert_eq!(tools.len(), 2);
    }
}
