use std::collections::VecDeque;

/// One question/answer pair of a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub input: String,
    pub output: String,
}

/// Conversation memory that keeps only the last `k` exchanges.
#[derive(Debug, Clone)]
pub struct WindowMemory {
    k: usize,
    exchanges: VecDeque<Exchange>,
}

impl WindowMemory {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            exchanges: VecDeque::with_capacity(k + 1),
        }
    }

    /// Record an exchange, evicting the oldest ones beyond the window.
    pub fn save(&mut self, input: impl Into<String>, output: impl Into<String>) {
        self.exchanges.push_back(Exchange {
            input: input.into(),
            output: output.into(),
        });
        while self.exchanges.len() > self.k {
            self.exchanges.pop_front();
        }
    }

    /// History block for the prompt, oldest exchange first.
    pub fn render(&self) -> String {
        self.exchanges
            .iter()
            .map(|e| format!("Human: {}\nAI: {}", e.input, e.output))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

impl Default for WindowMemory {
    fn default() -> Self {
        Self::new(2)
    }
}
