use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Who to research. Immutable for the lifetime of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyQuery {
    pub company: String,
    pub country: String,
}

impl CompanyQuery {
    pub fn new(company: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            country: country.into(),
        }
    }
}

/// Structured profile returned to callers. `image` and `address` are only
/// produced by the retrieval strategy and are omitted from JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CompanyProfile {
    pub overview: String,
    pub products: String,
    pub keywords: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// One way of producing a [`CompanyProfile`].
#[async_trait]
pub trait ProfileStrategy: Send + Sync {
    fn name(&self) -> &str;
    async fn profile(&self, query: &CompanyQuery) -> Result<CompanyProfile>;
}

/// Questions answered against the retrieved search results, in profile order.
pub const RETRIEVAL_QUESTIONS: [&str; 5] = [
    "i want you to give me a brief overview of the company ",
    "What are the main products or services associated with the company",
    "the keywords particular to the company, return 'empty' if can't be found",
    "the company's picture, return 'empty' if can't be found",
    "the company location or address, return 'empty' if can't be found",
];

pub fn overview_question(query: &CompanyQuery) -> String {
    format!(
        "A brief overview of the company {} in {}",
        query.company, query.country
    )
}

pub fn products_question(query: &CompanyQuery) -> String {
    format!(
        "give me the main products or services associated to {} in the country {}",
        query.company, query.country
    )
}

pub fn keywords_question(query: &CompanyQuery) -> String {
    format!(
        "the most important keywords strictly associated to {} in the country {}, make it short return 'empty' if can't be found",
        query.company, query.country
    )
}
