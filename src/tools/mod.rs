//! Web search tools available to the research agent.
//!
//! Both providers register under the same name so the prompt and the parser
//! never depend on which one is configured.

pub mod google;
pub mod serpapi;

pub use google::{google_search_toolkit, GoogleSearchConfig, GoogleSearchTool};
pub use serpapi::{serpapi_toolkit, SerpApiConfig, SerpApiSearchTool};

pub const SEARCH_TOOL_NAME: &str = "Search";
pub const SEARCH_DESCRIPTION: &str =
    "useful for when you need to answer questions about current events";
