//! Upstream HTTP clients exercised against local mock servers.

use company_scout::tools::{GoogleSearchConfig, GoogleSearchTool, SerpApiConfig, SerpApiSearchTool};
use company_scout::{
    CompanyQuery, DocumentLoader, Embedder, LanguageModel, ModelConfig, OpenAIClient,
    OpenAIEmbedder, ScaleSerpLoader, ScoutError, Tool, OBSERVATION_STOP,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn model_config(server: &MockServer) -> ModelConfig {
    ModelConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        ..ModelConfig::default()
    }
}

#[tokio::test]
async fn chat_completion_sends_stop_sequence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 256,
            "stop": ["\nObservation:"],
            "messages": [{"role": "user", "content": "Question: who?"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Final Answer: Acme"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAIClient::from_config(&model_config(&server), Some("sk-test")).unwrap();
    let answer = client
        .complete("Question: who?", &[OBSERVATION_STOP.to_string()])
        .await
        .unwrap();

    assert_eq!(answer, "Final Answer: Acme");
}

#[tokio::test]
async fn rate_limit_is_a_language_model_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let client = OpenAIClient::from_config(&model_config(&server), Some("sk-test")).unwrap();
    let err = client.complete("hi", &[]).await.unwrap_err();

    assert!(matches!(&err, ScoutError::LanguageModel(msg) if msg.contains("rate limit")));
    assert!(err.is_upstream_failure());
}

#[tokio::test]
async fn embeddings_are_returned_in_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_partial_json(json!({"input": ["a", "b"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        })))
        .mount(&server)
        .await;

    let embedder = OpenAIEmbedder::from_config(&model_config(&server), Some("sk-test")).unwrap();
    let vectors = embedder
        .embed_batch(&["a".to_string(), "b".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test]
async fn google_search_joins_snippets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("key", "g-key"))
        .and(query_param("cx", "cse"))
        .and(query_param("q", "Acme Corp Nigeria"))
        .and(query_param("num", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"snippet": "Acme makes anvils."}, {"title": "no snippet"}, {"snippet": "Based in Lagos."}]
        })))
        .mount(&server)
        .await;

    let tool =
        GoogleSearchTool::new(GoogleSearchConfig::new("g-key", "cse").with_base_url(server.uri()))
            .unwrap();
    let observation = tool.call("Acme Corp Nigeria").await.unwrap();

    assert_eq!(observation, "Acme makes anvils. Based in Lagos.");
}

#[tokio::test]
async fn google_search_failure_is_a_tool_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let tool =
        GoogleSearchTool::new(GoogleSearchConfig::new("g-key", "cse").with_base_url(server.uri()))
            .unwrap();
    let err = tool.call("Acme").await.unwrap_err();

    assert!(matches!(err, ScoutError::ToolInvocation { ref name, .. } if name == "Search"));
}

#[tokio::test]
async fn serpapi_prefers_answer_box() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("engine", "google"))
        .and(query_param("q", "Acme Corp"))
        .and(query_param("api_key", "serp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer_box": {"snippet": "Acme is an anvil maker."},
            "organic_results": [{"snippet": "Other text"}]
        })))
        .mount(&server)
        .await;

    let tool = SerpApiSearchTool::new(SerpApiConfig::new("serp").with_base_url(server.uri()))
        .unwrap();

    assert_eq!(tool.call("Acme Corp").await.unwrap(), "Acme is an anvil maker.");
}

#[tokio::test]
async fn serpapi_error_field_is_a_tool_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "Invalid API key."})),
        )
        .mount(&server)
        .await;

    let tool = SerpApiSearchTool::new(SerpApiConfig::new("bad").with_base_url(server.uri()))
        .unwrap();
    let err = tool.call("Acme").await.unwrap_err();

    assert!(err.to_string().contains("Search"));
    assert!(err.is_upstream_failure());
}

#[tokio::test]
async fn scaleserp_results_become_one_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("api_key", "scale"))
        .and(query_param("q", "Acme-Corp"))
        .and(query_param("location", "Nigeria"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [{"title": "Acme Corp", "snippet": "Anvils since 1949"}]
        })))
        .mount(&server)
        .await;

    let loader = ScaleSerpLoader::new("scale", 5)
        .unwrap()
        .with_base_url(server.uri());
    let docs = loader
        .load(&CompanyQuery::new("Acme-Corp", "Nigeria"))
        .await
        .unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(
        docs[0].text,
        "organic_results.snippet: Anvils since 1949\norganic_results.title: Acme Corp"
    );
    assert_eq!(docs[0].metadata["country"], "Nigeria");
}

#[tokio::test]
async fn scaleserp_outage_is_a_retrieval_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let loader = ScaleSerpLoader::new("scale", 5)
        .unwrap()
        .with_base_url(server.uri());
    let err = loader
        .load(&CompanyQuery::new("Acme", "Ghana"))
        .await
        .unwrap_err();

    assert!(matches!(&err, ScoutError::Retrieval(msg) if msg.contains("503")));
}
