//! HTTP surfaces served on an ephemeral port.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use company_scout::server::{router, AppState};
use company_scout::{
    CompanyProfile, CompanyProfiler, CompanyQuery, ProfileStrategy, Result, ScoutError,
};
use serde_json::Value;

/// Records every query and answers with a fixed profile or error.
struct Recording {
    seen: Mutex<Vec<CompanyQuery>>,
    fail_with: Option<fn() -> ScoutError>,
}

impl Recording {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            fail_with: None,
        })
    }

    fn failing(err: fn() -> ScoutError) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            fail_with: Some(err),
        })
    }

    fn seen(&self) -> Vec<CompanyQuery> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileStrategy for Recording {
    fn name(&self) -> &str {
        "recording"
    }

    async fn profile(&self, query: &CompanyQuery) -> Result<CompanyProfile> {
        self.seen.lock().unwrap().push(query.clone());
        if let Some(err) = self.fail_with {
            return Err(err());
        }
        Ok(CompanyProfile {
            overview: format!("{} <b>overview</b>", query.company),
            products: "anvils".into(),
            keywords: "acme".into(),
            image: Some("empty".into()),
            address: Some("Lagos".into()),
        })
    }
}

async fn spawn(primary: Arc<Recording>) -> SocketAddr {
    let profiler =
        CompanyProfiler::from_strategies(Some(primary as Arc<dyn ProfileStrategy>), None).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState::new(profiler));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let addr = spawn(Recording::ok()).await;
    let body = client()
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn json_endpoint_wraps_profile_in_result() {
    let strategy = Recording::ok();
    let addr = spawn(strategy.clone()).await;

    let resp = client()
        .post(format!("http://{addr}/api/v1/company"))
        .query(&[
            ("company", "Acme Rocket Works"),
            ("country", "Nigeria"),
            ("url", "https://acme.example"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(
        body["result"]["overview"],
        "Acme-Rocket-Works <b>overview</b>"
    );
    assert_eq!(body["result"]["products"], "anvils");
    assert_eq!(body["result"]["address"], "Lagos");
    assert_eq!(
        strategy.seen(),
        vec![CompanyQuery::new("Acme-Rocket-Works", "Nigeria")]
    );
}

#[tokio::test]
async fn empty_company_is_rejected_before_profiling() {
    let strategy = Recording::ok();
    let addr = spawn(strategy.clone()).await;

    let resp = client()
        .post(format!("http://{addr}/api/v1/company"))
        .query(&[("company", " "), ("country", "Nigeria")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("required"));
    assert!(strategy.seen().is_empty());
}

#[tokio::test]
async fn timeouts_map_to_gateway_timeout() {
    let addr = spawn(Recording::failing(|| ScoutError::Timeout {
        operation: "model call".into(),
        after: Duration::from_secs(60),
    }))
    .await;

    let resp = client()
        .post(format!("http://{addr}/api/v1/company"))
        .query(&[("company", "Acme"), ("country", "Ghana")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 504);
}

#[tokio::test]
async fn form_page_renders() {
    let addr = spawn(Recording::ok()).await;
    for route in ["/", "/company/"] {
        let html = client()
            .get(format!("http://{addr}{route}"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(html.contains(r#"<input name="company""#));
        assert!(html.contains(r#"<input name="link""#));
    }
}

#[tokio::test]
async fn form_submission_renders_escaped_result() {
    let strategy = Recording::ok();
    let addr = spawn(strategy.clone()).await;

    let resp = client()
        .post(format!("http://{addr}/company/"))
        .form(&[("company", "Acme Corp"), ("country", "Nigeria"), ("link", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();

    assert!(html.contains("Acme-Corp &lt;b&gt;overview&lt;/b&gt;"));
    assert!(html.contains("<h2>Address</h2><p>Lagos</p>"));
    assert_eq!(strategy.seen()[0].company, "Acme-Corp");
}

#[tokio::test]
async fn upstream_failure_renders_error_page() {
    let addr = spawn(Recording::failing(|| {
        ScoutError::LanguageModel("openai request failed with 500".into())
    }))
    .await;

    let resp = client()
        .post(format!("http://{addr}/"))
        .form(&[("company", "Acme"), ("country", "Ghana")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 502);
    assert!(resp.text().await.unwrap().contains("Profile unavailable"));
}
