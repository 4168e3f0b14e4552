use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::{Result, ScoutError};
use crate::orchestrator::CompanyProfiler;
use crate::profile::{CompanyProfile, CompanyQuery};

#[derive(Clone)]
pub struct AppState {
    pub profiler: Arc<CompanyProfiler>,
}

impl AppState {
    pub fn new(profiler: CompanyProfiler) -> Self {
        Self {
            profiler: Arc::new(profiler),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/", get(form_page).post(submit_form))
        .route("/company/", get(form_page).post(submit_form))
        .route("/api/v1/company", post(profile_api))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, router(state).into_make_service())
        .await
        .map_err(|err| ScoutError::Protocol(format!("server error: {err}")))?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CompanyForm {
    #[serde(default)]
    company: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompanyParams {
    #[serde(default)]
    company: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    url: Option<String>,
}

/// Company names are hyphenated before they reach a strategy.
fn build_query(company: &str, country: &str) -> std::result::Result<CompanyQuery, String> {
    let company = company.trim();
    let country = country.trim();
    if company.is_empty() || country.is_empty() {
        return Err("company and country are required".into());
    }
    Ok(CompanyQuery::new(company.replace(' ', "-"), country))
}

fn status_for(err: &ScoutError) -> StatusCode {
    match err {
        ScoutError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ScoutError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    }
}

async fn profile_api(
    State(state): State<AppState>,
    Query(params): Query<CompanyParams>,
) -> Response {
    let query = match build_query(&params.company, &params.country) {
        Ok(query) => query,
        Err(msg) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": msg })))
                .into_response()
        }
    };
    if let Some(url) = &params.url {
        debug!(%url, "reference url supplied");
    }

    match state.profiler.profile(&query).await {
        Ok(profile) => Json(json!({ "result": profile })).into_response(),
        Err(err) => (status_for(&err), Json(json!({ "error": err.to_string() }))).into_response(),
    }
}

async fn form_page() -> Html<String> {
    Html(render_form())
}

async fn submit_form(State(state): State<AppState>, Form(form): Form<CompanyForm>) -> Response {
    let query = match build_query(&form.company, &form.country) {
        Ok(query) => query,
        Err(msg) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(render_error(&msg))).into_response()
        }
    };
    if let Some(link) = &form.link {
        debug!(%link, "reference link supplied");
    }

    match state.profiler.profile(&query).await {
        Ok(profile) => Html(render_result(&query, &profile)).into_response(),
        Err(err) => (status_for(&err), Html(render_error(&err.to_string()))).into_response(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html>
<head>
    <meta charset="utf-8" />
    <title>{title}</title>
    <style>
        body {{ font-family: sans-serif; margin: 2rem; max-width: 48rem; }}
        .panel {{ border: 1px solid #ccc; padding: 1rem; margin-bottom: 1rem; border-radius: 8px; }}
        label {{ display: block; margin-top: .5rem; }}
        .error {{ border-color: #c33; color: #c33; }}
    </style>
</head>
<body>
{body}
</body>
</html>
"#
    )
}

fn render_form() -> String {
    page(
        "Company Scout",
        r#"    <h1>Company Scout</h1>
    <form class="panel" method="post" action="/company/">
        <label>Company <input name="company" required /></label>
        <label>Country <input name="country" required /></label>
        <label>Link <input name="link" /></label>
        <button type="submit">Research</button>
    </form>"#,
    )
}

fn render_result(query: &CompanyQuery, profile: &CompanyProfile) -> String {
    let mut sections = vec![
        ("Overview", profile.overview.as_str()),
        ("Products and services", profile.products.as_str()),
        ("Keywords", profile.keywords.as_str()),
    ];
    if let Some(image) = &profile.image {
        sections.push(("Picture", image));
    }
    if let Some(address) = &profile.address {
        sections.push(("Address", address));
    }

    let mut body = format!(
        "    <h1>{} ({})</h1>\n",
        escape(&query.company),
        escape(&query.country)
    );
    for (title, text) in sections {
        body.push_str(&format!(
            "    <div class=\"panel\"><h2>{title}</h2><p>{}</p></div>\n",
            escape(text)
        ));
    }
    body.push_str("    <a href=\"/company/\">New search</a>");
    page("Company profile", &body)
}

fn render_error(message: &str) -> String {
    page(
        "Company Scout error",
        &format!(
            "    <div class=\"panel error\"><h2>Profile unavailable</h2><p>{}</p></div>\n    <a href=\"/company/\">Try again</a>",
            escape(message)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn hyphenates_company_names() {
        let query = build_query(" Acme Rocket Works ", "Nigeria").unwrap();
        assert_eq!(query.company, "Acme-Rocket-Works");
        assert_eq!(query.country, "Nigeria");
        assert!(build_query("Acme", "  ").is_err());
    }

    #[test]
    fn maps_errors_to_statuses() {
        let timeout = ScoutError::Timeout {
            operation: "model call".into(),
            after: Duration::from_secs(1),
        };
        assert_eq!(status_for(&timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(&ScoutError::Config("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&ScoutError::LanguageModel("x".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn result_page_includes_optional_sections() {
        let profile = CompanyProfile {
            overview: "Makes anvils".into(),
            address: Some("Lagos".into()),
            ..Default::default()
        };
        let html = render_result(&CompanyQuery::new("Acme", "Nigeria"), &profile);
        assert!(html.contains("<h2>Address</h2><p>Lagos</p>"));
        assert!(!html.contains("Picture"));
    }
}
