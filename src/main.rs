use std::net::SocketAddr;

use company_scout::server::{serve, AppState};
use company_scout::{init_tracing, AppConfig, CompanyProfiler, ScoutError};

#[tokio::main]
async fn main() -> company_scout::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    let profiler = CompanyProfiler::from_config(&config)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|err| ScoutError::Config(format!("invalid listen address: {err}")))?;

    serve(AppState::new(profiler), addr).await
}
