use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use canopy_client::OpenAiCompleter;
use canopy_client::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use canopy_core::{LlmGateway, PipelineConfig, SkillTable};
use canopy_server::routes;
use canopy_server::state::{AppState, LiveScraper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("canopy=info".parse()?))
        .with_target(false)
        .init();

    let config = PipelineConfig::from_env()?;
    let skills = Arc::new(SkillTable::load(config.skills_file.as_deref())?);

    let api_key = std::env::var("CANOPY_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("CANOPY_API_KEY not set, project generation will use fallback ideas");
    }
    let model = std::env::var("CANOPY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let base_url =
        std::env::var("CANOPY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let completer = OpenAiCompleter::with_base_url(&api_key, &model, &base_url)?;
    let gateway = LlmGateway::new(completer, config.gateway.clone())?;

    let port = std::env::var("CANOPY_SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");

    let state = Arc::new(AppState {
        scraper: Box::new(LiveScraper::new(config, skills)),
        gateway,
    });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!(%model, "Starting server on {addr}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
