use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use canopy_core::models::SearchQuery;

use crate::dto::{
    BUILD_PAGES, BuildRequest, BuildResponse, GenerateRequest, GenerateResponse, HealthResponse,
    MarketInsights, ScrapeRequest, ScrapeResponse, location_or_default, require_title,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Request bodies above this size are rejected; `jobData` may carry many listings.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/v1/jobs/scrape", post(scrape_jobs))
        .route("/v1/projects/generate", post(generate_projects))
        .route("/v1/projects/build", post(build_projects))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/jobs/scrape",
    request_body = ScrapeRequest,
    responses(
        (status = 200, description = "Listings and market analysis", body = ScrapeResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 422, description = "Too few listings", body = crate::dto::ErrorResponse),
    ),
    tag = "jobs"
)]
pub async fn scrape_jobs(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<ScrapeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = body.into_query()?;
    tracing::info!(
        query = %query.query,
        location = %query.location,
        pages = query.pages,
        "Scrape requested"
    );

    let report = state.scraper.scrape(&query).await?;
    Ok(axum::Json(ScrapeResponse::from(report)))
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/projects/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Insights and project ideas", body = GenerateResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
    ),
    tag = "projects"
)]
pub async fn generate_projects(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = require_title(&body.job_title)?;
    let job_data = body.job_data.unwrap_or_default();

    let result = state.gateway.generate(title, &job_data).await;
    Ok(axum::Json(GenerateResponse::from(result)))
}

#[utoipa::path(
    post,
    path = "/v1/projects/build",
    request_body = BuildRequest,
    responses(
        (status = 200, description = "Scraped insights and project ideas", body = BuildResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 422, description = "Too few listings", body = crate::dto::ErrorResponse),
    ),
    tag = "projects"
)]
pub async fn build_projects(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<BuildRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = require_title(&body.job_title)?.to_string();
    let location = location_or_default(body.location);
    tracing::info!(job_title = %title, %location, "Building projects");

    let query = SearchQuery::new(&title, &location, BUILD_PAGES);
    let report = state.scraper.scrape(&query).await?;
    let result = state.gateway.generate(&title, &report).await;

    Ok(axum::Json(BuildResponse {
        insights: MarketInsights::from_report(&report),
        projects: result.projects,
        job_title: title,
        location,
        timestamp: chrono::Utc::now(),
    }))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health() -> impl IntoResponse {
    axum::Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
