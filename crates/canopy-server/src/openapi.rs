use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Canopy API",
        version = "0.1.0",
        description = "Job-market scraping, skill analytics, and portfolio project ideas."
    ),
    paths(
        crate::routes::scrape_jobs,
        crate::routes::generate_projects,
        crate::routes::build_projects,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::ScrapeRequest,
        crate::dto::ScrapeResponse,
        crate::dto::GenerateRequest,
        crate::dto::GenerateResponse,
        crate::dto::BuildRequest,
        crate::dto::BuildResponse,
        crate::dto::MarketInsights,
        crate::dto::SampleJob,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "jobs", description = "Job listing scrapes"),
        (name = "projects", description = "Project idea generation"),
        (name = "system", description = "Health and system status"),
    )
)]
pub struct ApiDoc;
