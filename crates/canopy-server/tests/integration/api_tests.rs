use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::common::{FakeScraper, setup_test_app};

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app(FakeScraper::with_jobs(0));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = setup_test_app(FakeScraper::with_jobs(0));

    let response = app
        .oneshot(
            Request::get("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["paths"]["/v1/projects/build"].is_object());
}

// ---------------------------------------------------------------------------
// /v1/jobs/scrape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scrape_returns_report() {
    let scraper = FakeScraper::with_jobs(7);
    let app = setup_test_app(scraper.clone());

    let response = app
        .oneshot(post_json(
            "/v1/jobs/scrape",
            serde_json::json!({ "query": "Full Stack Developer", "pages": 2 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["jobs"].as_array().unwrap().len(), 7);
    assert_eq!(json["analysis"]["totalJobs"], 7);

    let queries = scraper.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].location, "India");
    assert_eq!(queries[0].pages, 2);
}

#[tokio::test]
async fn scrape_empty_query_returns_400() {
    let scraper = FakeScraper::with_jobs(7);
    let app = setup_test_app(scraper.clone());

    let response = app
        .oneshot(post_json(
            "/v1/jobs/scrape",
            serde_json::json!({ "query": "   " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "validation_error");
    assert!(scraper.queries().is_empty());
}

#[tokio::test]
async fn scrape_too_many_pages_returns_400() {
    let app = setup_test_app(FakeScraper::with_jobs(7));

    let response = app
        .oneshot(post_json(
            "/v1/jobs/scrape",
            serde_json::json!({ "query": "rust", "pages": 11 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scrape_insufficient_data_returns_422() {
    let app = setup_test_app(FakeScraper::insufficient());

    let response = app
        .oneshot(post_json(
            "/v1/jobs/scrape",
            serde_json::json!({ "query": "rust" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = json_body(response).await;
    assert_eq!(json["error"], "insufficient_data");
}

// ---------------------------------------------------------------------------
// /v1/projects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_empty_title_returns_400() {
    let app = setup_test_app(FakeScraper::with_jobs(0));

    let response = app
        .oneshot(post_json(
            "/v1/projects/generate",
            serde_json::json!({ "jobTitle": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_falls_back_when_model_unreachable() {
    let app = setup_test_app(FakeScraper::with_jobs(0));

    let response = app
        .oneshot(post_json(
            "/v1/projects/generate",
            serde_json::json!({ "jobTitle": "Full Stack Developer" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["insights"].as_array().unwrap().len(), 5);
    let projects = json["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 3);
    assert_eq!(
        projects[0]["title"],
        "E-Commerce Platform with Real-time Features"
    );
}

#[tokio::test]
async fn build_scrapes_two_pages_and_returns_insights() {
    let scraper = FakeScraper::with_jobs(7);
    let app = setup_test_app(scraper.clone());

    let response = app
        .oneshot(post_json(
            "/v1/projects/build",
            serde_json::json!({ "jobTitle": "Data Scientist", "location": "Pune" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["jobTitle"], "Data Scientist");
    assert_eq!(json["location"], "Pune");
    assert_eq!(json["projects"].as_array().unwrap().len(), 3);
    assert_eq!(json["insights"]["totalJobs"], 7);
    assert_eq!(json["insights"]["sampleJobs"].as_array().unwrap().len(), 5);
    assert_eq!(json["insights"]["topSkills"][0]["skill"], "react");
    assert!(json["timestamp"].is_string());

    let queries = scraper.queries();
    assert_eq!(queries[0].query, "Data Scientist");
    assert_eq!(queries[0].pages, 2);
}
