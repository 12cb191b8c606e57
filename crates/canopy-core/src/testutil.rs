//! Test utilities: mock implementations of the capability traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;

use crate::error::AppError;
use crate::models::{JobListing, SearchQuery};
use crate::traits::{
    Completer, CompletionRequest, HttpClient, HttpResponse, PageRenderer, SourceAdapter,
};

// ---------------------------------------------------------------------------
// MockHttp
// ---------------------------------------------------------------------------

/// A request seen by [`MockHttp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Mock HTTP client returning queued responses.
#[derive(Clone, Default)]
pub struct MockHttp {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns `200 {}`.
    responses: Arc<Mutex<Vec<Result<HttpResponse, AppError>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttp {
    pub fn with_responses(responses: Vec<Result<HttpResponse, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpClient for MockHttp {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, AppError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers.to_vec(),
        });
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(HttpResponse::ok("{}"))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockRenderer
// ---------------------------------------------------------------------------

/// Mock renderer returning queued HTML and counting `close` calls.
#[derive(Clone, Default)]
pub struct MockRenderer {
    pages: Arc<Mutex<Vec<Result<String, AppError>>>>,
    rendered: Arc<Mutex<Vec<String>>>,
    closes: Arc<Mutex<usize>>,
}

impl MockRenderer {
    pub fn with_pages(pages: Vec<Result<String, AppError>>) -> Self {
        Self {
            pages: Arc::new(Mutex::new(pages)),
            ..Default::default()
        }
    }

    pub fn rendered_urls(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        *self.closes.lock().unwrap()
    }
}

impl PageRenderer for MockRenderer {
    async fn render(&self, url: &str, _wait_selector: Option<&str>) -> Result<String, AppError> {
        self.rendered.lock().unwrap().push(url.to_string());
        let mut pages = self.pages.lock().unwrap();
        if pages.is_empty() {
            Ok("<html><body></body></html>".to_string())
        } else {
            pages.remove(0)
        }
    }

    async fn close(&self) -> Result<(), AppError> {
        *self.closes.lock().unwrap() += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockCompleter
// ---------------------------------------------------------------------------

/// Mock completion client returning queued text and recording prompts.
#[derive(Clone, Default)]
pub struct MockCompleter {
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompleter {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_responses(vec![Ok(text.into())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Completer for MockCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(AppError::Generic("MockCompleter has no queued responses".into()))
        } else {
            responses.remove(0)
        }
    }
}

/// A well-formed completion envelope.
pub fn valid_completion() -> String {
    let project = |n: u8| {
        serde_json::json!({
            "title": format!("Project {n}"),
            "description": format!("Description {n}"),
            "techStack": ["Rust", "Tokio", "PostgreSQL"],
            "tasks": ["Plan", "Build", "Test", "Document", "Deploy"],
            "difficulty": n
        })
    };
    serde_json::json!({
        "insights": ["rust", "tokio", "axum", "sql", "docker"],
        "projects": [project(1), project(2), project(3)]
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// Adapter returning a fixed set of listings, optionally after a delay.
pub struct StaticAdapter {
    name: String,
    listings: Vec<JobListing>,
    delay: Duration,
}

impl StaticAdapter {
    pub fn new(name: &str, listings: Vec<JobListing>) -> Self {
        Self {
            name: name.to_string(),
            listings,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl SourceAdapter for StaticAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn scrape<'a>(
        &'a self,
        _query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<Vec<JobListing>, AppError>> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.listings.clone())
        })
    }
}

/// Adapter that always fails.
pub struct FailingAdapter {
    name: String,
}

impl FailingAdapter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl SourceAdapter for FailingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn scrape<'a>(
        &'a self,
        _query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<Vec<JobListing>, AppError>> {
        Box::pin(async move { Err(AppError::HttpError(format!("{} is down", self.name))) })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A listing with the given identity fields and skills.
pub fn sample_listing(title: &str, company: &str, location: &str, skills: &[&str]) -> JobListing {
    JobListing {
        title: title.to_string(),
        company: company.to_string(),
        location: location.to_string(),
        description: format!("{title} at {company}"),
        salary: String::new(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        source: "test".to_string(),
        url: String::new(),
        timestamp: Utc::now(),
    }
}

/// `count` listings named `"{prefix} {i}"` for one source.
pub fn listings(prefix: &str, source: &str, count: usize) -> Vec<JobListing> {
    (0..count)
        .map(|i| {
            let mut job = sample_listing(&format!("{prefix} {i}"), "Acme", "Pune", &["react"]);
            job.source = source.to_string();
            job
        })
        .collect()
}
