use std::future::Future;

use futures::future::BoxFuture;

use crate::error::AppError;
use crate::models::{JobListing, SearchQuery};

/// Status and body of a lightweight HTTP GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs plain HTTP GET requests.
pub trait HttpClient: Send + Sync + Clone {
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<HttpResponse, AppError>> + Send;
}

/// Renders a page in a headless browser and returns the resulting HTML.
///
/// Clones share the same underlying browser; `close` tears it down for all
/// of them.
pub trait PageRenderer: Send + Sync + Clone {
    fn render(
        &self,
        url: &str,
        wait_selector: Option<&str>,
    ) -> impl Future<Output = Result<String, AppError>> + Send;

    fn close(&self) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A renderer for builds without a headless browser. Every render fails.
#[derive(Debug, Clone, Default)]
pub struct NullRenderer;

impl PageRenderer for NullRenderer {
    async fn render(&self, url: &str, _wait_selector: Option<&str>) -> Result<String, AppError> {
        Err(AppError::RenderError(format!(
            "no headless browser available to render {url}"
        )))
    }

    async fn close(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Parameters of a single completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Produces text from a generative model.
pub trait Completer: Send + Sync + Clone {
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Retrieves postings from one external job source.
///
/// Returns a boxed future so adapters for different sources can be held
/// together as trait objects.
pub trait SourceAdapter: Send + Sync {
    /// Identifier stamped on every listing this adapter produces.
    fn name(&self) -> &str;

    fn scrape<'a>(
        &'a self,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<Vec<JobListing>, AppError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_response_success_range() {
        assert!(HttpResponse::ok("x").is_success());
        assert!(
            !HttpResponse {
                status: 429,
                body: String::new()
            }
            .is_success()
        );
        assert!(
            !HttpResponse {
                status: 302,
                body: String::new()
            }
            .is_success()
        );
    }

    #[tokio::test]
    async fn test_null_renderer_always_fails() {
        let err = NullRenderer
            .render("https://example.com", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RenderError(_)));
        assert!(NullRenderer.close().await.is_ok());
    }
}
