use scraper::Html;
use url::Url;

use crate::error::AppError;
use crate::models::JobListing;
use crate::normalize::{Normalizer, RawListing};
use crate::rate_limit::RateLimiter;
use crate::traits::{HttpClient, PageRenderer};

/// Retrieval primitive shared by all source adapters.
///
/// Owns the per-source [`RateLimiter`] and a handle to the session's
/// renderer. `fetch_api` goes through the limiter; `fetch_page` tries a
/// lightweight GET before falling back to headless rendering.
pub struct FetchClient<H, R>
where
    H: HttpClient,
    R: PageRenderer,
{
    source: String,
    http: H,
    renderer: R,
    limiter: RateLimiter,
    normalizer: Normalizer,
    default_headers: Vec<(String, String)>,
}

impl<H, R> FetchClient<H, R>
where
    H: HttpClient,
    R: PageRenderer,
{
    pub fn new(
        source: impl Into<String>,
        http: H,
        renderer: R,
        limiter: RateLimiter,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            source: source.into(),
            http,
            renderer,
            limiter,
            normalizer,
            default_headers: vec![("Accept".to_string(), "application/json".to_string())],
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// GET a JSON endpoint under the rate limiter.
    ///
    /// Waits out an exhausted window (bounded by the retry budget) and
    /// retries upstream 429 responses with an incremental delay charged to
    /// the same budget.
    pub async fn fetch_api(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &[(String, String)],
    ) -> Result<serde_json::Value, AppError> {
        let full_url = build_url(url, params)?;
        let headers = self.merge_headers(headers);

        loop {
            self.limiter.acquire().await?;

            tracing::debug!(source = %self.source, url = %full_url, "Fetching API");
            let response = self.http.get(full_url.as_str(), &headers).await?;

            if response.status == 429 {
                let delay = self.limiter.register_retry().inspect_err(|_| {
                    tracing::warn!(
                        source = %self.source,
                        url = %url,
                        "Upstream rate limit persisted"
                    );
                })?;
                tracing::info!(
                    source = %self.source,
                    delay_ms = %delay.as_millis(),
                    "Upstream returned 429, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if !response.is_success() {
                return Err(AppError::HttpError(format!(
                    "HTTP {} for {}",
                    response.status, url
                )));
            }

            self.limiter.record_success();
            return serde_json::from_str(&response.body).map_err(AppError::from);
        }
    }

    /// Fetch a page as a queryable document.
    ///
    /// Tries a plain GET first unless `force_render` is set; falls back to
    /// the headless renderer, optionally waiting for `wait_selector`.
    pub async fn fetch_page(
        &self,
        url: &str,
        wait_selector: Option<&str>,
        force_render: bool,
    ) -> Result<Html, AppError> {
        let plain_error = if force_render {
            None
        } else {
            match self.fetch_plain(url).await {
                Ok(body) => return Ok(Html::parse_document(&body)),
                Err(e) => {
                    tracing::debug!(
                        source = %self.source,
                        %url,
                        error = %e,
                        "Plain fetch failed, rendering"
                    );
                    Some(e)
                }
            }
        };

        match self.renderer.render(url, wait_selector).await {
            Ok(body) => Ok(Html::parse_document(&body)),
            Err(render_error) => Err(match plain_error {
                Some(plain_error) => AppError::RenderError(format!(
                    "Failed to fetch {url}: {plain_error}; rendering also failed: {render_error}"
                )),
                None => render_error,
            }),
        }
    }

    async fn fetch_plain(&self, url: &str) -> Result<String, AppError> {
        let response = self.http.get(url, &[]).await?;
        if !response.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                response.status, url
            )));
        }
        Ok(response.body)
    }

    pub fn normalize_job(&self, raw: RawListing) -> JobListing {
        self.normalizer.normalize(raw, &self.source)
    }

    pub fn extract_skills(&self, text: &str) -> Vec<String> {
        self.normalizer.extract_skills(text)
    }

    fn merge_headers(&self, headers: &[(String, String)]) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = headers.to_vec();
        for (name, value) in &self.default_headers {
            if !merged.iter().any(|(n, _)| n.eq_ignore_ascii_case(name)) {
                merged.push((name.clone(), value.clone()));
            }
        }
        merged
    }
}

/// Append URL-encoded query parameters to `base`.
pub fn build_url(base: &str, params: &[(String, String)]) -> Result<Url, AppError> {
    let mut url =
        Url::parse(base).map_err(|e| AppError::HttpError(format!("Invalid URL {base}: {e}")))?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::rate_limit::RateLimitConfig;
    use crate::skills::SkillTable;
    use crate::testutil::{MockHttp, MockRenderer};
    use crate::traits::HttpResponse;

    fn client(
        http: MockHttp,
        renderer: MockRenderer,
        config: RateLimitConfig,
    ) -> FetchClient<MockHttp, MockRenderer> {
        FetchClient::new(
            "test",
            http,
            renderer,
            RateLimiter::new("test", config),
            Normalizer::new(Arc::new(SkillTable::bundled().unwrap())),
        )
    }

    fn fast_limits() -> RateLimitConfig {
        RateLimitConfig::new(10, Duration::from_secs(60))
            .with_retry_step(Duration::from_millis(1))
            .with_reset_pad(Duration::ZERO)
    }

    #[test]
    fn test_build_url_encodes_params() {
        let url = build_url(
            "https://api.example.com/search",
            &[
                ("query".to_string(), "Full Stack Developer in India".to_string()),
                ("page".to_string(), "1".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/search?query=Full+Stack+Developer+in+India&page=1"
        );
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        assert!(matches!(
            build_url("not a url", &[]).unwrap_err(),
            AppError::HttpError(_)
        ));
    }

    #[tokio::test]
    async fn test_fetch_api_parses_json_and_sends_headers() {
        let http = MockHttp::with_responses(vec![Ok(HttpResponse::ok(r#"{"data": [1, 2]}"#))]);
        let fetch = client(http.clone(), MockRenderer::default(), fast_limits());

        let body = fetch
            .fetch_api(
                "https://api.example.com/search",
                &[("q".into(), "rust".into())],
                &[("X-Key".into(), "secret".into())],
            )
            .await
            .unwrap();

        assert_eq!(body["data"][1], 2);
        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://api.example.com/search?q=rust");
        assert!(requests[0].headers.contains(&("X-Key".into(), "secret".into())));
        assert!(
            requests[0]
                .headers
                .contains(&("Accept".into(), "application/json".into()))
        );
    }

    #[tokio::test]
    async fn test_fetch_api_retries_upstream_429() {
        let http = MockHttp::with_responses(vec![
            Ok(HttpResponse {
                status: 429,
                body: String::new(),
            }),
            Ok(HttpResponse::ok(r#"{"ok": true}"#)),
        ]);
        let fetch = client(http.clone(), MockRenderer::default(), fast_limits());

        let body = fetch.fetch_api("https://api.example.com", &[], &[]).await.unwrap();

        assert_eq!(body["ok"], true);
        assert_eq!(http.requests().len(), 2);
        assert_eq!(fetch.limiter().state().retry_count, 0);
    }

    #[tokio::test]
    async fn test_fetch_api_gives_up_after_retry_budget() {
        let too_many = || {
            Ok(HttpResponse {
                status: 429,
                body: String::new(),
            })
        };
        let http = MockHttp::with_responses(vec![too_many(), too_many(), too_many()]);
        let fetch = client(
            http.clone(),
            MockRenderer::default(),
            fast_limits().with_max_retries(2),
        );

        let err = fetch.fetch_api("https://api.example.com", &[], &[]).await.unwrap_err();

        assert!(matches!(err, AppError::RateLimitExceeded));
        assert_eq!(http.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_api_fails_when_local_budget_spent() {
        let http = MockHttp::default();
        let fetch = client(
            http,
            MockRenderer::default(),
            RateLimitConfig::new(1, Duration::from_secs(60)).with_max_retries(0),
        );

        fetch.fetch_api("https://api.example.com", &[], &[]).await.unwrap();
        let err = fetch.fetch_api("https://api.example.com", &[], &[]).await.unwrap_err();
        assert!(matches!(err, AppError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn test_fetch_api_non_success_is_http_error() {
        let http = MockHttp::with_responses(vec![Ok(HttpResponse {
            status: 503,
            body: "unavailable".into(),
        })]);
        let fetch = client(http, MockRenderer::default(), fast_limits());

        let err = fetch.fetch_api("https://api.example.com", &[], &[]).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[tokio::test]
    async fn test_fetch_page_prefers_plain_http() {
        let http = MockHttp::with_responses(vec![Ok(HttpResponse::ok(
            "<html><body><h1>Plain</h1></body></html>",
        ))]);
        let renderer = MockRenderer::default();
        let fetch = client(http, renderer.clone(), fast_limits());

        let doc = fetch.fetch_page("https://example.com", None, false).await.unwrap();

        assert!(doc.html().contains("Plain"));
        assert!(renderer.rendered_urls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_page_falls_back_to_renderer() {
        let http = MockHttp::with_responses(vec![Err(AppError::NetworkError("refused".into()))]);
        let renderer = MockRenderer::with_pages(vec![Ok(
            "<html><body><h1>Rendered</h1></body></html>".to_string(),
        )]);
        let fetch = client(http, renderer.clone(), fast_limits());

        let doc = fetch
            .fetch_page("https://example.com", Some("h1"), false)
            .await
            .unwrap();

        assert!(doc.html().contains("Rendered"));
        assert_eq!(renderer.rendered_urls(), vec!["https://example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_page_force_render_skips_http() {
        let http = MockHttp::default();
        let renderer = MockRenderer::with_pages(vec![Ok("<p>js</p>".to_string())]);
        let fetch = client(http.clone(), renderer, fast_limits());

        fetch.fetch_page("https://example.com", None, true).await.unwrap();
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_page_reports_both_failures() {
        let http = MockHttp::with_responses(vec![Ok(HttpResponse {
            status: 403,
            body: String::new(),
        })]);
        let renderer =
            MockRenderer::with_pages(vec![Err(AppError::RenderError("timeout".into()))]);
        let fetch = client(http, renderer, fast_limits());

        let err = fetch
            .fetch_page("https://example.com", None, false)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(matches!(err, AppError::RenderError(_)));
        assert!(message.contains("HTTP 403"));
        assert!(message.contains("timeout"));
    }
}
