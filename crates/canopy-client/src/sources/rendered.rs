use canopy_core::error::AppError;
use canopy_core::fetch::{FetchClient, build_url};
use canopy_core::models::{JobListing, SearchQuery};
use canopy_core::normalize::{RawListing, ScrapedCard};
use canopy_core::traits::{HttpClient, PageRenderer, SourceAdapter};
use futures::future::BoxFuture;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// CSS selectors locating the fields of one search-result card.
#[derive(Debug, Clone)]
pub struct CardSelectors {
    pub card: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub description: String,
    /// Anchor whose `href` points at the posting.
    pub link: String,
}

/// A job board whose search results are scraped from rendered HTML.
#[derive(Debug, Clone)]
pub struct RenderedSourceConfig {
    pub name: String,
    pub base_url: String,
    pub search_path: String,
    pub query_param: String,
    pub location_param: String,
    pub offset_param: String,
    /// Results per page; the offset of page `n` is `n × page_size`.
    pub page_size: u32,
    pub selectors: CardSelectors,
    /// When set, each posting's page is fetched and the text under this
    /// selector replaces the card's truncated description.
    pub detail_description: Option<String>,
    pub force_render: bool,
}

impl RenderedSourceConfig {
    /// Indeed India.
    pub fn indeed() -> Self {
        Self {
            name: "indeed".to_string(),
            base_url: "https://www.indeed.co.in".to_string(),
            search_path: "/jobs".to_string(),
            query_param: "q".to_string(),
            location_param: "l".to_string(),
            offset_param: "start".to_string(),
            page_size: 10,
            selectors: CardSelectors {
                card: ".job_seen_beacon".to_string(),
                title: ".jobTitle".to_string(),
                company: ".companyName".to_string(),
                location: ".companyLocation".to_string(),
                salary: ".salary-snippet".to_string(),
                description: ".job-snippet".to_string(),
                link: ".jobTitle a".to_string(),
            },
            detail_description: None,
            force_render: true,
        }
    }

    pub fn with_detail_description(mut self, selector: impl Into<String>) -> Self {
        self.detail_description = Some(selector.into());
        self
    }

    /// Search URL for zero-based `page`.
    pub fn search_url(&self, query: &SearchQuery, page: u32) -> Result<Url, AppError> {
        build_url(
            &format!("{}{}", self.base_url.trim_end_matches('/'), self.search_path),
            &[
                (self.query_param.clone(), query.query.clone()),
                (self.location_param.clone(), query.location.clone()),
                (self.offset_param.clone(), (page * self.page_size).to_string()),
            ],
        )
    }
}

struct CompiledSelectors {
    card: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    salary: Selector,
    description: Selector,
    link: Selector,
    detail: Option<Selector>,
}

fn compile(selector: &str) -> Result<Selector, AppError> {
    Selector::parse(selector)
        .map_err(|e| AppError::ConfigError(format!("Invalid selector '{selector}': {e}")))
}

/// Scrapes paginated search results from a rendered job board.
pub struct RenderedPageAdapter<H, R>
where
    H: HttpClient,
    R: PageRenderer,
{
    config: RenderedSourceConfig,
    selectors: CompiledSelectors,
    fetch: FetchClient<H, R>,
}

impl<H, R> RenderedPageAdapter<H, R>
where
    H: HttpClient,
    R: PageRenderer,
{
    pub fn new(config: RenderedSourceConfig, fetch: FetchClient<H, R>) -> Result<Self, AppError> {
        let s = &config.selectors;
        let selectors = CompiledSelectors {
            card: compile(&s.card)?,
            title: compile(&s.title)?,
            company: compile(&s.company)?,
            location: compile(&s.location)?,
            salary: compile(&s.salary)?,
            description: compile(&s.description)?,
            link: compile(&s.link)?,
            detail: config.detail_description.as_deref().map(compile).transpose()?,
        };
        Ok(Self {
            config,
            selectors,
            fetch,
        })
    }

    pub fn config(&self) -> &RenderedSourceConfig {
        &self.config
    }

    fn extract_cards(&self, doc: &Html) -> Vec<ScrapedCard> {
        let base = Url::parse(&self.config.base_url).ok();
        doc.select(&self.selectors.card)
            .map(|card| {
                let href = card
                    .select(&self.selectors.link)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .unwrap_or_default();
                let url = match &base {
                    Some(base) if !href.is_empty() => base
                        .join(href)
                        .map(|u| u.to_string())
                        .unwrap_or_else(|_| href.to_string()),
                    _ => href.to_string(),
                };
                ScrapedCard {
                    title: text_of(&card, &self.selectors.title),
                    company: text_of(&card, &self.selectors.company),
                    location: text_of(&card, &self.selectors.location),
                    salary: text_of(&card, &self.selectors.salary),
                    description: text_of(&card, &self.selectors.description),
                    url,
                }
            })
            .collect()
    }

    /// Replace the card's snippet with the posting's full description.
    async fn expand_description(&self, card: &mut ScrapedCard) {
        let Some(detail) = &self.selectors.detail else {
            return;
        };
        if card.url.is_empty() {
            return;
        }
        let full = match self.fetch.fetch_page(&card.url, None, false).await {
            Ok(doc) => doc
                .select(detail)
                .next()
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                .unwrap_or_default(),
            Err(e) => {
                tracing::debug!(
                    source = %self.config.name,
                    url = %card.url,
                    error = %e,
                    "Detail page unavailable"
                );
                return;
            }
        };
        if full.len() > card.description.len() {
            card.description = full;
        }
    }

    async fn scrape_page(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> Result<Vec<JobListing>, AppError> {
        let url = self.config.search_url(query, page)?;
        // `Html` is not `Send`; drop it before the next await.
        let cards = {
            let doc = self
                .fetch
                .fetch_page(
                    url.as_str(),
                    Some(&self.config.selectors.card),
                    self.config.force_render,
                )
                .await?;
            self.extract_cards(&doc)
        };

        let mut listings = Vec::with_capacity(cards.len());
        for mut card in cards {
            self.expand_description(&mut card).await;
            if card.title.trim().is_empty() || card.description.trim().is_empty() {
                continue;
            }
            listings.push(self.fetch.normalize_job(RawListing::Scraped(card)));
        }
        Ok(listings)
    }
}

impl<H, R> SourceAdapter for RenderedPageAdapter<H, R>
where
    H: HttpClient,
    R: PageRenderer,
{
    fn name(&self) -> &str {
        &self.config.name
    }

    fn scrape<'a>(
        &'a self,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, Result<Vec<JobListing>, AppError>> {
        Box::pin(async move {
            let mut jobs = Vec::new();
            for page in 0..query.pages {
                match self.scrape_page(query, page).await {
                    Ok(listings) => {
                        tracing::info!(
                            source = %self.config.name,
                            page,
                            count = listings.len(),
                            "Scraped page"
                        );
                        jobs.extend(listings);
                    }
                    Err(e) => {
                        tracing::warn!(source = %self.config.name, page, error = %e, "Page failed");
                    }
                }
            }
            Ok(jobs)
        })
    }
}

fn text_of(card: &ElementRef<'_>, selector: &Selector) -> String {
    card.select(selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use canopy_core::normalize::Normalizer;
    use canopy_core::rate_limit::{RateLimitConfig, RateLimiter};
    use canopy_core::skills::SkillTable;
    use canopy_core::testutil::{MockHttp, MockRenderer};
    use canopy_core::traits::HttpResponse;

    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="job_seen_beacon">
            <h2 class="jobTitle"><a href="/viewjob?jk=1">Full Stack Developer</a></h2>
            <span class="companyName">Acme</span>
            <div class="companyLocation">Pune, Maharashtra</div>
            <div class="salary-snippet">₹6,00,000 - ₹9,00,000 a year</div>
            <div class="job-snippet">React and Node.js on AWS…</div>
          </div>
          <div class="job_seen_beacon">
            <h2 class="jobTitle"><a href="/viewjob?jk=2">Backend Engineer</a></h2>
            <span class="companyName">Globex</span>
            <div class="companyLocation">Remote</div>
            <div class="job-snippet">  Python,
               PostgreSQL  </div>
          </div>
          <div class="job_seen_beacon">
            <h2 class="jobTitle"><a href="/viewjob?jk=3">No Description</a></h2>
          </div>
        </body></html>
    "#;

    fn fetch(http: MockHttp, renderer: MockRenderer) -> FetchClient<MockHttp, MockRenderer> {
        FetchClient::new(
            "indeed",
            http,
            renderer,
            RateLimiter::new("indeed", RateLimitConfig::new(100, Duration::from_secs(60))),
            Normalizer::new(Arc::new(SkillTable::bundled().unwrap())),
        )
    }

    #[test]
    fn test_search_url_pages_by_offset() {
        let config = RenderedSourceConfig::indeed();
        let query = SearchQuery::new("Full Stack Developer", "India", 2);
        assert_eq!(
            config.search_url(&query, 1).unwrap().as_str(),
            "https://www.indeed.co.in/jobs?q=Full+Stack+Developer&l=India&start=10"
        );
    }

    #[tokio::test]
    async fn test_scrapes_cards_from_rendered_pages() {
        let renderer = MockRenderer::with_pages(vec![
            Ok(RESULTS_PAGE.to_string()),
            Ok(RESULTS_PAGE.to_string()),
        ]);
        let adapter = RenderedPageAdapter::new(
            RenderedSourceConfig::indeed(),
            fetch(MockHttp::default(), renderer.clone()),
        )
        .unwrap();

        let query = SearchQuery::new("Full Stack Developer", "India", 2);
        let jobs = adapter.scrape(&query).await.unwrap();

        assert_eq!(jobs.len(), 4);
        let first = &jobs[0];
        assert_eq!(first.title, "Full Stack Developer");
        assert_eq!(first.company, "Acme");
        assert_eq!(first.location, "Pune, Maharashtra");
        assert_eq!(first.url, "https://www.indeed.co.in/viewjob?jk=1");
        assert_eq!(first.source, "indeed");
        assert_eq!(first.skills, vec!["react", "node.js", "aws"]);
        assert_eq!(jobs[1].description, "Python, PostgreSQL");

        let rendered = renderer.rendered_urls();
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].ends_with("start=0"));
        assert!(rendered[1].ends_with("start=10"));
    }

    #[tokio::test]
    async fn test_failed_page_is_skipped() {
        let renderer = MockRenderer::with_pages(vec![
            Err(AppError::RenderError("navigation timeout".into())),
            Ok(RESULTS_PAGE.to_string()),
        ]);
        let adapter = RenderedPageAdapter::new(
            RenderedSourceConfig::indeed(),
            fetch(MockHttp::default(), renderer),
        )
        .unwrap();

        let jobs = adapter
            .scrape(&SearchQuery::new("dev", "India", 2))
            .await
            .unwrap();
        assert_eq!(jobs.len(), 2);
    }

    #[tokio::test]
    async fn test_detail_page_replaces_snippet() {
        let renderer = MockRenderer::with_pages(vec![Ok(RESULTS_PAGE.to_string())]);
        let http = MockHttp::with_responses(vec![
            Ok(HttpResponse::ok(
                r#"<div id="jobDescriptionText">Full description: React, Node.js, Docker and Kubernetes.</div>"#,
            )),
            Ok(HttpResponse {
                status: 404,
                body: String::new(),
            }),
        ]);
        let adapter = RenderedPageAdapter::new(
            RenderedSourceConfig::indeed().with_detail_description("#jobDescriptionText"),
            fetch(http.clone(), renderer),
        )
        .unwrap();

        let jobs = adapter.scrape(&SearchQuery::simple("dev")).await.unwrap();

        assert!(jobs[0].description.starts_with("Full description"));
        assert!(jobs[0].skills.contains(&"kubernetes".to_string()));
        assert_eq!(jobs[1].description, "Python, PostgreSQL");
        assert_eq!(http.requests()[0].url, "https://www.indeed.co.in/viewjob?jk=1");
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let mut config = RenderedSourceConfig::indeed();
        config.selectors.card = "[[".to_string();
        let result =
            RenderedPageAdapter::new(config, fetch(MockHttp::default(), MockRenderer::default()));
        assert!(matches!(result.err(), Some(AppError::ConfigError(_))));
    }
}
