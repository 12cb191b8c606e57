//! Scrapes one Indeed result page through Chromium and the card selectors.
//!
//! Fails when the page renders but no card matches, which usually means the
//! selectors in `RenderedSourceConfig::indeed()` have drifted.
//!
//! Run with: cargo run -p canopy-client --example browser_smoke --features browser

use std::sync::Arc;

use canopy_client::{RenderedPageAdapter, RenderedSourceConfig, open_session};
use canopy_core::config::PipelineConfig;
use canopy_core::models::SearchQuery;
use canopy_core::skills::SkillTable;
use canopy_core::traits::SourceAdapter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("canopy_client=debug,canopy_core=debug")
        .init();

    let config = PipelineConfig::default();
    let session = open_session(&config, Arc::new(SkillTable::bundled()?))?;

    let indeed = RenderedSourceConfig::indeed();
    let fetch = session.fetch_client(&indeed.name, config.fetch_limits.clone());
    let adapter = RenderedPageAdapter::new(indeed, fetch)?;

    let query = SearchQuery::new("Rust Developer", "India", 1);
    let scraped = adapter.scrape(&query).await;
    session.close().await?;
    let jobs = scraped?;

    anyhow::ensure!(!jobs.is_empty(), "no job cards matched on the first page");
    println!("{} listings from {}", jobs.len(), adapter.name());
    for job in jobs.iter().take(3) {
        println!(
            "- {} @ {} ({}) skills={:?}",
            job.title, job.company, job.location, job.skills
        );
    }
    Ok(())
}
