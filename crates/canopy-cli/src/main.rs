use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use canopy_client::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use canopy_client::{OpenAiCompleter, build_manager, open_session};
use canopy_core::models::{GenerationResult, JobListing, ScrapeReport, SearchQuery};
use canopy_core::{LlmGateway, PipelineConfig, SkillTable};

#[derive(Parser)]
#[command(name = "canopy", version, about = "Job-market scraper and project idea generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape job listings and print the aggregated report as JSON
    Scrape {
        /// Search keywords (e.g. "Full Stack Developer")
        #[arg(short, long)]
        query: String,

        /// Location to search in
        #[arg(short, long, default_value = "India")]
        location: String,

        /// Result pages to fetch per source
        #[arg(
            short,
            long,
            default_value_t = 1,
            value_parser = clap::value_parser!(u32).range(1..=10)
        )]
        pages: u32,

        /// Also write the listings to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Scrape listings for a role, then generate insights and project ideas
    Ideas {
        /// Job title to generate projects for
        #[arg(short, long)]
        title: String,

        /// Location to search in
        #[arg(short, long, default_value = "India")]
        location: String,

        /// Result pages to fetch per source
        #[arg(
            short,
            long,
            default_value_t = 2,
            value_parser = clap::value_parser!(u32).range(1..=10)
        )]
        pages: u32,

        /// API key (reads from CANOPY_API_KEY env var if not provided)
        #[arg(short, long, env = "CANOPY_API_KEY")]
        api_key: String,

        /// Completion model
        #[arg(short, long, env = "CANOPY_MODEL", default_value = DEFAULT_MODEL)]
        model: String,

        /// OpenAI-compatible API base URL
        #[arg(short, long, env = "CANOPY_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("canopy=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env().context("Invalid configuration")?;
    let skills = Arc::new(
        SkillTable::load(config.skills_file.as_deref()).context("Failed to load skill table")?,
    );

    match cli.command {
        Commands::Scrape {
            query,
            location,
            pages,
            csv,
        } => {
            let query = SearchQuery::new(query, location, pages);
            let report = scrape(&config, skills, &query).await?;
            if let Some(path) = csv {
                write_csv(&path, &report.jobs)?;
                tracing::info!(path = %path.display(), count = report.jobs.len(), "CSV written");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Ideas {
            title,
            location,
            pages,
            api_key,
            model,
            base_url,
        } => {
            let query = SearchQuery::new(&title, location, pages);
            let report = scrape(&config, skills, &query).await?;

            let completer = OpenAiCompleter::with_base_url(&api_key, &model, &base_url)
                .context("Failed to create completion client")?;
            let gateway = LlmGateway::new(completer, config.gateway.clone())
                .context("Failed to create LLM gateway")?;

            tracing::info!(%model, jobs = report.jobs.len(), "Generating project ideas");
            let result = gateway.generate(&title, &report).await;
            println!("{}", serde_json::to_string_pretty(&IdeasOutput::from(result))?);
        }
    }

    Ok(())
}

/// Run one scrape in its own session and close the session afterwards.
async fn scrape(
    config: &PipelineConfig,
    skills: Arc<SkillTable>,
    query: &SearchQuery,
) -> Result<ScrapeReport> {
    let session = open_session(config, skills).context("Failed to open scrape session")?;
    let result = match build_manager(&session, config) {
        Ok(manager) => {
            tracing::info!(
                query = %query.query,
                location = %query.location,
                pages = query.pages,
                "Scraping"
            );
            manager.scrape_jobs(query).await
        }
        Err(e) => Err(e),
    };
    // Close failures are logged by the session.
    let _ = session.close().await;
    Ok(result?)
}

#[derive(Serialize)]
struct IdeasOutput {
    insights: Vec<String>,
    projects: Vec<canopy_core::ProjectIdea>,
}

impl From<GenerationResult> for IdeasOutput {
    fn from(result: GenerationResult) -> Self {
        Self {
            insights: result.insights,
            projects: result.projects,
        }
    }
}

/// Write listings as CSV with one header row.
fn write_csv(path: &Path, jobs: &[JobListing]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    writer.write_record([
        "TITLE",
        "COMPANY",
        "LOCATION",
        "SALARY",
        "SKILLS",
        "DESCRIPTION",
        "SOURCE",
    ])?;
    for job in jobs {
        writer.write_record([
            job.title.as_str(),
            job.company.as_str(),
            job.location.as_str(),
            job.salary.as_str(),
            job.skills.join(", ").as_str(),
            job.description.as_str(),
            job.source.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use canopy_core::testutil::sample_listing;
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_pages_out_of_range_rejected() {
        let parsed = Cli::try_parse_from(["canopy", "scrape", "-q", "rust", "-p", "11"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");

        let job = sample_listing("Rust Engineer", "Acme, Inc.", "Pune", &["rust", "aws"]);
        write_csv(&path, &[job]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "TITLE");
        assert_eq!(&headers[6], "SOURCE");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "Acme, Inc.");
        assert_eq!(&rows[0][4], "rust, aws");
    }
}
