mod ai;
mod cms;
mod config;
mod images;
mod ingest;
mod model;
mod parser;
mod provision;
mod scraper;
mod source;
mod taxonomy;
mod utils;

use ai::GeminiClient;
use clap::{Parser, Subcommand};
use cms::CmsClient;
use config::{load_config, AppConfig};
use images::upload_images;
use ingest::{IngestSettings, Ingestor};
use provision::provision_categories;
use crate::scraper::HttpScraper;
use source::Source;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use taxonomy::{ResolverSettings, TaxonomyIndex};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Pause between category writes while provisioning.
const PROVISION_PAUSE: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "listing-ingest", version, about = "Imports property listings into the CMS")]
struct Cli {
    /// JSON config file; missing file means defaults plus environment
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest listings from URLs, .txt/.json files or inline text
    Ingest {
        #[arg(required = true, value_name = "SOURCE")]
        sources: Vec<String>,
    },
    /// Create the canonical categories in both locales
    Provision,
    /// Upload {DOCUMENT_ID}-{n}.{ext} images from DIR and link them to the property
    UploadImages {
        #[arg(value_name = "DOCUMENT_ID")]
        document_id: String,
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic occurred: {}", panic_info);
    }));

    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let timeout = Duration::from_secs(config.request_timeout_seconds);
    let cms = match CmsClient::new(
        &config.strapi_url,
        &config.strapi_api_token,
        timeout,
        config.page_size,
        &config.default_locale,
        &config.secondary_locale,
    ) {
        Ok(cms) => cms,
        Err(e) => {
            error!("Failed to initialize CMS client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Ingest { sources } => run_ingest(&config, &cms, &sources).await,
        Command::Provision => run_provision(&config, &cms).await,
        Command::UploadImages { document_id, dir } => {
            run_upload_images(&config, &cms, &document_id, &dir).await
        }
    }
}

/// Connects to the CMS and loads the existing taxonomy in both locales.
async fn load_index(config: &AppConfig, cms: &CmsClient) -> Option<TaxonomyIndex> {
    if let Err(e) = cms.ping().await {
        error!("Cannot reach the CMS: {}", e);
        return None;
    }
    match TaxonomyIndex::load(cms, &config.default_locale, &config.secondary_locale).await {
        Ok(index) => Some(index),
        Err(e) => {
            error!("Failed to load existing categories and features: {}", e);
            None
        }
    }
}

async fn run_ingest(config: &AppConfig, cms: &CmsClient, args: &[String]) -> ExitCode {
    if let Err(e) = config.require_ai_key() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let sources = Source::collect(args);
    if sources.is_empty() {
        error!("No readable sources given");
        return ExitCode::FAILURE;
    }

    let Some(mut index) = load_index(config, cms).await else {
        return ExitCode::FAILURE;
    };
    if let Err(e) = index.ensure_provisioned() {
        error!("{}", e);
        error!("Run `listing-ingest provision` first");
        return ExitCode::FAILURE;
    }

    let timeout = Duration::from_secs(config.request_timeout_seconds);
    let scraper = match HttpScraper::new(timeout) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize scraper: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let model = match GeminiClient::new(
        &config.gemini_api_key,
        &config.gemini_model,
        &config.gemini_base_url,
        timeout,
    ) {
        Ok(m) => m,
        Err(e) => {
            error!("Failed to initialize Gemini client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut ingestor = Ingestor::new(
        &scraper,
        &model,
        cms,
        ResolverSettings::from_config(config),
        IngestSettings::from_config(config),
    );
    let report = ingestor.run(&mut index, &sources).await;
    report.log_summary();

    if report.all_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run_provision(config: &AppConfig, cms: &CmsClient) -> ExitCode {
    let Some(mut index) = load_index(config, cms).await else {
        return ExitCode::FAILURE;
    };

    info!("Creating required categories...");
    let report = provision_categories(
        cms,
        &mut index,
        &config.default_locale,
        &config.secondary_locale,
        PROVISION_PAUSE,
    )
    .await;
    report.log_summary();

    if report.is_complete() {
        info!("Category setup complete");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_upload_images(
    config: &AppConfig,
    cms: &CmsClient,
    document_id: &str,
    dir: &std::path::Path,
) -> ExitCode {
    if let Err(e) = cms.ping().await {
        error!("Cannot reach the CMS: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Uploading images for property {} from {}", document_id, dir.display());
    let result = upload_images(
        cms,
        document_id,
        dir,
        &config.default_locale,
        &config.secondary_locale,
    )
    .await;
    match result {
        Ok(report) => {
            report.log_summary();
            if report.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("Image upload failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
