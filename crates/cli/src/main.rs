//! gemini-search entry point.
//!
//! Logging goes to stderr so stdout carries only the JSON result. Storage
//! and backend problems are logged; the only non-zero exit is a run with
//! neither a query nor an action.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use gsearch_client::GeminiBackend;
use gsearch_core::{
    AnalyticsRecorder, AppConfig, JsonFileStore, SearchCache, SearchOrchestrator, SearchRequest, SearchResult,
};
use tracing_subscriber::EnvFilter;

mod args;

use args::{Action, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::error!("{}; falling back to default configuration", e);
        AppConfig::default()
    });

    ExitCode::from(run(&config, &cli).await)
}

/// Execute the action selected by `cli` and return the process exit status.
async fn run(config: &AppConfig, cli: &Cli) -> u8 {
    match cli.action(&config.model) {
        Action::ClearCache => match clear_cache(config).await {
            Ok(deleted) => println!("Cache cleared ({deleted} entries)"),
            Err(e) => tracing::error!("failed to clear cache: {}", e),
        },
        Action::ShowAnalytics => println!("{}", load_analytics(config).await.summary()),
        Action::Search(request) => {
            let result = run_search(config, &request).await;
            if let Err(e) = write_result(&result, cli.output.as_deref()).await {
                tracing::error!("failed to write results: {}", e);
            }
        }
        Action::Help => {
            if let Err(e) = Cli::command().print_help() {
                tracing::error!("failed to print help: {}", e);
            }
            return 1;
        }
    }
    0
}

async fn clear_cache(config: &AppConfig) -> Result<u64> {
    let cache = SearchCache::open(config.cache_db_path(), config.cache_ttl()).await?;
    Ok(cache.clear().await?)
}

/// Load persisted analytics. An unreadable record is left untouched and
/// this run's searches are counted in memory only.
async fn load_analytics(config: &AppConfig) -> AnalyticsRecorder {
    match AnalyticsRecorder::load(Arc::new(JsonFileStore::new(&config.analytics_log))).await {
        Ok(recorder) => recorder,
        Err(e) => {
            tracing::warn!(
                "could not load analytics from {}, not recording this run: {}",
                config.analytics_log.display(),
                e
            );
            AnalyticsRecorder::in_memory()
        }
    }
}

async fn run_search(config: &AppConfig, request: &SearchRequest) -> SearchResult {
    let (cache, request) = match SearchCache::open(config.cache_db_path(), config.cache_ttl()).await {
        Ok(cache) => (cache, request.clone()),
        Err(e) => {
            tracing::warn!("cache unavailable, searching without it: {}", e);
            match SearchCache::open_in_memory(config.cache_ttl()).await {
                Ok(cache) => (cache, request.clone().use_cache(false)),
                Err(e) => return SearchResult::failure(&request.query, format!("Search failed: {e}")),
            }
        }
    };

    let backend = GeminiBackend::from_config(config).await;
    let analytics = load_analytics(config).await;

    let mut orchestrator = SearchOrchestrator::new(backend, cache, analytics).with_timeout(config.timeout());
    orchestrator.search(&request).await
}

async fn write_result(result: &SearchResult, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            println!("Results saved to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
