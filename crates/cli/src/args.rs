//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use gsearch_core::{RetryPolicy, SearchRequest, ValidationThresholds};

/// Gemini web search with caching and validation
#[derive(Debug, Parser)]
#[command(name = "gemini-search", version, about)]
pub struct Cli {
    /// Search query
    pub query: Option<String>,

    /// Model identifier (defaults to the configured model)
    #[arg(long)]
    pub model: Option<String>,

    /// Disable cache
    #[arg(long)]
    pub no_cache: bool,

    /// Validate and score results
    #[arg(long)]
    pub validate: bool,

    /// Minimum quality score for a valid result
    #[arg(long, default_value_t = 0.6)]
    pub min_quality: f64,

    /// Minimum number of citations for a valid result
    #[arg(long, default_value_t = 2)]
    pub min_citations: usize,

    /// Minimum query relevance for a valid result
    #[arg(long, default_value_t = 0.5)]
    pub min_relevance: f64,

    /// Re-run the search when validation fails
    #[arg(long)]
    pub retry_on_fail: bool,

    /// Retry budget for timeouts and validation failures
    #[arg(long, default_value_t = 2)]
    pub max_retries: u32,

    /// Print cumulative analytics and exit
    #[arg(long)]
    pub show_analytics: bool,

    /// Clear the search cache and exit
    #[arg(long)]
    pub clear_cache: bool,

    /// Write results to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// What a single run of the binary does.
#[derive(Debug, PartialEq)]
pub enum Action {
    ClearCache,
    ShowAnalytics,
    Search(SearchRequest),
    Help,
}

impl Cli {
    /// Resolve flags into an action. Cache clearing wins over analytics,
    /// which wins over searching.
    pub fn action(&self, default_model: &str) -> Action {
        if self.clear_cache {
            return Action::ClearCache;
        }
        if self.show_analytics {
            return Action::ShowAnalytics;
        }
        let Some(query) = &self.query else {
            return Action::Help;
        };

        let mut request = SearchRequest::new(query.clone())
            .model(self.model.as_deref().unwrap_or(default_model))
            .use_cache(!self.no_cache)
            .retry(RetryPolicy { retry_on_fail: self.retry_on_fail, max_retries: self.max_retries });

        if self.validate {
            request = request.validate(ValidationThresholds {
                min_quality: self.min_quality,
                min_citations: self.min_citations,
                min_relevance: self.min_relevance,
            });
        }

        Action::Search(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gemini-search").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let Action::Search(req) = parse(&["rust traits"]).action("gemini-2.5-flash") else {
            panic!("expected search");
        };
        assert_eq!(req.query, "rust traits");
        assert_eq!(req.model, "gemini-2.5-flash");
        assert!(req.use_cache);
        assert!(req.validation.is_none());
        assert_eq!(req.retry, RetryPolicy { retry_on_fail: false, max_retries: 2 });
    }

    #[test]
    fn test_validation_flags() {
        let cli = parse(&[
            "rust traits",
            "--model",
            "gemini-2.5-pro",
            "--no-cache",
            "--validate",
            "--min-quality",
            "0.7",
            "--min-citations",
            "3",
            "--min-relevance",
            "0.4",
            "--retry-on-fail",
            "--max-retries",
            "4",
        ]);
        let Action::Search(req) = cli.action("gemini-2.5-flash") else {
            panic!("expected search");
        };
        assert_eq!(req.model, "gemini-2.5-pro");
        assert!(!req.use_cache);
        assert_eq!(
            req.validation,
            Some(ValidationThresholds { min_quality: 0.7, min_citations: 3, min_relevance: 0.4 })
        );
        assert_eq!(req.retry, RetryPolicy { retry_on_fail: true, max_retries: 4 });
    }

    #[test]
    fn test_actions_without_query() {
        assert_eq!(parse(&[]).action("m"), Action::Help);
        assert_eq!(parse(&["--clear-cache"]).action("m"), Action::ClearCache);
        assert_eq!(parse(&["--show-analytics"]).action("m"), Action::ShowAnalytics);
        assert_eq!(parse(&["q", "--clear-cache", "--show-analytics"]).action("m"), Action::ClearCache);
    }

    #[test]
    fn test_output_and_verbosity() {
        let cli = parse(&["q", "--output", "out.json", "-vv"]);
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
        assert_eq!(cli.verbose, 2);
    }
}
