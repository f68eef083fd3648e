//! Search pipeline: cache check, backend invocation, validation, retry.
//!
//! Each call to [`SearchOrchestrator::search`] walks a small state machine:
//!
//! ```text
//! CacheCheck -> Invoke -> (Validate) -> Done | Failed
//!                 ^  |         |
//!                 +--+---------+   (timeout / invalid result, with backoff)
//! ```
//!
//! Timeouts and validation failures draw on separate retry budgets, each
//! bounded by `max_retries`. Process failures and malformed output are never
//! retried. Terminal conditions come back as a [`SearchResult`] with
//! `success: false`; nothing here returns an `Err`.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::analytics::AnalyticsRecorder;
use crate::backend::{BackendError, SearchBackend, build_prompt};
use crate::cache::SearchCache;
use crate::result::{SearchDebug, SearchResult};
use crate::validator::{self, ValidationThresholds};

/// Default per-invocation backend timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Retry behaviour for a single search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Re-invoke the backend when validation fails.
    pub retry_on_fail: bool,
    /// Retry budget, applied separately to timeouts and validation failures.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { retry_on_fail: false, max_retries: 2 }
    }
}

/// Parameters of one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub model: String,
    pub use_cache: bool,
    /// Validate backend results against these thresholds when set.
    pub validation: Option<ValidationThresholds>,
    pub retry: RetryPolicy,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            model: DEFAULT_MODEL.to_string(),
            use_cache: true,
            validation: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn validate(mut self, thresholds: ValidationThresholds) -> Self {
        self.validation = Some(thresholds);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

enum Stage {
    CacheCheck,
    Invoke,
    Validate(SearchResult),
    Done(SearchResult),
    Failed(String),
}

#[derive(Debug, Default)]
struct Attempts {
    invocations: u32,
    timeout_retries: u32,
    validation_retries: u32,
}

/// Backoff before the n-th retry of a kind: 2^n seconds.
fn backoff(retry: u32) -> Duration {
    Duration::from_secs(1u64 << retry.min(16))
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Parse raw backend output into a result.
fn parse_response(bytes: &[u8]) -> Result<SearchResult, BackendError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
    if !value.is_object() {
        return Err(BackendError::MalformedResponse("expected a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|e| BackendError::MalformedResponse(e.to_string()))
}

/// Ties the cache, backend, validator and analytics into one pipeline.
pub struct SearchOrchestrator<B> {
    backend: B,
    cache: SearchCache,
    analytics: AnalyticsRecorder,
    timeout: Duration,
}

impl<B: SearchBackend> SearchOrchestrator<B> {
    pub fn new(backend: B, cache: SearchCache, analytics: AnalyticsRecorder) -> Self {
        Self { backend, cache, analytics, timeout: DEFAULT_TIMEOUT }
    }

    /// Override the per-invocation backend timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    pub fn analytics(&self) -> &AnalyticsRecorder {
        &self.analytics
    }

    /// Run one search to completion.
    ///
    /// Blocks the calling task through backend invocations and backoff
    /// sleeps. Storage errors are logged and do not fail the search.
    pub async fn search(&mut self, req: &SearchRequest) -> SearchResult {
        if req.query.trim().is_empty() {
            return SearchResult::failure(&req.query, "Search failed: query cannot be empty");
        }

        let started = Instant::now();
        let mut attempts = Attempts::default();
        let mut stage = if req.use_cache { Stage::CacheCheck } else { Stage::Invoke };

        loop {
            stage = match stage {
                Stage::CacheCheck => match self.cache.get(&req.query, &req.model).await {
                    Ok(Some(cached)) => return self.serve_cached(req, cached, started).await,
                    Ok(None) => {
                        tracing::debug!(query = %req.query, "cache miss");
                        Stage::Invoke
                    }
                    Err(e) => {
                        tracing::warn!("cache lookup failed, treating as miss: {}", e);
                        Stage::Invoke
                    }
                },
                Stage::Invoke => self.invoke(req, &mut attempts).await,
                Stage::Validate(result) => Self::validate(req, result, &mut attempts).await,
                Stage::Done(result) => return self.finish(req, result, started, &attempts).await,
                Stage::Failed(error) => {
                    tracing::warn!(query = %req.query, attempts = attempts.invocations, "search failed: {}", error);
                    return SearchResult::failure(&req.query, error);
                }
            };
        }
    }

    async fn serve_cached(&mut self, req: &SearchRequest, mut cached: SearchResult, started: Instant) -> SearchResult {
        tracing::debug!(query = %req.query, "cache hit");
        let latency_ms = elapsed_ms(started);
        if let Err(e) = self.analytics.log_search(&req.query, true, latency_ms, None, true).await {
            tracing::warn!("failed to record analytics: {}", e);
        }
        cached.debug = Some(SearchDebug { cache_hit: true, latency_ms, attempts: 0 });
        cached
    }

    async fn invoke(&self, req: &SearchRequest, attempts: &mut Attempts) -> Stage {
        attempts.invocations += 1;
        let prompt = build_prompt(&req.query);
        tracing::debug!(attempt = attempts.invocations, model = %req.model, "invoking search backend");

        let outcome = self
            .backend
            .invoke(&prompt, &req.model, self.timeout)
            .await
            .and_then(|bytes| parse_response(&bytes));

        match outcome {
            Ok(mut result) => {
                result.query = req.query.clone();
                result.model = req.model.clone();
                result.success = true;
                result.citations = validator::extract_citations(&result);
                if req.validation.is_some() { Stage::Validate(result) } else { Stage::Done(result) }
            }
            Err(BackendError::Timeout(_)) if attempts.timeout_retries < req.retry.max_retries => {
                attempts.timeout_retries += 1;
                let delay = backoff(attempts.timeout_retries);
                tracing::warn!(
                    "search timed out, retrying ({}/{}) in {:?}",
                    attempts.timeout_retries,
                    req.retry.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
                Stage::Invoke
            }
            Err(BackendError::Timeout(_)) => Stage::Failed(format!(
                "Search timeout after {} attempts ({}s each)",
                attempts.timeout_retries + 1,
                self.timeout.as_secs()
            )),
            Err(e) => Stage::Failed(format!("Search failed: {e}")),
        }
    }

    async fn validate(req: &SearchRequest, mut result: SearchResult, attempts: &mut Attempts) -> Stage {
        let Some(thresholds) = req.validation else {
            return Stage::Done(result);
        };

        let validation = validator::validate(&result, &req.query, &thresholds);
        let retry = !validation.valid
            && req.retry.retry_on_fail
            && attempts.validation_retries < req.retry.max_retries;

        if retry {
            attempts.validation_retries += 1;
            let delay = backoff(attempts.validation_retries);
            tracing::warn!(
                "validation failed: {}. Retrying ({}/{}) in {:?}",
                validation.message,
                attempts.validation_retries,
                req.retry.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
            return Stage::Invoke;
        }

        if !validation.valid {
            tracing::warn!("validation failed: {}", validation.message);
        }
        result.validation = Some(validation);
        Stage::Done(result)
    }

    async fn finish(
        &mut self, req: &SearchRequest, mut result: SearchResult, started: Instant, attempts: &Attempts,
    ) -> SearchResult {
        if req.use_cache
            && let Err(e) = self.cache.set(&req.query, &req.model, &result).await
        {
            tracing::warn!("failed to cache search result: {}", e);
        }

        let latency_ms = elapsed_ms(started);
        let (quality, valid) = match &result.validation {
            Some(v) => (Some(v.quality), v.valid),
            None => (None, true),
        };
        if let Err(e) = self.analytics.log_search(&req.query, false, latency_ms, quality, valid).await {
            tracing::warn!("failed to record analytics: {}", e);
        }

        result.debug = Some(SearchDebug { cache_hit: false, latency_ms, attempts: attempts.invocations });
        result
    }
}
