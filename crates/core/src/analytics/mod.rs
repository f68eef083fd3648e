//! Running search statistics persisted across process runs.
//!
//! The recorder owns the state and rewrites it in full through its
//! [`AnalyticsStore`] after every logged search.

pub mod store;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

pub use store::{AnalyticsStore, JsonFileStore, MemoryStore};

/// One logged search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogRecord {
    pub query: String,
    /// Written as RFC 3339. Records without an offset are read as UTC.
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub cached: bool,
    pub latency_ms: f64,
    pub quality: Option<f64>,
    pub valid: bool,
}

mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>()
            .map(|naive| naive.and_utc())
            .map_err(|e| D::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }
}

/// Cumulative analytics. Grows monotonically and is never pruned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsState {
    pub total_searches: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub avg_latency_ms: f64,
    pub quality_scores: Vec<f64>,
    pub failed_validations: u64,
    pub queries: Vec<QueryLogRecord>,
}

impl AnalyticsState {
    /// `cache_hits / total_searches`, or 0.0 before any search.
    pub fn cache_hit_rate(&self) -> f64 {
        if self.total_searches == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / self.total_searches as f64
    }

    /// Mean of recorded quality scores, or 0.0 if none.
    pub fn avg_quality(&self) -> f64 {
        if self.quality_scores.is_empty() {
            return 0.0;
        }
        self.quality_scores.iter().sum::<f64>() / self.quality_scores.len() as f64
    }
}

/// Headline numbers for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_searches: u64,
    pub cache_hit_rate: f64,
    pub avg_quality: f64,
    pub avg_latency_ms: f64,
    pub failed_validations: u64,
}

impl fmt::Display for AnalyticsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total searches: {}", self.total_searches)?;
        writeln!(f, "Cache hit rate: {:.1}%", self.cache_hit_rate * 100.0)?;
        writeln!(f, "Avg quality: {:.2}", self.avg_quality)?;
        writeln!(f, "Avg latency: {:.0}ms", self.avg_latency_ms)?;
        write!(f, "Failed validations: {}", self.failed_validations)
    }
}

/// Records search outcomes and persists the running totals.
pub struct AnalyticsRecorder {
    state: AnalyticsState,
    store: Arc<dyn AnalyticsStore>,
}

impl fmt::Debug for AnalyticsRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsRecorder").field("state", &self.state).finish_non_exhaustive()
    }
}

impl AnalyticsRecorder {
    /// Load the persisted state once, or start from zero.
    pub async fn load(store: Arc<dyn AnalyticsStore>) -> Result<Self, Error> {
        let state = store.load().await?;
        tracing::debug!(total_searches = state.total_searches, "loaded analytics state");
        Ok(Self { state, store })
    }

    /// Start from a zeroed state that is kept in memory only.
    pub fn in_memory() -> Self {
        Self { state: AnalyticsState::default(), store: Arc::new(MemoryStore::new()) }
    }

    /// Record one search and persist the whole state.
    ///
    /// The latency mean is updated incrementally; every call adds exactly one
    /// search, so the running average stays exact.
    pub async fn log_search(
        &mut self, query: &str, cached: bool, latency_ms: f64, quality: Option<f64>, valid: bool,
    ) -> Result<(), Error> {
        let state = &mut self.state;
        state.total_searches += 1;

        if cached {
            state.cache_hits += 1;
        } else {
            state.cache_misses += 1;
        }

        let n = state.total_searches as f64;
        state.avg_latency_ms = (state.avg_latency_ms * (n - 1.0) + latency_ms) / n;

        if let Some(quality) = quality {
            state.quality_scores.push(quality);
        }

        if !valid {
            state.failed_validations += 1;
        }

        state.queries.push(QueryLogRecord {
            query: query.to_string(),
            timestamp: Utc::now(),
            cached,
            latency_ms,
            quality,
            valid,
        });

        self.store.save(&self.state).await
    }

    pub fn state(&self) -> &AnalyticsState {
        &self.state
    }

    pub fn cache_hit_rate(&self) -> f64 {
        self.state.cache_hit_rate()
    }

    pub fn avg_quality(&self) -> f64 {
        self.state.avg_quality()
    }

    pub fn summary(&self) -> AnalyticsSummary {
        AnalyticsSummary {
            total_searches: self.state.total_searches,
            cache_hit_rate: self.cache_hit_rate(),
            avg_quality: self.avg_quality(),
            avg_latency_ms: self.state.avg_latency_ms,
            failed_validations: self.state.failed_validations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn recorder() -> (AnalyticsRecorder, MemoryStore) {
        let store = MemoryStore::new();
        let recorder = AnalyticsRecorder::load(Arc::new(store.clone())).await.unwrap();
        (recorder, store)
    }

    #[tokio::test]
    async fn test_empty_state() {
        let (recorder, store) = recorder().await;
        assert_eq!(recorder.state(), &AnalyticsState::default());
        assert_eq!(recorder.cache_hit_rate(), 0.0);
        assert_eq!(recorder.avg_quality(), 0.0);
        assert!(store.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_running_average_latency() {
        let (mut recorder, _) = recorder().await;
        for latency in [100.0, 200.0, 300.0] {
            recorder.log_search("q", false, latency, None, true).await.unwrap();
        }
        assert_eq!(recorder.state().avg_latency_ms, 200.0);
    }

    #[tokio::test]
    async fn test_counters_and_persistence() {
        let (mut recorder, store) = recorder().await;
        recorder.log_search("rust", true, 2.0, None, true).await.unwrap();
        recorder.log_search("go", false, 900.0, Some(0.8), true).await.unwrap();
        recorder.log_search("zig", false, 1100.0, Some(0.4), false).await.unwrap();

        let state = recorder.state();
        assert_eq!(state.total_searches, 3);
        assert_eq!(state.cache_hits, 1);
        assert_eq!(state.cache_misses, 2);
        assert_eq!(state.failed_validations, 1);
        assert_eq!(state.quality_scores, vec![0.8, 0.4]);
        assert_eq!(state.queries.len(), 3);
        assert_eq!(state.queries[2].query, "zig");
        assert!(!state.queries[2].valid);
        assert_eq!(state.queries[0].quality, None);

        assert!((recorder.cache_hit_rate() - 1.0 / 3.0).abs() < 1e-12);
        assert!((recorder.avg_quality() - 0.6).abs() < 1e-12);

        assert_eq!(store.snapshot().as_ref(), Some(recorder.state()));
    }

    #[tokio::test]
    async fn test_resumes_from_persisted_state() {
        let prior = AnalyticsState {
            total_searches: 1,
            cache_misses: 1,
            avg_latency_ms: 100.0,
            ..Default::default()
        };
        let store = MemoryStore::with_state(prior);
        let mut recorder = AnalyticsRecorder::load(Arc::new(store.clone())).await.unwrap();

        recorder.log_search("again", true, 300.0, None, true).await.unwrap();

        let saved = store.snapshot().unwrap();
        assert_eq!(saved.total_searches, 2);
        assert_eq!(saved.cache_hits, 1);
        assert_eq!(saved.avg_latency_ms, 200.0);
    }

    #[tokio::test]
    async fn test_file_store_round_trip_through_recorder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search_analytics.json");

        let mut recorder = AnalyticsRecorder::load(Arc::new(JsonFileStore::new(&path))).await.unwrap();
        recorder.log_search("rust", false, 50.0, Some(0.9), true).await.unwrap();

        let reloaded = AnalyticsRecorder::load(Arc::new(JsonFileStore::new(&path))).await.unwrap();
        assert_eq!(reloaded.state(), recorder.state());

        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["total_searches"], 1);
        assert_eq!(raw["queries"][0]["query"], "rust");
    }

    #[tokio::test]
    async fn test_in_memory_recorder_starts_empty() {
        let mut recorder = AnalyticsRecorder::in_memory();
        assert_eq!(recorder.state(), &AnalyticsState::default());

        recorder.log_search("rust", false, 40.0, None, true).await.unwrap();
        assert_eq!(recorder.state().total_searches, 1);
    }

    #[test]
    fn test_summary_display() {
        let summary = AnalyticsSummary {
            total_searches: 4,
            cache_hit_rate: 0.25,
            avg_quality: 0.756,
            avg_latency_ms: 1234.4,
            failed_validations: 1,
        };
        let text = summary.to_string();
        assert!(text.contains("Total searches: 4"));
        assert!(text.contains("Cache hit rate: 25.0%"));
        assert!(text.contains("Avg quality: 0.76"));
        assert!(text.contains("Avg latency: 1234ms"));
        assert!(text.contains("Failed validations: 1"));
    }
}
