//! Search result types shared by the cache, validator and orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single web reference extracted from grounding metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: Option<String>,
    pub title: Option<String>,
    pub snippet: Option<String>,
}

/// Outcome of validating a result against quality thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    /// Quality score in `[0, 1]`.
    pub quality: f64,
    pub message: String,
}

/// Cache and latency metadata attached to a returned result.
///
/// Never persisted with the cached payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDebug {
    pub cache_hit: bool,
    pub latency_ms: f64,
    /// Backend invocations made for this search (0 on a cache hit).
    pub attempts: u32,
}

/// A search result as returned by the backend and enriched by the orchestrator.
///
/// Fields the backend emits that are not modelled here are preserved in
/// `extra` so a cached result round-trips verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, alias = "response", skip_serializing_if = "String::is_empty")]
    pub text: String,

    #[serde(default, alias = "groundingMetadata", skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,

    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub query: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<SearchDebug>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResult {
    /// Build a terminal failure result: `{query, error, success: false}`.
    pub fn failure(query: &str, error: impl Into<String>) -> Self {
        Self { query: query.to_string(), error: Some(error.into()), success: false, ..Default::default() }
    }

    /// Whether grounding metadata is present and non-empty.
    pub fn has_grounding(&self) -> bool {
        self.grounding_metadata.as_ref().is_some_and(is_non_empty)
    }
}

/// Emptiness check for JSON values: null, false, zero and empty containers
/// all count as absent.
fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
