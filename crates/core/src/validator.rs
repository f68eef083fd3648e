//! Citation extraction and quality scoring for search results.
//!
//! Everything here is pure: no I/O, no clock, no shared state.
//!
//! ### Quality score
//!
//! A weighted sum with each term capped independently, then the total capped at 1.0:
//!
//! - **Citations**: `min(count * 0.1, 0.3)`
//! - **Length**: `min(chars / 1000, 0.2)`
//! - **Grounding**: flat `0.2` when grounding metadata is present and non-empty
//! - **Relevance**: `relevance * 0.3`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::result::{Citation, SearchResult, Validation};

const CITATION_WEIGHT: f64 = 0.1;
const CITATION_CAP: f64 = 0.3;
const LENGTH_DIVISOR: f64 = 1000.0;
const LENGTH_CAP: f64 = 0.2;
const GROUNDING_BONUS: f64 = 0.2;
const RELEVANCE_WEIGHT: f64 = 0.3;

/// Message attached to results that pass every check.
pub const VALID_MESSAGE: &str = "Valid";

/// Minimum scores a result must reach to count as valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationThresholds {
    pub min_quality: f64,
    pub min_citations: usize,
    pub min_relevance: f64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self { min_quality: 0.6, min_citations: 2, min_relevance: 0.5 }
    }
}

/// Extract citations from `grounding_metadata.grounding_chunks`.
///
/// Chunks without a `web` object are skipped.
pub fn extract_citations(result: &SearchResult) -> Vec<Citation> {
    let Some(chunks) = result
        .grounding_metadata
        .as_ref()
        .and_then(|meta| meta.get("grounding_chunks").or_else(|| meta.get("groundingChunks")))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    chunks
        .iter()
        .filter_map(|chunk| {
            let web = chunk.get("web")?.as_object()?;
            Some(Citation {
                url: web.get("uri").and_then(Value::as_str).map(String::from),
                title: web.get("title").and_then(Value::as_str).map(String::from),
                snippet: chunk.get("snippet").and_then(Value::as_str).map(String::from),
            })
        })
        .collect()
}

/// Fraction of whitespace-separated query terms contained in the result text.
///
/// Case-insensitive substring containment, not word matching: `"rust"` matches
/// `"trusty"`. Returns 0.0 for a query with no terms.
pub fn calculate_relevance(query: &str, result: &SearchResult) -> f64 {
    let text = result.text.to_lowercase();
    let query = query.to_lowercase();
    let terms: Vec<&str> = query.split_whitespace().collect();

    if terms.is_empty() {
        return 0.0;
    }

    let matches = terms.iter().filter(|term| text.contains(*term)).count();
    (matches as f64 / terms.len() as f64).min(1.0)
}

/// Multi-factor quality score in `[0, 1]`.
pub fn score_quality(result: &SearchResult, citations: &[Citation], query: &str) -> f64 {
    let citation_score = (citations.len() as f64 * CITATION_WEIGHT).min(CITATION_CAP);
    let length_score = (result.text.chars().count() as f64 / LENGTH_DIVISOR).min(LENGTH_CAP);
    let grounding_score = if result.has_grounding() { GROUNDING_BONUS } else { 0.0 };
    let relevance_score = calculate_relevance(query, result) * RELEVANCE_WEIGHT;

    (citation_score + length_score + grounding_score + relevance_score).min(1.0)
}

/// Validate a result, failing on the first check that misses its threshold.
///
/// Checks run in order: quality, citation count, relevance.
pub fn validate(result: &SearchResult, query: &str, thresholds: &ValidationThresholds) -> Validation {
    let citations = extract_citations(result);
    let quality = score_quality(result, &citations, query);
    let relevance = calculate_relevance(query, result);

    let failure = if quality < thresholds.min_quality {
        Some(format!("Quality {quality:.2} below threshold {}", thresholds.min_quality))
    } else if citations.len() < thresholds.min_citations {
        Some(format!("Only {} citations (need {})", citations.len(), thresholds.min_citations))
    } else if relevance < thresholds.min_relevance {
        Some(format!("Low relevance {relevance:.2} (threshold {})", thresholds.min_relevance))
    } else {
        None
    };

    match failure {
        Some(message) => Validation { valid: false, quality, message },
        None => Validation { valid: true, quality, message: VALID_MESSAGE.to_string() },
    }
}
