//! Core types and shared functionality for gemini-search.
//!
//! This crate provides:
//! - TTL search cache with SQLite backend
//! - Result validation and quality scoring
//! - Persistent search analytics
//! - The search orchestrator and the backend port it drives
//! - Configuration and unified error types

pub mod analytics;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod result;
pub mod validator;

pub use analytics::{AnalyticsRecorder, AnalyticsState, AnalyticsStore, JsonFileStore, MemoryStore};
pub use backend::{BackendError, SearchBackend};
pub use cache::SearchCache;
pub use config::{AppConfig, ConfigError, GeminiCommand};
pub use error::Error;
pub use orchestrator::{RetryPolicy, SearchOrchestrator, SearchRequest};
pub use result::{Citation, SearchResult, Validation};
pub use validator::ValidationThresholds;
