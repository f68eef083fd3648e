//! The external search backend, seen from the orchestrator.

use std::time::Duration;

use async_trait::async_trait;

/// Tool identifier embedded in every prompt.
pub const SEARCH_TOOL: &str = "google_web_search";

/// Errors from invoking the backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The invocation ran past its time bound. Retryable.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The process could not be started or exited non-zero. Fatal.
    #[error("{0}")]
    Process(String),

    /// The process succeeded but its output could not be parsed. Fatal.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl BackendError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout(_))
    }
}

/// Capability to run one search against the external tool.
///
/// Implementations return the raw stdout bytes; parsing is the caller's job.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn invoke(&self, prompt: &str, model: &str, timeout: Duration) -> Result<Vec<u8>, BackendError>;
}

/// Build the headless prompt requesting raw output for `query`.
pub fn build_prompt(query: &str) -> String {
    format!("/tool:{SEARCH_TOOL} query:\"{query}\" raw:true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt() {
        assert_eq!(
            build_prompt("rust async traits"),
            "/tool:google_web_search query:\"rust async traits\" raw:true"
        );
    }

    #[test]
    fn test_error_display() {
        let err = BackendError::MalformedResponse("expected value at line 1".into());
        assert_eq!(err.to_string(), "malformed response: expected value at line 1");
        assert!(BackendError::Timeout(Duration::from_secs(120)).is_timeout());
        assert!(!BackendError::Process("exit status: 1".into()).is_timeout());
    }
}
