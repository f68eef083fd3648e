//! Persistence ports for analytics state.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::AnalyticsState;
use crate::Error;

/// Storage for the whole analytics record.
///
/// `save` always receives the complete state; there are no partial updates.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// Load the persisted state, or a zeroed state if none exists.
    async fn load(&self) -> Result<AnalyticsState, Error>;

    /// Replace the persisted state.
    async fn save(&self, state: &AnalyticsState) -> Result<(), Error>;
}

/// Analytics persisted as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AnalyticsStore for JsonFileStore {
    async fn load(&self) -> Result<AnalyticsState, Error> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AnalyticsState::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, state: &AnalyticsState) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// In-process store; clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<Option<AnalyticsState>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state, as if it had been persisted earlier.
    pub fn with_state(state: AnalyticsState) -> Self {
        Self { state: Arc::new(Mutex::new(Some(state))) }
    }

    /// Last saved state, if any.
    pub fn snapshot(&self) -> Option<AnalyticsState> {
        self.state.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl AnalyticsStore for MemoryStore {
    async fn load(&self) -> Result<AnalyticsState, Error> {
        Ok(self.snapshot().unwrap_or_default())
    }

    async fn save(&self, state: &AnalyticsState) -> Result<(), Error> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| Error::Analytics("memory store lock poisoned".into()))?;
        *guard = Some(state.clone());
        Ok(())
    }
}
