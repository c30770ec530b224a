//! State manager implementation
//!
//! Loads the state handed in by the caller and optionally persists the
//! latest checkpoint to a file with atomic writes.

use super::types::State;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State manager for loading and persisting state
#[derive(Debug)]
pub struct StateManager {
    /// Path the checkpoint is written to (empty for in-memory mode)
    path: PathBuf,
    /// Current state (cached)
    state: Arc<RwLock<State>>,
}

impl StateManager {
    /// Create a manager that persists to `path`, starting from empty state
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Arc::new(RwLock::new(State::new())),
        }
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::with_state(State::new())
    }

    /// Create an in-memory manager holding `state`
    pub fn with_state(state: State) -> Self {
        Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Load state from a file; a missing file means empty state
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse_state(&contents)?
        } else {
            State::new()
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Create a manager from an inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::with_state(parse_state(json)?))
    }

    /// Persist to `path` from now on
    #[must_use]
    pub fn persist_to(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Write the current state to the configured file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }
        self.save_to_file(&self.path).await
    }

    /// Write the current state to a specific path
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.to_json_pretty().await?;

        // Write to temp file first, then rename for atomicity
        let path = path.as_ref();
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }

    /// Clone of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Replace the cached state and persist it
    pub async fn checkpoint(&self, state: State) -> Result<()> {
        *self.state.write().await = state;
        self.save().await
    }

    /// Export state as a compact JSON string
    pub async fn to_json(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Export state as a pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string_pretty(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// The state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

fn parse_state(contents: &str) -> Result<State> {
    if contents.trim().is_empty() {
        return Ok(State::new());
    }
    serde_json::from_str(contents).map_err(|e| Error::state(format!("Failed to parse state: {e}")))
}
