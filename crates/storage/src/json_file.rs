//! Rotation state persisted as a single JSON file.
//!
//! Writes go to a sibling `.tmp` file that is synced and then renamed over the
//! target, so a crash mid-write leaves the previous record intact.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pipeline::{RotationState, StateStore, StateStoreError, VARIATIONS_PER_ARTICLE};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// [`StateStore`] backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(&self, source: std::io::Error) -> StateStoreError {
        StateStoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn corrupt(&self, message: impl Into<String>) -> StateStoreError {
        StateStoreError::Corrupt {
            path: self.path.display().to_string(),
            message: message.into(),
        }
    }

    /// Rejects records that decode but could never have been written by a run.
    fn check_pointer(&self, state: &RotationState) -> Result<(), StateStoreError> {
        if state.current_article.get() == 0 {
            return Err(self.corrupt("current_article must be at least 1"));
        }
        let variation = state.current_variation.get();
        if variation == 0 || variation > VARIATIONS_PER_ARTICLE {
            return Err(self.corrupt(format!(
                "current_variation {variation} is outside 1..={VARIATIONS_PER_ARTICLE}"
            )));
        }
        Ok(())
    }

    async fn write_replacing(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                warn!(path = %temp.display(), error = %cleanup, "Could not remove temporary state file");
            }
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn load(&self) -> Result<RotationState, StateStoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No state record yet; starting from article #1 variation 1");
                return Ok(RotationState::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let state: RotationState =
            serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e.to_string()))?;
        self.check_pointer(&state)?;

        debug!(
            path = %self.path.display(),
            pointer = %state.pointer(),
            articles = state.articles_cache.len(),
            analyses = state.analysis_cache.len(),
            "State record loaded"
        );
        Ok(state)
    }

    async fn save(&self, state: &RotationState) -> Result<(), StateStoreError> {
        let bytes = serde_json::to_vec_pretty(state)?;
        self.write_replacing(&bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "State record saved");
        Ok(())
    }
}
