//! Settings persistence behind an async key-value store seam.

use async_trait::async_trait;
use directories::ProjectDirs;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::fs;

use crate::failure::FailureKind;
use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The host that owns the store is gone (e.g. the extension was reloaded).
    #[error("extension context invalidated")]
    ContextInvalidated,
    #[error("no config directory available")]
    NoConfigDir,
    #[error("settings storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is corrupt: {0}")]
    Format(#[from] serde_json::Error),
}

impl From<&StoreError> for FailureKind {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::ContextInvalidated => FailureKind::ContextInvalidated,
            _ => FailureKind::Storage,
        }
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Settings, StoreError>;
    async fn save(&self, settings: &Settings) -> Result<(), StoreError>;
}

/// In-process store. Can be flipped into the invalidated state to mimic a
/// reloaded extension.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: RwLock<Settings>,
    invalidated: AtomicBool,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
            invalidated: AtomicBool::new(false),
        }
    }

    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.invalidated.load(Ordering::SeqCst) {
            return Err(StoreError::ContextInvalidated);
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load(&self) -> Result<Settings, StoreError> {
        self.check()?;
        Ok(self.settings.read().clone())
    }

    async fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        self.check()?;
        *self.settings.write() = settings.clone();
        Ok(())
    }
}

/// JSON file store. A missing file loads as empty settings.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `settings.json` in the platform config directory.
    pub fn default_location() -> Result<Self, StoreError> {
        let dirs = ProjectDirs::from("ai", "Sentient", "SentientExplainer")
            .ok_or(StoreError::NoConfigDir)?;
        Ok(Self::new(dirs.config_dir().join("settings.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for FileStore {
    async fn load(&self) -> Result<Settings, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(settings)?).await?;
        tracing::debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

/// Wraps a store so a missing key is filled from `FIREWORKS_API_KEY`.
#[derive(Debug)]
pub struct EnvFallback<S>(pub S);

#[async_trait]
impl<S: SettingsStore> SettingsStore for EnvFallback<S> {
    async fn load(&self) -> Result<Settings, StoreError> {
        Ok(self.0.load().await?.with_env_fallback())
    }

    async fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        self.0.save(settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::default();
        assert!(store.load().await.unwrap().api_key().is_none());

        store
            .save(&Settings::from_input("fw_key", "Hindi").unwrap())
            .await
            .unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.language(), "Hindi");
    }

    #[tokio::test]
    async fn test_invalidated_store_maps_to_context_failure() {
        let store = MemoryStore::default();
        store.invalidate();
        let err = store.load().await.unwrap_err();
        assert_eq!(FailureKind::from(&err), FailureKind::ContextInvalidated);
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("settings.json"));
        let settings = store.load().await.unwrap();
        assert!(settings.api_key().is_none());
        assert_eq!(settings.language(), "English");

        store
            .save(&Settings::from_input("abc", "Korean").unwrap())
            .await
            .unwrap();
        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded.api_key().unwrap().expose(), "abc");
        assert_eq!(reloaded.language(), "Korean");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));
        assert_eq!(FailureKind::from(&err), FailureKind::Storage);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_file_stores_interleave_on_one_thread() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileStore::new(dir.path().join("a").join("settings.json"));
        let second = FileStore::new(dir.path().join("b").join("settings.json"));
        let a = Settings::from_input("key-a", "French").unwrap();
        let b = Settings::from_input("key-b", "German").unwrap();

        let (saved_a, saved_b) = tokio::join!(first.save(&a), second.save(&b));
        saved_a.unwrap();
        saved_b.unwrap();

        let (loaded_a, loaded_b) = tokio::join!(first.load(), second.load());
        assert_eq!(loaded_a.unwrap().language(), "French");
        assert_eq!(loaded_b.unwrap().api_key().unwrap().expose(), "key-b");
    }

    #[tokio::test]
    async fn test_unreadable_path_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileStore::new(dir.path()).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(FailureKind::from(&err), FailureKind::Storage);
    }
}
