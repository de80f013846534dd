use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{ScanError, ScanResult};
use crate::settings::normalize::{Settings, normalize_settings};

/// Namespaced key under which settings are persisted.
pub const SETTINGS_KEY: &str = "scanfield:settings:v1";

/// Minimal string key-value port used for settings persistence.
pub trait KeyValueStore {
    /// Read a value; `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> ScanResult<Option<String>>;
    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &str) -> ScanResult<()>;
}

/// In-process store, mostly for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> ScanResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> ScanResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object file (`{"key": "value", ...}`).
///
/// A missing file reads as an empty store. Writes rewrite the whole file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store persisted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> ScanResult<BTreeMap<String, String>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(ScanError::storage(format!(
                    "read '{}': {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&text).map_err(|e| ScanError::serde(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> ScanResult<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> ScanResult<()> {
        // Corrupt files are overwritten.
        let mut all = self.read_all().unwrap_or_default();
        all.insert(key.to_string(), value.to_string());
        let text = serde_json::to_string_pretty(&all).map_err(|e| ScanError::serde(e.to_string()))?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store directory '{}'", parent.display()))?;
        }
        std::fs::write(&self.path, text)
            .with_context(|| format!("write store '{}'", self.path.display()))?;
        Ok(())
    }
}

/// Loads and saves [`Settings`] through a [`KeyValueStore`].
///
/// Anything unreadable loads as defaults; saving is best effort.
pub struct SettingsManager<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SettingsManager<S> {
    /// Wrap a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load normalized settings; never fails.
    pub fn load(&self) -> Settings {
        let raw = match self.store.get(SETTINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Settings::default(),
            Err(e) => {
                tracing::debug!(error = %e, "settings store unreadable, using defaults");
                return Settings::default();
            }
        };
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(v) => normalize_settings(Some(&v)),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring invalid stored settings");
                Settings::default()
            }
        }
    }

    /// Persist settings; failures are logged and swallowed.
    pub fn save(&mut self, settings: &Settings) {
        let res = serde_json::to_string(settings)
            .map_err(|e| ScanError::serde(e.to_string()))
            .and_then(|json| self.store.set(SETTINGS_KEY, &json));
        if let Err(e) = res {
            tracing::warn!(error = %e, "failed to persist settings");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/settings/store.rs"]
mod tests;
