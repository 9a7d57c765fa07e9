//! User preferences persisted as JSON under `~/.scanline/preferences.json`.

use crate::error::{Result, ScanlineError};
use crate::router::HistoryLimit;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

pub const DEFAULT_MAX_ROUTER_HISTORY_SIZE: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub performance: PerformancePreferences,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PerformancePreferences {
    /// Maximum number of back entries kept by the router.
    pub max_router_history_size: usize,
}

impl Default for PerformancePreferences {
    fn default() -> Self {
        Self {
            max_router_history_size: DEFAULT_MAX_ROUTER_HISTORY_SIZE,
        }
    }
}

impl Preferences {
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".scanline")
            .join("preferences.json")
    }

    /// Loads from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Loads preferences from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no preferences file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            ScanlineError::Preference(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Live handle on the history size, seeded from these preferences.
    pub fn history_size(&self) -> HistorySizeSetting {
        HistorySizeSetting::new(self.performance.max_router_history_size)
    }
}

/// History size that can be changed while the router is running.
///
/// Clones share the same value; the router reads it on every push.
#[derive(Debug, Clone)]
pub struct HistorySizeSetting(Arc<AtomicUsize>);

impl HistorySizeSetting {
    pub fn new(size: usize) -> Self {
        Self(Arc::new(AtomicUsize::new(size)))
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, size: usize) {
        self.0.store(size, Ordering::Relaxed);
    }
}

impl HistoryLimit for HistorySizeSetting {
    fn max_history_size(&self) -> usize {
        self.get()
    }
}
