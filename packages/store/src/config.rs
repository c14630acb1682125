//! Store-wide configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use statema_point::Error;

/// Options that apply to a whole store.
///
/// ```json
/// {"label": "ServerSettings", "lock_timeout_ms": 500}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name used in `describe` output and log lines.
    pub label: String,
    /// Upper bound on every lock wait. `None` blocks indefinitely.
    pub lock_timeout_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            label: "SettingStore".to_string(),
            lock_timeout_ms: None,
        }
    }
}

impl StoreConfig {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn lock_timeout_duration(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    /// Parse a JSON configuration; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::conversion("config", e.to_string()))
    }
}
