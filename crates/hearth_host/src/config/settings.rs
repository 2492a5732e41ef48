//! Host settings structures
//!
//! Every section and field has a default, so a partial file is valid.

use serde::{Deserialize, Serialize};

/// Root settings object, stored as TOML.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Real-time scheduler driver settings
    pub scheduler: SchedulerSettings,
    /// Where plugin config documents are stored
    pub config: ConfigStoreSettings,
    /// Log output settings
    pub logging: LoggingSettings,
}

/// Scheduler driver settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SchedulerSettings {
    /// How often the driver advances the virtual clock and drains both lanes,
    /// in milliseconds. Must be positive.
    pub tick_interval_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { tick_interval_ms: 50 }
    }
}

/// File-backed config store settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ConfigStoreSettings {
    /// Base directory; each config id maps to a file below it
    pub directory: String,
}

impl Default for ConfigStoreSettings {
    fn default() -> Self {
        Self {
            directory: "config".to_string(),
        }
    }
}

/// Logging system configuration.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Logging level filter
    ///
    /// Valid values: "trace", "debug", "info", "warn", "error", or any
    /// `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    pub level: String,

    /// Enable JSON-formatted log output
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}
