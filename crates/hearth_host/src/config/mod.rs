//! Host configuration
//!
//! Loads [`Settings`] from a TOML file, writing a default file when none
//! exists yet.

pub mod settings;

pub use settings::{ConfigStoreSettings, LoggingSettings, SchedulerSettings, Settings};

use anyhow::{bail, Result};
use std::path::Path;
use tracing::{info, warn};

/// Load settings from `path` or create a default settings file there.
///
/// # Errors
/// * Returns error if file I/O operations fail
/// * Returns error if TOML parsing fails
/// * Returns error if `scheduler.tick_interval_ms` is zero
pub async fn load_settings(path: &Path) -> Result<Settings> {
    if tokio::fs::try_exists(path).await? {
        let settings_str = tokio::fs::read_to_string(path).await?;
        let settings = match toml::from_str::<Settings>(&settings_str) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to parse settings file {}: {}", path.display(), e);
                return Err(e.into());
            }
        };
        if settings.scheduler.tick_interval_ms == 0 {
            bail!("scheduler.tick_interval_ms must be positive in {}", path.display());
        }
        Ok(settings)
    } else {
        warn!("Settings file not found: {}, using defaults", path.display());

        let default_settings = Settings::default();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, toml::to_string_pretty(&default_settings)?).await?;
        info!("Created default settings file: {}", path.display());

        Ok(default_settings)
    }
}
