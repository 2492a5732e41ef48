//! # Hearth Host
//!
//! Everything needed to run the Hearth kernel as a standalone process:
//!
//! - [`config`]: TOML settings with defaults written on first start
//! - [`logging`]: global `tracing` subscriber setup
//! - [`platform`]: a [`Platform`](hearth_kernel::platform::Platform) built on the virtual scheduler
//! - [`driver`]: the tokio loop that moves virtual time forward in real time
//!
//! ```rust,no_run
//! use hearth_host::{config, logging, HostRuntime};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = config::load_settings(Path::new("hearth.toml")).await?;
//!     logging::setup_logging(&settings.logging)?;
//!
//!     let host = HostRuntime::new(&settings);
//!     let _ctx = host.kernel().plugin_context("example");
//!
//!     let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         let _ = shutdown_tx.send(true);
//!     });
//!     host.driver().run(shutdown_rx).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod driver;
pub mod logging;
pub mod platform;

pub use config::{load_settings, Settings};
pub use driver::RealtimeDriver;
pub use platform::StandalonePlatform;

use hearth_kernel::config::FileConfigTextStore;
use hearth_kernel::KernelRuntime;
use std::sync::Arc;
use std::time::Duration;

/// A kernel runtime on a [`StandalonePlatform`] plus the driver that advances it.
pub struct HostRuntime {
    kernel: KernelRuntime,
    driver: RealtimeDriver,
}

impl HostRuntime {
    pub fn new(settings: &Settings) -> Self {
        let platform = Arc::new(StandalonePlatform::new());
        let driver = RealtimeDriver::new(
            platform.virtual_scheduler(),
            Duration::from_millis(settings.scheduler.tick_interval_ms),
        );
        let store = Arc::new(FileConfigTextStore::new(&settings.config.directory));
        Self {
            kernel: KernelRuntime::new(platform, store),
            driver,
        }
    }

    pub fn kernel(&self) -> &KernelRuntime {
        &self.kernel
    }

    pub fn driver(&self) -> &RealtimeDriver {
        &self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_kernel::config::{ConfigKey, TomlConfigCodec};
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Motd {
        message: String,
    }

    #[test]
    fn test_host_runtime_stores_configs_in_configured_directory() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.config.directory = dir.path().join("config").display().to_string();
        settings.scheduler.tick_interval_ms = 20;

        let host = HostRuntime::new(&settings);
        let ctx = host.kernel().plugin_context("motd");
        let key = ConfigKey::new("motd/settings.toml", 1, TomlConfigCodec::<Motd>::new(), Motd::default);
        ctx.configs().load(&key).unwrap();

        let stored = std::fs::read_to_string(dir.path().join("config/motd/settings.toml")).unwrap();
        assert!(stored.starts_with("configVersion: 1\n"));
        assert_eq!(host.driver().tick_interval(), Duration::from_millis(20));
        assert_eq!(host.kernel().platform().platform_id(), "standalone");
    }
}
