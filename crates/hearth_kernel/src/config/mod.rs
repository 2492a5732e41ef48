//! # Versioned configuration
//!
//! Typed config documents stored as opaque text. A [`ConfigKey`] bundles the
//! document id, the current schema version, a codec, a default value and the
//! text migrations that bring older documents up to date.
//!
//! Stored documents start with a one-line header:
//!
//! ```text
//! configVersion: 2
//! <codec-specific body>
//! ```
//!
//! A document without a header is treated as version 0.

mod codecs;
mod manager;
mod store;

pub use codecs::{FnConfigCodec, JsonConfigCodec, TomlConfigCodec};
pub use manager::{ConfigManager, VERSION_HEADER_PREFIX};
pub use store::{ConfigTextStore, FileConfigTextStore, InMemoryConfigTextStore};

use crate::error::CodecError;
use std::fmt;
use std::sync::Arc;

/// Turns config text into typed values and back.
pub trait ConfigCodec<T>: Send + Sync {
    fn decode(&self, text: &str) -> Result<T, CodecError>;
    fn encode(&self, value: &T) -> Result<String, CodecError>;
}

type MigrateFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A pure text transform from one schema version to another.
#[derive(Clone)]
pub struct ConfigMigration {
    from: u32,
    to: u32,
    migrate: MigrateFn,
}

impl ConfigMigration {
    pub fn new<F>(from: u32, to: u32, migrate: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            from,
            to,
            migrate: Arc::new(migrate),
        }
    }

    pub fn from_version(&self) -> u32 {
        self.from
    }

    pub fn to_version(&self) -> u32 {
        self.to
    }

    pub fn apply(&self, text: &str) -> String {
        (self.migrate)(text)
    }
}

impl fmt::Debug for ConfigMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigMigration({} -> {})", self.from, self.to)
    }
}

type DefaultFn<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Typed handle for one config document.
///
/// # Examples
///
/// ```rust
/// use hearth_kernel::config::{ConfigKey, ConfigMigration, TomlConfigCodec};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Motd {
///     message: String,
/// }
///
/// let key = ConfigKey::new("motd", 1, TomlConfigCodec::<Motd>::new(), Motd::default)
///     .with_migration(ConfigMigration::new(0, 1, |text| text.replace("text =", "message =")));
/// assert_eq!(key.version(), 1);
/// ```
pub struct ConfigKey<T> {
    id: String,
    version: u32,
    codec: Arc<dyn ConfigCodec<T>>,
    default: DefaultFn<T>,
    migrations: Vec<ConfigMigration>,
}

impl<T> ConfigKey<T> {
    pub fn new<C, D>(id: impl Into<String>, version: u32, codec: C, default: D) -> Self
    where
        C: ConfigCodec<T> + 'static,
        D: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            version,
            codec: Arc::new(codec),
            default: Arc::new(default),
            migrations: Vec::new(),
        }
    }

    pub fn with_migration(mut self, migration: ConfigMigration) -> Self {
        self.migrations.push(migration);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current schema version.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn codec(&self) -> &dyn ConfigCodec<T> {
        self.codec.as_ref()
    }

    pub fn default_value(&self) -> T {
        (self.default)()
    }

    pub fn migrations(&self) -> &[ConfigMigration] {
        &self.migrations
    }
}

impl<T> Clone for ConfigKey<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            version: self.version,
            codec: self.codec.clone(),
            default: self.default.clone(),
            migrations: self.migrations.clone(),
        }
    }
}

impl<T> fmt::Debug for ConfigKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigKey")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("migrations", &self.migrations)
            .finish()
    }
}
