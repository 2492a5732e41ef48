use super::{ConfigKey, ConfigMigration, ConfigTextStore};
use crate::error::ConfigError;
use crate::logging::{KernelLogger, LogLevel};
use std::sync::Arc;

/// First token of the version header line.
pub const VERSION_HEADER_PREFIX: &str = "configVersion:";

/// Loads and saves versioned config documents through a [`ConfigTextStore`].
///
/// Loading heals the stored document as a side effect: missing documents are
/// created from the key's default, older documents are migrated, undecodable
/// ones are replaced by the default, and the result is written back with the
/// current version header. Only storage and encoding failures are returned.
pub struct ConfigManager {
    store: Arc<dyn ConfigTextStore>,
    logger: Arc<dyn KernelLogger>,
}

impl ConfigManager {
    pub fn new(store: Arc<dyn ConfigTextStore>, logger: Arc<dyn KernelLogger>) -> Self {
        Self { store, logger }
    }

    pub fn store(&self) -> &Arc<dyn ConfigTextStore> {
        &self.store
    }

    pub fn load<T>(&self, key: &ConfigKey<T>) -> Result<T, ConfigError> {
        let Some(existing) = self.store.read(key.id())? else {
            let default = key.default_value();
            self.save(key, &default)?;
            self.logger
                .log(LogLevel::Debug, "Created config from defaults", None, &[("id", key.id().to_string())]);
            return Ok(default);
        };

        let (stored_version, body) = parse_version_header(&existing);
        let mut version = stored_version.unwrap_or(0);
        let mut text = body.to_string();

        if version < key.version() {
            let mut migrations: Vec<&ConfigMigration> = key.migrations().iter().collect();
            migrations.sort_by_key(|m| m.from_version());
            for migration in migrations {
                if migration.from_version() != version {
                    continue;
                }
                text = migration.apply(&text);
                version = migration.to_version();
                self.logger.log(
                    LogLevel::Debug,
                    "Applied config migration",
                    None,
                    &[
                        ("id", key.id().to_string()),
                        ("from", migration.from_version().to_string()),
                        ("to", migration.to_version().to_string()),
                    ],
                );
            }
        }

        if version != key.version() {
            self.logger.log(
                LogLevel::Warn,
                &format!(
                    "Config '{}' could not be fully migrated (have={} want={}); using best-effort decode",
                    key.id(),
                    version,
                    key.version()
                ),
                None,
                &[],
            );
        }

        let value = match key.codec().decode(&text) {
            Ok(value) => value,
            Err(e) => {
                self.logger.error(
                    &format!("Failed to decode config '{}', falling back to defaults", key.id()),
                    Some(&e as &dyn std::error::Error),
                );
                key.default_value()
            }
        };

        self.save(key, &value)?;
        Ok(value)
    }

    /// Encodes `value` and stores it under the key's current version.
    pub fn save<T>(&self, key: &ConfigKey<T>, value: &T) -> Result<(), ConfigError> {
        let body = key.codec().encode(value).map_err(|source| ConfigError::Encode {
            id: key.id().to_string(),
            source,
        })?;
        self.store.write(key.id(), &render_with_header(key.version(), &body))?;
        Ok(())
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("logger", &self.logger.name())
            .finish()
    }
}

fn render_with_header(version: u32, body: &str) -> String {
    format!("{VERSION_HEADER_PREFIX} {version}\n{body}")
}

/// Splits a stored document into its header version and body.
///
/// Blank lines and `#` or `//` comments before the header are skipped. The
/// first other line ends the search: if it is not a header the whole text is
/// the body. A header with an unreadable number yields `None` but is still
/// stripped.
fn parse_version_header(text: &str) -> (Option<u32>, &str) {
    let mut offset = 0;
    for raw in text.split_inclusive('\n') {
        offset += raw.len();
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        if let Some(version) = line.strip_prefix(VERSION_HEADER_PREFIX) {
            return (version.trim().parse().ok(), &text[offset..]);
        }
        break;
    }
    (None, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileConfigTextStore, FnConfigCodec, InMemoryConfigTextStore, TomlConfigCodec};
    use crate::error::{CodecError, StoreError};
    use crate::logging::TracingLogger;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Greeting {
        message: String,
        volume: u32,
    }

    impl Default for Greeting {
        fn default() -> Self {
            Self {
                message: "welcome".to_string(),
                volume: 5,
            }
        }
    }

    fn manager() -> (ConfigManager, Arc<InMemoryConfigTextStore>) {
        let store = Arc::new(InMemoryConfigTextStore::new());
        let manager = ConfigManager::new(store.clone(), Arc::new(TracingLogger::new("config")));
        (manager, store)
    }

    fn greeting_key(version: u32) -> ConfigKey<Greeting> {
        ConfigKey::new("greeting", version, TomlConfigCodec::new(), Greeting::default)
    }

    fn stored(store: &InMemoryConfigTextStore) -> String {
        store.read("greeting").unwrap().unwrap_or_default()
    }

    #[test]
    fn test_missing_document_persists_default() {
        let (manager, store) = manager();
        let value = manager.load(&greeting_key(3)).unwrap();

        assert_eq!(value, Greeting::default());
        assert_eq!(stored(&store).lines().next(), Some("configVersion: 3"));
    }

    #[test]
    fn test_v0_document_is_migrated_and_rewritten() {
        let (manager, store) = manager();
        store.write("greeting", "text = \"hi\"\nvolume = 2\n").unwrap();

        let key = greeting_key(1).with_migration(ConfigMigration::new(0, 1, |text| text.replace("text =", "message =")));
        let value = manager.load(&key).unwrap();

        assert_eq!(value.message, "hi");
        assert_eq!(value.volume, 2);
        let text = stored(&store);
        assert!(text.starts_with("configVersion: 1\n"));
        assert!(text.contains("message = \"hi\""));
    }

    #[test]
    fn test_migrations_walk_in_ascending_order() {
        let (manager, store) = manager();
        store
            .write("greeting", "configVersion: 1\nmessage = \"hi\"\nvolume = 1\n")
            .unwrap();

        let key = greeting_key(3)
            .with_migration(ConfigMigration::new(2, 3, |text| text.replace("volume = 10", "volume = 11")))
            .with_migration(ConfigMigration::new(0, 1, |_| "message = \"wrong\"\nvolume = 0\n".to_string()))
            .with_migration(ConfigMigration::new(1, 2, |text| text.replace("volume = 1", "volume = 10")));

        let value = manager.load(&key).unwrap();
        assert_eq!(value.volume, 11);
        assert_eq!(value.message, "hi");
        assert!(stored(&store).starts_with("configVersion: 3\n"));
    }

    #[test]
    fn test_malformed_body_heals_to_default() {
        let (manager, store) = manager();
        store.write("greeting", "configVersion: 1\nmessage = [oops\n").unwrap();

        let value = manager.load(&greeting_key(1)).unwrap();
        assert_eq!(value, Greeting::default());

        let text = stored(&store);
        assert!(!text.contains("oops"));
        assert!(text.contains("message = \"welcome\""));
    }

    #[test]
    fn test_incomplete_chain_still_decodes() {
        let (manager, store) = manager();
        store.write("greeting", "message = \"hi\"\nvolume = 9\n").unwrap();

        // No 0 -> 1 step, so the document stays at version 0
        let key = greeting_key(2).with_migration(ConfigMigration::new(1, 2, |_| String::new()));
        let value = manager.load(&key).unwrap();

        assert_eq!(value.volume, 9);
        assert!(stored(&store).starts_with("configVersion: 2\n"));
    }

    #[test]
    fn test_current_document_skips_migrations() {
        let (manager, store) = manager();
        store.write("greeting", "configVersion: 1\nmessage = \"hi\"\nvolume = 4\n").unwrap();

        let key = greeting_key(1).with_migration(ConfigMigration::new(0, 1, |_| "broken".to_string()));
        assert_eq!(manager.load(&key).unwrap().volume, 4);
    }

    #[test]
    fn test_save_stamps_target_version() {
        let (manager, store) = manager();
        let value = Greeting {
            message: "saved".to_string(),
            volume: 1,
        };
        manager.save(&greeting_key(7), &value).unwrap();

        let text = stored(&store);
        assert!(text.starts_with("configVersion: 7\n"));
        assert_eq!(manager.load(&greeting_key(7)).unwrap(), value);
    }

    #[test]
    fn test_parse_header_skips_comments_and_blank_lines() {
        let (version, body) = parse_version_header("\n# note\n// other\n  configVersion: 4 \nbody = 1\n");
        assert_eq!(version, Some(4));
        assert_eq!(body, "body = 1\n");
    }

    #[test]
    fn test_parse_header_stops_at_content() {
        let text = "body = 1\nconfigVersion: 4\n";
        assert_eq!(parse_version_header(text), (None, text));
    }

    #[test]
    fn test_parse_header_with_bad_number_is_stripped() {
        assert_eq!(parse_version_header("configVersion: two\nbody = 1"), (None, "body = 1"));
    }

    #[test]
    fn test_store_failure_is_returned() {
        let dir = tempfile::TempDir::new().unwrap();
        let manager = ConfigManager::new(
            Arc::new(FileConfigTextStore::new(dir.path())),
            Arc::new(TracingLogger::new("config")),
        );
        let key = ConfigKey::new("../outside", 1, TomlConfigCodec::<Greeting>::new(), Greeting::default);

        assert!(matches!(
            manager.load(&key),
            Err(ConfigError::Store(StoreError::InvalidId(_)))
        ));
    }

    #[test]
    fn test_encode_failure_is_returned() {
        let (manager, _store) = manager();
        let codec = FnConfigCodec::new(
            |_: &str| -> Result<u32, CodecError> { Ok(0) },
            |_: &u32| -> Result<String, CodecError> { Err(CodecError::Encode("unsupported".to_string())) },
        );
        let key = ConfigKey::new("counter", 1, codec, || 0u32);

        assert!(matches!(manager.save(&key, &1), Err(ConfigError::Encode { .. })));
    }
}
