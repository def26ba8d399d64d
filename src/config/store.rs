//! Persistent store for `config.json` and the advisory device cache.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::Configuration;
use crate::detect::DeviceSet;
use crate::error::ConfigError;

/// Handle to the per-user configuration directory.
///
/// Owns `config.json` and `devices_cache.json`. Constructed once per command
/// invocation and passed by reference; there is no ambient singleton.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first write.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Resolve the default configuration directory:
    /// `$AVSWITCH_CONFIG_DIR`, else `~/.config/avswitch`.
    ///
    /// # Errors
    ///
    /// Returns an error if no user configuration directory can be
    /// determined.
    pub fn default_dir() -> anyhow::Result<PathBuf> {
        if let Ok(dir) = std::env::var("AVSWITCH_CONFIG_DIR") {
            return Ok(PathBuf::from(dir));
        }
        dirs::config_dir()
            .map(|d| d.join("avswitch"))
            .ok_or_else(|| anyhow::anyhow!("cannot determine user configuration directory"))
    }

    /// The configuration directory this store is rooted at.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path to `config.json`.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config.json")
    }

    /// Path to `devices_cache.json`.
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.dir.join("devices_cache.json")
    }

    /// Load the configuration, creating and persisting the built-in
    /// defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed, or if the defaults cannot be written on first run.
    pub fn try_load(&self) -> Result<Configuration, ConfigError> {
        let path = self.config_path();
        if !path.exists() {
            let defaults = Configuration::built_in();
            tracing::info!("creating default configuration at {}", path.display());
            self.save(&defaults)?;
            return Ok(defaults);
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the configuration, substituting the built-in defaults on any
    /// read or parse error.
    ///
    /// This is the documented default-substitution policy: a corrupt or
    /// unreadable `config.json` is logged as a warning and never fatal. Use
    /// [`Self::try_load`] where the error itself is wanted.
    #[must_use]
    pub fn load_or_default(&self) -> Configuration {
        match self.try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{e}; using default configuration");
                Configuration::built_in()
            }
        }
    }

    /// Save the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the directory cannot be created or
    /// the file cannot be written.
    pub fn save(&self, config: &Configuration) -> Result<(), ConfigError> {
        let path = self.config_path();
        let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        self.write_file(&path, &json)?;
        tracing::debug!("saved configuration to {}", path.display());
        Ok(())
    }

    /// Deep-merge a partial JSON document into the stored configuration,
    /// save the result, and return it.
    ///
    /// Object-valued keys merge recursively; everything else (scalars,
    /// arrays) overwrites. Keys absent from the partial are unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUpdate`] if the merged document no
    /// longer deserializes as a configuration, or an I/O error from saving.
    pub fn update(&self, partial: Value) -> Result<Configuration, ConfigError> {
        let current = self.load_or_default();
        let mut merged = serde_json::to_value(&current).map_err(ConfigError::InvalidUpdate)?;
        deep_merge(&mut merged, partial);
        let config: Configuration =
            serde_json::from_value(merged).map_err(ConfigError::InvalidUpdate)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Rewrite the built-in defaults and return them.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from saving.
    pub fn reset(&self) -> Result<Configuration, ConfigError> {
        let defaults = Configuration::built_in();
        self.save(&defaults)?;
        Ok(defaults)
    }

    /// Overwrite the advisory device cache with the latest detection
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the cache file cannot be written. The
    /// cache is advisory; callers treat failure as non-fatal.
    pub fn save_device_cache(&self, devices: &DeviceSet) -> Result<(), ConfigError> {
        let path = self.cache_path();
        let json =
            serde_json::to_string_pretty(devices).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        self.write_file(&path, &json)
    }

    fn write_file(&self, path: &Path, json: &str) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(path, format!("{json}\n")).map_err(io_err)
    }
}

/// Recursively merge `partial` into `target`: objects merge key-by-key,
/// anything else replaces the target value.
fn deep_merge(target: &mut Value, partial: Value) {
    match (target, partial) {
        (Value::Object(target_map), Value::Object(partial_map)) => {
            for (key, value) in partial_map {
                match target_map.get_mut(&key) {
                    Some(slot) if slot.is_object() && value.is_object() => {
                        deep_merge(slot, value);
                    }
                    _ => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_store() -> (ConfigStore, tempfile::TempDir) {
        let tmp = tempfile::tempdir().expect("create temp dir");
        (ConfigStore::new(tmp.path().join("avswitch")), tmp)
    }

    #[test]
    fn try_load_creates_defaults_when_missing() {
        let (store, _tmp) = temp_store();
        let config = store.try_load().unwrap();
        assert_eq!(config, Configuration::built_in());
        assert!(store.config_path().exists(), "defaults should be persisted");
    }

    #[test]
    fn save_then_load_roundtrips() {
        let (store, _tmp) = temp_store();
        let config = Configuration::built_in();
        store.save(&config).unwrap();
        assert_eq!(store.try_load().unwrap(), config);
    }

    #[test]
    fn save_load_is_byte_idempotent() {
        let (store, _tmp) = temp_store();
        store.save(&Configuration::built_in()).unwrap();
        let first = fs::read_to_string(store.config_path()).unwrap();
        let loaded = store.try_load().unwrap();
        store.save(&loaded).unwrap();
        let second = fs::read_to_string(store.config_path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn load_or_default_substitutes_on_corrupt_json() {
        let (store, _tmp) = temp_store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.config_path(), "{not json").unwrap();
        assert_eq!(store.load_or_default(), Configuration::built_in());
    }

    #[test]
    fn try_load_reports_corrupt_json() {
        let (store, _tmp) = temp_store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.config_path(), "{not json").unwrap();
        match store.try_load() {
            Err(ConfigError::Parse { .. }) => {}
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn update_merges_nested_keys() {
        let (store, _tmp) = temp_store();
        store.save(&Configuration::built_in()).unwrap();

        let updated = store
            .update(json!({"displays": {"keywords": {"tv": ["OLED"]}}}))
            .unwrap();

        assert_eq!(updated.displays.keywords["tv"], vec!["OLED"]);
        // Sibling role untouched by the merge.
        assert_eq!(
            updated.displays.keywords["desk"],
            Configuration::built_in().displays.keywords["desk"]
        );
        // Other sections untouched.
        assert_eq!(updated.macros, Configuration::built_in().macros);
    }

    #[test]
    fn update_persists_the_merge() {
        let (store, _tmp) = temp_store();
        store.save(&Configuration::built_in()).unwrap();
        store
            .update(json!({"audio": {"keywords": {"headset": ["usb"]}}}))
            .unwrap();

        let reloaded = store.try_load().unwrap();
        assert_eq!(reloaded.audio.keywords["headset"], vec!["usb"]);
    }

    #[test]
    fn update_rejects_shape_mismatch() {
        let (store, _tmp) = temp_store();
        store.save(&Configuration::built_in()).unwrap();
        let result = store.update(json!({"displays": {"keywords": 5}}));
        assert!(matches!(result, Err(ConfigError::InvalidUpdate(_))));
    }

    #[test]
    fn reset_restores_defaults() {
        let (store, _tmp) = temp_store();
        store
            .update(json!({"displays": {"keywords": {"tv": ["OLED"]}}}))
            .unwrap();
        store.reset().unwrap();
        assert_eq!(store.try_load().unwrap(), Configuration::built_in());
    }

    #[test]
    fn deep_merge_scalars_overwrite() {
        let mut target = json!({"a": 1, "b": {"c": 2}});
        deep_merge(&mut target, json!({"a": 9}));
        assert_eq!(target, json!({"a": 9, "b": {"c": 2}}));
    }

    #[test]
    fn deep_merge_objects_merge_recursively() {
        let mut target = json!({"b": {"c": 2, "d": 3}});
        deep_merge(&mut target, json!({"b": {"c": 9}}));
        assert_eq!(target, json!({"b": {"c": 9, "d": 3}}));
    }

    #[test]
    fn deep_merge_arrays_overwrite_wholesale() {
        let mut target = json!({"list": [1, 2, 3]});
        deep_merge(&mut target, json!({"list": [9]}));
        assert_eq!(target, json!({"list": [9]}));
    }

    #[test]
    fn deep_merge_inserts_new_keys() {
        let mut target = json!({"a": 1});
        deep_merge(&mut target, json!({"b": {"c": 1}}));
        assert_eq!(target, json!({"a": 1, "b": {"c": 1}}));
    }
}
