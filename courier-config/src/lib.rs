// Configuration management for Courier
//
// Values are layered: files first, then `.env`, then the process environment,
// each later source overriding keys set by an earlier one.

pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Main configuration manager
#[derive(Clone, Default)]
pub struct ConfigManager {
    config: Arc<RwLock<HashMap<String, Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only environment variables named `PREFIX_*` are considered
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            config: Arc::default(),
            env_prefix: Some(prefix.into()),
        }
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        self.merge_strings(loader.load());
        Ok(())
    }

    /// Load a `.env` file (if any) into the process environment, then read it
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        self.load_env()
    }

    /// Load configuration from a file, detecting its format from the extension
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = ConfigLoader::auto(path)?.load_file(path)?;

        let mut config = self.config.write();
        for (key, value) in loader::flatten(data) {
            config.insert(key, value);
        }

        Ok(())
    }

    fn merge_strings(&self, values: HashMap<String, String>) {
        let mut config = self.config.write();
        for (key, value) in values {
            config.insert(key, Value::String(value));
        }
    }

    /// Set a configuration value
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        self.config.write().insert(key.to_string(), json_value);
        Ok(())
    }

    /// Get a typed value.
    ///
    /// Values that came from the environment are strings; when the target type
    /// is not a string, the text is re-parsed as JSON so `"8080"` reads as a number.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .config
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        match serde_json::from_value::<T>(value.clone()) {
            Ok(v) => Ok(v),
            Err(first) => {
                let Value::String(text) = value else {
                    return Err(invalid(key, first));
                };
                serde_json::from_str(&text).map_err(|_| invalid(key, first))
            }
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Like [`get`](Self::get) but a missing key is `Ok(None)`
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            Ok(v) => Ok(Some(v)),
            Err(ConfigError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.config.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.config.read().keys().cloned().collect()
    }

    /// Build a settings value from the loaded keys and validate it
    pub fn load_validated<T, F>(&self, build: F) -> Result<T>
    where
        T: Validate,
        F: FnOnce(&Self) -> Result<T>,
    {
        let value = build(self)?;
        value.validate()?;
        Ok(value)
    }
}

fn invalid(key: &str, err: serde_json::Error) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: err.to_string(),
    }
}
