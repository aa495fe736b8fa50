// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;

/// Reads `PREFIX_SOME_KEY` variables as `some_key`.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all matching environment variables
    pub fn load(&self) -> HashMap<String, String> {
        self.collect(env::vars())
    }

    /// Filter and normalize an arbitrary set of variables
    pub fn collect(&self, vars: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
        vars.into_iter()
            .filter_map(|(key, value)| self.normalize(&key).map(|key| (key, value)))
            .collect()
    }

    fn normalize(&self, key: &str) -> Option<String> {
        match &self.prefix {
            Some(prefix) => {
                let rest = key.strip_prefix(prefix.as_str())?.strip_prefix('_')?;
                (!rest.is_empty()).then(|| rest.to_lowercase())
            }
            None => Some(key.to_lowercase()),
        }
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // std::env::set_var is unsafe in edition 2024, so these tests feed
    // variables through `collect` instead of mutating the process environment.

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_prefix_is_stripped_and_lowercased() {
        let loader = EnvLoader::new(Some("COURIER".to_string()));
        let loaded = loader.collect(vars(&[
            ("COURIER_APNS_TEAM_ID", "ABC123"),
            ("COURIERX_OTHER", "ignored"),
            ("PATH", "/usr/bin"),
        ]));

        assert_eq!(loaded.get("apns_team_id"), Some(&"ABC123".to_string()));
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_without_prefix_keeps_everything() {
        let loader = EnvLoader::default();
        let loaded = loader.collect(vars(&[("HOME", "/root")]));
        assert_eq!(loaded.get("home"), Some(&"/root".to_string()));
    }

    #[test]
    fn test_missing_var_uses_default() {
        let loader = EnvLoader::new(Some("COURIER_TEST".to_string()));
        assert!(loader.load_var("MISSING_VAR_67890").is_err());
        assert_eq!(loader.load_var_or("MISSING_VAR_67890", "fallback"), "fallback");
    }
}
