// Configuration validation

use crate::{ConfigError, Result};
use std::path::Path;

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// Accepts http(s) URLs and absolute paths such as `/push`
    pub fn is_url_or_path(value: &str, field: &str) -> Result<()> {
        if value.starts_with("http://") || value.starts_with("https://") || value.starts_with('/') {
            return Ok(());
        }
        Err(ConfigError::ValidationError(format!(
            "{} must be an http(s) URL or an absolute path",
            field
        )))
    }

    pub fn is_port(value: u16, field: &str) -> Result<()> {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} must be a valid port number",
                field
            )));
        }
        Ok(())
    }

    pub fn file_exists(path: &Path, field: &str) -> Result<()> {
        if !path.is_file() {
            return Err(ConfigError::ValidationError(format!(
                "{} points to a missing file: {}",
                field,
                path.display()
            )));
        }
        Ok(())
    }

    pub fn dir_exists(path: &Path, field: &str) -> Result<()> {
        if !path.is_dir() {
            return Err(ConfigError::ValidationError(format!(
                "{} points to a missing directory: {}",
                field,
                path.display()
            )));
        }
        Ok(())
    }

    /// Safari requires the authentication token to be at least 16 characters
    pub fn min_len(value: &str, min: usize, field: &str) -> Result<()> {
        if value.chars().count() < min {
            return Err(ConfigError::ValidationError(format!(
                "{} must be at least {} characters",
                field, min
            )));
        }
        Ok(())
    }
}
