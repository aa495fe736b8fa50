//! Settings for each command, read from the layered configuration.
//!
//! Keys use the `section_field` form: `apns_team_id` in a file, or
//! `COURIER_APNS_TEAM_ID` in the environment.

use courier_config::{ConfigManager, ConfigValidator, Result, Validate};
use courier_push::ApnsEnvironment;
use courier_safari::WebsiteDescriptor;
use std::path::{Path, PathBuf};

use crate::error::CliResult;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "COURIER";

/// Layered configuration: optional file, then `.env`, then the environment.
pub struct CourierSettings {
    config: ConfigManager,
}

impl CourierSettings {
    pub fn load(config_file: Option<&Path>) -> CliResult<Self> {
        let config = ConfigManager::with_prefix(ENV_PREFIX);
        if let Some(path) = config_file {
            config.load_file(path)?;
        }
        config.load_dotenv(None)?;
        Ok(Self { config })
    }

    pub fn from_manager(config: ConfigManager) -> Self {
        Self { config }
    }

    pub fn apns(&self) -> CliResult<ApnsSettings> {
        Ok(self.config.load_validated(ApnsSettings::from_config)?)
    }

    pub fn safari(&self) -> CliResult<SafariSettings> {
        Ok(self.config.load_validated(SafariSettings::from_config)?)
    }

    pub fn server(&self) -> CliResult<ServerSettings> {
        Ok(self.config.load_validated(ServerSettings::from_config)?)
    }
}

#[derive(Debug, Clone)]
pub struct ApnsSettings {
    pub team_id: String,
    pub key_id: String,
    pub bundle_id: String,
    pub key_path: PathBuf,
    pub environment: ApnsEnvironment,
    /// Overrides the environment's host.
    pub endpoint: Option<String>,
    /// PKCS#12 bundle used for Safari web pushes.
    pub safari_cert_path: Option<PathBuf>,
}

impl ApnsSettings {
    fn from_config(config: &ConfigManager) -> Result<Self> {
        let environment = config
            .get_or("apns_environment", "production".to_string())
            .parse()
            .map_err(|e: courier_push::PushError| courier_config::ConfigError::InvalidValue {
                key: "apns_environment".into(),
                message: e.to_string(),
            })?;

        Ok(Self {
            team_id: config.get_string("apns_team_id")?,
            key_id: config.get_string("apns_key_id")?,
            bundle_id: config.get_string("apns_bundle_id")?,
            key_path: config.get_string("apns_key_path")?.into(),
            environment,
            endpoint: config.get_opt("apns_endpoint")?,
            safari_cert_path: config
                .get_opt::<String>("apns_safari_cert_path")?
                .map(PathBuf::from),
        })
    }
}

impl Validate for ApnsSettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.team_id, "apns.team_id")?;
        ConfigValidator::not_empty(&self.key_id, "apns.key_id")?;
        ConfigValidator::not_empty(&self.bundle_id, "apns.bundle_id")?;
        ConfigValidator::file_exists(&self.key_path, "apns.key_path")?;
        if let Some(endpoint) = &self.endpoint {
            ConfigValidator::is_url_or_path(endpoint, "apns.endpoint")?;
        }
        if let Some(path) = &self.safari_cert_path {
            ConfigValidator::file_exists(path, "apns.safari_cert_path")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SafariSettings {
    pub cert_path: PathBuf,
    pub apple_root_path: PathBuf,
    pub icons_dir: PathBuf,
    pub website: WebsiteDescriptor,
}

impl SafariSettings {
    fn from_config(config: &ConfigManager) -> Result<Self> {
        // Accepts a JSON array or a comma separated list.
        let allowed_domains = match config.get::<Vec<String>>("safari_allowed_domains") {
            Ok(domains) => domains,
            Err(_) => config
                .get_string("safari_allowed_domains")?
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect(),
        };

        Ok(Self {
            cert_path: config.get_string("safari_cert_path")?.into(),
            apple_root_path: config.get_string("safari_apple_root_path")?.into(),
            icons_dir: config.get_string("safari_icons_dir")?.into(),
            website: WebsiteDescriptor {
                website_name: config.get_string("safari_website_name")?,
                website_push_id: config.get_string("safari_website_push_id")?,
                allowed_domains,
                url_format_string: config.get_string("safari_url_format_string")?,
                authentication_token: config.get_string("safari_authentication_token")?,
                web_service_url: config.get_or("safari_web_service_url", String::new()),
            },
        })
    }
}

impl Validate for SafariSettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::file_exists(&self.cert_path, "safari.cert_path")?;
        ConfigValidator::file_exists(&self.apple_root_path, "safari.apple_root_path")?;
        ConfigValidator::dir_exists(&self.icons_dir, "safari.icons_dir")?;
        ConfigValidator::not_empty(&self.website.website_name, "safari.website_name")?;
        ConfigValidator::not_empty(&self.website.website_push_id, "safari.website_push_id")?;
        ConfigValidator::not_empty(&self.website.url_format_string, "safari.url_format_string")?;
        ConfigValidator::min_len(
            &self.website.authentication_token,
            16,
            "safari.authentication_token",
        )?;
        if !self.website.web_service_url.is_empty() {
            ConfigValidator::is_url_or_path(&self.website.web_service_url, "safari.web_service_url")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    fn from_config(config: &ConfigManager) -> Result<Self> {
        Ok(Self {
            host: config.get_or("server_host", "0.0.0.0".to_string()),
            port: config.get_opt("server_port")?.unwrap_or(8080),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Validate for ServerSettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.host, "server.host")?;
        ConfigValidator::is_port(self.port, "server.port")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_config::ConfigError;
    use std::io::Write;

    fn settings(toml: &str) -> (CourierSettings, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let toml = toml.replace("$DIR", &dir.path().display().to_string());
        let path = dir.path().join("courier.toml");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(toml.as_bytes())
            .unwrap();

        let config = ConfigManager::new();
        config.load_file(&path).unwrap();
        (CourierSettings::from_manager(config), dir)
    }

    #[test]
    fn test_apns_section() {
        let (settings, dir) = settings(
            r#"
[apns]
team_id = "ABC123"
key_id = "XYZ9"
bundle_id = "com.example.app"
key_path = "$DIR/courier.toml"
environment = "sandbox"
"#,
        );

        let apns = settings.apns().unwrap();
        assert_eq!(apns.team_id, "ABC123");
        assert_eq!(apns.environment, ApnsEnvironment::Development);
        assert_eq!(apns.key_path, dir.path().join("courier.toml"));
        assert!(apns.endpoint.is_none());
    }

    #[test]
    fn test_apns_missing_key_file() {
        let (settings, _dir) = settings(
            r#"
[apns]
team_id = "ABC123"
key_id = "XYZ9"
bundle_id = "com.example.app"
key_path = "$DIR/AuthKey.p8"
"#,
        );

        assert!(matches!(
            settings.apns(),
            Err(crate::error::CliError::Config(ConfigError::ValidationError(_)))
        ));
    }

    #[test]
    fn test_apns_missing_field() {
        let (settings, _dir) = settings("[apns]\nteam_id = \"ABC123\"\n");
        assert!(matches!(
            settings.apns(),
            Err(crate::error::CliError::Config(ConfigError::KeyNotFound(_)))
        ));
    }

    #[test]
    fn test_safari_section() {
        let (settings, _dir) = settings(
            r#"
[safari]
cert_path = "$DIR/courier.toml"
apple_root_path = "$DIR/courier.toml"
icons_dir = "$DIR"
website_name = "Example"
website_push_id = "web.com.example"
allowed_domains = "https://example.com, https://www.example.com"
url_format_string = "https://example.com/%@"
authentication_token = "0123456789abcdef0123"
web_service_url = "https://example.com/push"
"#,
        );

        let safari = settings.safari().unwrap();
        assert_eq!(
            safari.website.allowed_domains,
            vec!["https://example.com", "https://www.example.com"]
        );
        assert_eq!(safari.website.web_service_url, "https://example.com/push");
    }

    #[test]
    fn test_short_authentication_token_rejected() {
        let (settings, _dir) = settings(
            r#"
[safari]
cert_path = "$DIR/courier.toml"
apple_root_path = "$DIR/courier.toml"
icons_dir = "$DIR"
website_name = "Example"
website_push_id = "web.com.example"
allowed_domains = ["https://example.com"]
url_format_string = "https://example.com/%@"
authentication_token = "short"
"#,
        );

        assert!(settings.safari().is_err());
    }

    #[test]
    fn test_server_defaults() {
        let server = CourierSettings::from_manager(ConfigManager::new())
            .server()
            .unwrap();
        assert_eq!(server.address(), "0.0.0.0:8080");
    }
}
