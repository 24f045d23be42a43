// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::meta::remote_store::RemoteStoreSettings;
use crate::public::site::SitePage;
use crate::theme::ThemeMode;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    pub app: AppConfig,
    pub logging: LoggingConfig,
    pub seo: SeoConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub app: AppConfig,
    pub logging: LoggingConfig,
    pub seo: SeoConfig,
    pub store: ValidatedStoreConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    4
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    #[serde(default = "default_admin_path")]
    pub path: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            path: default_admin_path(),
        }
    }
}

fn default_admin_path() -> String {
    "/seo-dashboard".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SeoConfig {
    pub default_title: String,
    pub default_description: String,
    #[serde(default)]
    pub default_keywords: String,
    #[serde(default = "default_og_image")]
    pub default_og_image: String,
    /// Public origin used for canonical URLs. Falls back to the request host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
}

fn default_og_image() -> String {
    "/default-og-image.jpg".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Remote,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteStoreConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteStoreConfig {
    pub base_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_collection() -> String {
    "metaTags".to_string()
}

fn default_poll_interval_seconds() -> u64 {
    5
}

fn default_timeout_seconds() -> u64 {
    10
}

impl RemoteStoreConfig {
    pub fn settings(&self) -> RemoteStoreSettings {
        RemoteStoreSettings {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            collection: self.collection.clone(),
            poll_interval: Duration::from_secs(self.poll_interval_seconds),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ValidatedStoreConfig {
    File,
    Remote(RemoteStoreConfig),
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ThemeConfig {
    #[serde(default)]
    pub default: ThemeMode,
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join("config.yaml");
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&config_content).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            ))
        })
    }

    /// Loads and validates configuration at startup. If validation fails, the application should not start.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        Self::load(root)?.validate()
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        Self::validate_server(&self.server)?;
        Self::validate_admin(&self.admin)?;
        Self::validate_logging(&self.logging)?;
        Self::validate_seo(&self.seo)?;
        let store = Self::validate_store(&self.store)?;

        Ok(ValidatedConfig {
            server: self.server,
            admin: AdminConfig {
                path: self.admin.path.trim_end_matches('/').to_string(),
            },
            app: self.app,
            logging: self.logging,
            seo: SeoConfig {
                site_url: self
                    .seo
                    .site_url
                    .map(|url| url.trim_end_matches('/').to_string()),
                ..self.seo
            },
            store,
            theme: self.theme,
        })
    }

    fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
        if server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host cannot be empty".to_string(),
            ));
        }
        if server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be greater than 0".to_string(),
            ));
        }
        if server.workers == 0 {
            return Err(ConfigError::ValidationError(
                "server.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_admin(admin: &AdminConfig) -> Result<(), ConfigError> {
        let path = admin.path.trim_end_matches('/');
        if !admin.path.starts_with('/') || path.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "admin.path must start with '/' and not be the site root, got: '{}'",
                admin.path
            )));
        }
        if path.contains(char::is_whitespace) || path.contains(['?', '#']) {
            return Err(ConfigError::ValidationError(format!(
                "admin.path must be a plain path, got: '{}'",
                admin.path
            )));
        }
        if let Some(page) = SitePage::ALL
            .iter()
            .find(|page| page.shadowed_by(path))
        {
            return Err(ConfigError::ValidationError(format!(
                "admin.path '{}' shadows the public route '{}'",
                admin.path,
                page.path()
            )));
        }
        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        match logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "logging.level must be one of trace, debug, info, warn, error; got: '{}'",
                other
            ))),
        }
    }

    fn validate_seo(seo: &SeoConfig) -> Result<(), ConfigError> {
        if seo.default_title.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "seo.default_title cannot be empty".to_string(),
            ));
        }
        if seo.default_description.trim().is_empty() {
            warn!("seo.default_description is empty; pages without metadata will have no description");
        }
        if let Some(url) = seo.site_url.as_ref()
            && !url.starts_with("http://")
            && !url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError(
                "seo.site_url must start with http:// or https://".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_store(store: &StoreConfig) -> Result<ValidatedStoreConfig, ConfigError> {
        match store.backend {
            StoreBackend::File => {
                if store.remote.is_some() {
                    warn!("store.remote is configured but ignored while store.backend is 'file'");
                }
                Ok(ValidatedStoreConfig::File)
            }
            StoreBackend::Remote => {
                let remote = store.remote.clone().ok_or_else(|| {
                    ConfigError::ValidationError(
                        "store.backend 'remote' requires a 'store.remote' section".to_string(),
                    )
                })?;
                if !remote.base_url.starts_with("http://") && !remote.base_url.starts_with("https://")
                {
                    return Err(ConfigError::ValidationError(
                        "store.remote.base_url must start with http:// or https://".to_string(),
                    ));
                }
                if remote.collection.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "store.remote.collection cannot be empty".to_string(),
                    ));
                }
                if remote.poll_interval_seconds < 1 {
                    return Err(ConfigError::ValidationError(
                        "store.remote.poll_interval_seconds must be at least 1".to_string(),
                    ));
                }
                if remote.timeout_seconds < 1 {
                    return Err(ConfigError::ValidationError(
                        "store.remote.timeout_seconds must be at least 1".to_string(),
                    ));
                }
                Ok(ValidatedStoreConfig::Remote(remote))
            }
        }
    }
}

impl ValidatedConfig {
    pub fn bind_address(&self) -> (&str, u16) {
        (self.server.host.as_str(), self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;

    const MINIMAL: &str = "server:\n  host: \"127.0.0.1\"\n  port: 8080\napp:\n  name: \"Acme\"\n  description: \"Agency\"\nlogging:\n  level: \"info\"\nseo:\n  default_title: \"Acme Digital\"\n  default_description: \"We build things\"\n";

    fn minimal_config() -> Config {
        serde_yaml::from_str(MINIMAL).unwrap()
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let validated = minimal_config().validate().expect("valid config");
        assert_eq!(validated.server.workers, 4);
        assert_eq!(validated.admin.path, "/seo-dashboard");
        assert_eq!(validated.seo.default_og_image, "/default-og-image.jpg");
        assert!(matches!(validated.store, ValidatedStoreConfig::File));
        assert_eq!(validated.theme.default, ThemeMode::Dark);
    }

    #[test]
    fn load_reads_config_from_root() {
        let fixture = TestFixtureRoot::new_unique("config-load").unwrap();
        fs::write(fixture.path().join("config.yaml"), MINIMAL).unwrap();
        let validated = Config::load_and_validate(fixture.path()).unwrap();
        assert_eq!(validated.app.name, "Acme");
    }

    #[test]
    fn load_reports_missing_file() {
        let fixture = TestFixtureRoot::new_unique("config-missing").unwrap();
        let err = Config::load(fixture.path()).expect_err("missing file");
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn admin_path_must_not_be_root_or_shadow_site_routes() {
        for path in ["/", "seo", "/services/seo", "/about"] {
            let mut config = minimal_config();
            config.admin.path = path.to_string();
            assert!(config.validate().is_err(), "{} should be rejected", path);
        }
    }

    #[test]
    fn admin_path_trailing_slash_is_trimmed() {
        let mut config = minimal_config();
        config.admin.path = "/seo-dashboard/".to_string();
        assert_eq!(config.validate().unwrap().admin.path, "/seo-dashboard");
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = minimal_config();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn remote_backend_requires_section() {
        let mut config = minimal_config();
        config.store.backend = StoreBackend::Remote;
        assert!(config.validate().is_err());
    }

    #[test]
    fn remote_backend_validates_intervals() {
        let mut config = minimal_config();
        config.store = StoreConfig {
            backend: StoreBackend::Remote,
            remote: Some(RemoteStoreConfig {
                base_url: "http://localhost:9000/".to_string(),
                collection: default_collection(),
                poll_interval_seconds: 0,
                timeout_seconds: 10,
            }),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn remote_settings_trim_base_url() {
        let remote = RemoteStoreConfig {
            base_url: "https://docs.example.com/api/".to_string(),
            collection: default_collection(),
            poll_interval_seconds: 3,
            timeout_seconds: 7,
        };
        let settings = remote.settings();
        assert_eq!(settings.base_url, "https://docs.example.com/api");
        assert_eq!(settings.poll_interval, Duration::from_secs(3));
        assert_eq!(settings.timeout, Duration::from_secs(7));
    }

    #[test]
    fn site_url_must_be_http() {
        let mut config = minimal_config();
        config.seo.site_url = Some("example.com".to_string());
        assert!(config.validate().is_err());

        let mut config = minimal_config();
        config.seo.site_url = Some("https://example.com/".to_string());
        assert_eq!(
            config.validate().unwrap().seo.site_url.as_deref(),
            Some("https://example.com")
        );
    }
}
