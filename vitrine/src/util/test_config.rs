// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use crate::config::{
    AdminConfig, AppConfig, LoggingConfig, RemoteStoreConfig, SeoConfig, ServerConfig,
    ThemeConfig, ValidatedConfig, ValidatedStoreConfig,
};
use crate::theme::ThemeMode;

#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: ValidatedConfig,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ValidatedConfig {
                server: ServerConfig {
                    host: "127.0.0.1".to_string(),
                    port: 5466,
                    workers: 1,
                },
                admin: AdminConfig {
                    path: "/seo-dashboard".to_string(),
                },
                app: AppConfig {
                    name: "Test Agency".to_string(),
                    description: "Test Description".to_string(),
                },
                logging: LoggingConfig {
                    level: "info".to_string(),
                },
                seo: SeoConfig {
                    default_title: "Test Agency | Digital Services".to_string(),
                    default_description: "Default test description".to_string(),
                    default_keywords: "agency, web, design".to_string(),
                    default_og_image: "/default-og-image.jpg".to_string(),
                    site_url: Some("https://agency.test".to_string()),
                },
                store: ValidatedStoreConfig::File,
                theme: ThemeConfig::default(),
            },
        }
    }

    pub fn with_admin_path(mut self, path: &str) -> Self {
        self.config.admin.path = path.to_string();
        self
    }

    pub fn with_site_url(mut self, site_url: Option<&str>) -> Self {
        self.config.seo.site_url = site_url.map(str::to_string);
        self
    }

    pub fn with_remote_store(mut self, base_url: &str) -> Self {
        self.config.store = ValidatedStoreConfig::Remote(RemoteStoreConfig {
            base_url: base_url.to_string(),
            collection: "metaTags".to_string(),
            poll_interval_seconds: 1,
            timeout_seconds: 1,
        });
        self
    }

    pub fn with_default_theme(mut self, theme: ThemeMode) -> Self {
        self.config.theme.default = theme;
        self
    }

    pub fn build(self) -> ValidatedConfig {
        self.config
    }
}

pub fn test_config() -> ValidatedConfig {
    TestConfigBuilder::new().build()
}
