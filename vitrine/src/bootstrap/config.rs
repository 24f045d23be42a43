// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{BootstrapError, log_action};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WORKERS: u16 = 4;

pub fn ensure_config(root: &Path) -> Result<bool, BootstrapError> {
    let config_path = root.join("config.yaml");
    if config_path.exists() {
        return Ok(false);
    }

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&config_path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(BootstrapError::Io(err)),
    };

    file.write_all(default_config_yaml().as_bytes())?;
    file.sync_all()?;

    log_action(format!(
        "created config.yaml (http {}, file metadata store)",
        DEFAULT_PORT
    ));

    Ok(true)
}

pub(super) fn normalize_root(root: &Path) -> Result<PathBuf, BootstrapError> {
    let root_path = if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root.to_path_buf()
    };

    if root_path.exists() {
        if !root_path.is_dir() {
            return Err(BootstrapError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Runtime root is not a directory: {}", root_path.display()),
            )));
        }
        return Ok(root_path);
    }

    fs::create_dir_all(&root_path)?;
    log_action(format!(
        "created runtime root directory {}",
        root_path.display()
    ));
    Ok(root_path)
}

fn default_config_yaml() -> String {
    format!(
        r#"server:
  host: "0.0.0.0"
  port: {port}
  workers: {workers}

admin:
  path: "/seo-dashboard"

app:
  name: "Vitrine"
  description: "Digital services agency"

logging:
  level: "info"

seo:
  default_title: "Vitrine | Digital Services Agency"
  default_description: "We design, build and grow websites and digital products."
  default_keywords: "web development, design, digital agency"
  default_og_image: "/default-og-image.jpg"
  # site_url: "https://www.example.com"

store:
  backend: "file"
  # backend: "remote"
  # remote:
  #   base_url: "http://127.0.0.1:9000/v1"
  #   collection: "metaTags"
  #   poll_interval_seconds: 5
  #   timeout_seconds: 10

theme:
  default: "dark"
"#,
        port = DEFAULT_PORT,
        workers = DEFAULT_WORKERS,
    )
}
