// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub state_dir: PathBuf,
    pub meta_store_file: PathBuf,
    pub preferences_file: PathBuf,
}

impl RuntimePaths {
    pub fn from_root(root: &Path) -> Result<Self, ConfigError> {
        let root_path = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root.to_path_buf()
        };

        ensure_dir_exists(&root_path)?;
        let root_canonical = canonicalize(&root_path, "runtime root")?;

        let config_file = root_canonical.join("config.yaml");
        ensure_file_writable(&config_file, "Config file must be writable")?;

        let state_dir = root_canonical.join("state");
        ensure_dir_exists(&state_dir)?;
        ensure_dir_writable(&state_dir, "State directory must be writable")?;
        let state_dir = canonicalize(&state_dir, "state directory")?;

        Ok(Self {
            root: root_canonical,
            config_file,
            meta_store_file: state_dir.join("meta_tags.yaml"),
            preferences_file: state_dir.join("preferences.yaml"),
            state_dir,
        })
    }
}

fn canonicalize(path: &Path, label: &str) -> Result<PathBuf, ConfigError> {
    path.canonicalize().map_err(|e| {
        ConfigError::ValidationError(format!(
            "Failed to canonicalize {} '{}': {}",
            label,
            path.display(),
            e
        ))
    })
}

fn ensure_dir_exists(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| {
        ConfigError::ValidationError(format!(
            "Failed to create directory '{}': {}",
            path.display(),
            e
        ))
    })
}

fn ensure_dir_writable(path: &Path, context: &str) -> Result<(), ConfigError> {
    if !path.is_dir() {
        return Err(ConfigError::ValidationError(format!(
            "{} (not a directory): {}",
            context,
            path.display()
        )));
    }

    let probe_path = path.join(format!(".vitrine-write-check-{}", Uuid::new_v4()));
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe_path)
        .map_err(|err| {
            ConfigError::ValidationError(format!("{} ({}): {}", context, path.display(), err))
        })?;
    fs::remove_file(&probe_path).map_err(|err| {
        ConfigError::ValidationError(format!(
            "{} (unable to clean probe file {}): {}",
            context,
            probe_path.display(),
            err
        ))
    })
}

fn ensure_file_writable(path: &Path, context: &str) -> Result<(), ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::ValidationError(format!(
            "{} (not a file): {}",
            context,
            path.display()
        )));
    }

    fs::OpenOptions::new()
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|err| {
            ConfigError::ValidationError(format!("{} ({}): {}", context, path.display(), err))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;

    #[test]
    fn creates_state_dir_and_derives_files() {
        let fixture = TestFixtureRoot::new_unique("runtime-paths").unwrap();
        fs::write(fixture.path().join("config.yaml"), "").unwrap();

        let paths = RuntimePaths::from_root(fixture.path()).unwrap();

        assert!(paths.state_dir.is_dir());
        assert!(paths.root.is_absolute());
        assert_eq!(paths.meta_store_file, paths.state_dir.join("meta_tags.yaml"));
        assert_eq!(
            paths.preferences_file,
            paths.state_dir.join("preferences.yaml")
        );
    }

    #[test]
    fn requires_config_file() {
        let fixture = TestFixtureRoot::new_unique("runtime-paths-no-config").unwrap();
        let err = RuntimePaths::from_root(fixture.path()).expect_err("config required");
        assert!(err.to_string().contains("Config file"));
    }
}
