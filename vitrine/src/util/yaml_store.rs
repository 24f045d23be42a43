// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Whole-file YAML documents replaced atomically on every write.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);
const MAX_TEMP_ATTEMPTS: u32 = 16;

#[derive(Debug)]
pub struct YamlStoreError {
    message: String,
}

impl YamlStoreError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for YamlStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for YamlStoreError {}

/// Reads `path`. A missing or blank file is `Ok(None)`.
pub fn read_yaml_file<T: DeserializeOwned>(
    path: &Path,
    label: &str,
) -> Result<Option<T>, YamlStoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(YamlStoreError::new(format!(
                "Failed to read {} file '{}': {}",
                label,
                path.display(),
                err
            )));
        }
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_yaml::from_str(&content).map(Some).map_err(|err| {
        YamlStoreError::new(format!(
            "Failed to parse {} file '{}': {}",
            label,
            path.display(),
            err
        ))
    })
}

/// Serializes `value` into a sibling temp file, syncs it, then renames it over `path`.
pub fn write_yaml_file<T: Serialize>(
    path: &Path,
    label: &str,
    value: &T,
) -> Result<(), YamlStoreError> {
    let content = serde_yaml::to_string(value)
        .map_err(|err| YamlStoreError::new(format!("Failed to serialize {}: {}", label, err)))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|err| {
        YamlStoreError::new(format!(
            "Failed to create {} directory '{}': {}",
            label,
            parent.display(),
            err
        ))
    })?;

    let (mut file, temp_path) = create_temp_file(path, label)?;
    let written = file
        .write_all(content.as_bytes())
        .and_then(|_| file.sync_all())
        .and_then(|_| fs::rename(&temp_path, path));
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(YamlStoreError::new(format!(
            "Failed to write {} file '{}': {}",
            label,
            path.display(),
            err
        )));
    }

    #[cfg(unix)]
    {
        if let Err(err) = fs::File::open(parent).and_then(|dir| dir.sync_all()) {
            log::warn!("Directory sync for {} failed: {}", label, err);
        }
    }

    Ok(())
}

fn create_temp_file(path: &Path, label: &str) -> Result<(fs::File, PathBuf), YamlStoreError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            YamlStoreError::new(format!(
                "Invalid {} file path '{}'",
                label,
                path.display()
            ))
        })?;

    for _ in 0..MAX_TEMP_ATTEMPTS {
        let sequence = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_path =
            path.with_file_name(format!(".{}.{}.{}.tmp", file_name, std::process::id(), sequence));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
        {
            Ok(file) => return Ok((file, temp_path)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(YamlStoreError::new(format!(
                    "Failed to create temp {} file: {}",
                    label, err
                )));
            }
        }
    }
    Err(YamlStoreError::new(format!(
        "Failed to create temp {} file after {} attempts",
        label, MAX_TEMP_ATTEMPTS
    )))
}
