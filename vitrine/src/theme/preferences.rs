// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::util::yaml_store::{YamlStoreError, read_yaml_file, write_yaml_file};
use log::error;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const PREFERENCES_LABEL: &str = "preferences";

#[derive(Debug)]
pub struct PreferenceError {
    message: String,
}

impl PreferenceError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for PreferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PreferenceError {}

impl From<YamlStoreError> for PreferenceError {
    fn from(err: YamlStoreError) -> Self {
        PreferenceError::new(err.message())
    }
}

/// Small string key-value store for user-facing preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Preferences kept in `state/preferences.yaml`.
pub struct FilePreferenceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        Ok(read_yaml_file(&self.path, PREFERENCES_LABEL)?.unwrap_or_default())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let _guard = self.write_lock.lock().map_err(|_| {
            error!("🚨 CRITICAL: FilePreferenceStore write lock poisoned");
            PreferenceError::new("Preference store lock poisoned")
        })?;
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        write_yaml_file(&self.path, PREFERENCES_LABEL, &values)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let values = self
            .values
            .lock()
            .map_err(|_| PreferenceError::new("Preference store lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| PreferenceError::new("Preference store lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
