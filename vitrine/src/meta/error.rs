// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::error::Error;
use std::fmt;

/// Failure reported by a metadata store backend.
#[derive(Debug, Clone)]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for StoreError {}

impl From<crate::util::yaml_store::YamlStoreError> for StoreError {
    fn from(err: crate::util::yaml_store::YamlStoreError) -> Self {
        StoreError::new(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub enum MetaError {
    /// Malformed input, rejected before the store is contacted.
    Validation(String),
    /// The store is unreachable or misconfigured.
    Connectivity(String),
}

impl MetaError {
    pub fn message(&self) -> &str {
        match self {
            MetaError::Validation(msg) | MetaError::Connectivity(msg) => msg,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, MetaError::Validation(_))
    }
}

impl fmt::Display for MetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaError::Validation(msg) => write!(f, "Validation error: {}", msg),
            MetaError::Connectivity(msg) => write!(f, "Metadata store unavailable: {}", msg),
        }
    }
}

impl Error for MetaError {}

impl From<StoreError> for MetaError {
    fn from(err: StoreError) -> Self {
        MetaError::Connectivity(err.message)
    }
}
