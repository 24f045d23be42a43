// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Process-wide light/dark preference.

pub mod handlers;
pub mod preferences;

use log::{error, info, warn};
use preferences::PreferenceStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub use handlers::configure;
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceError};

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(ThemeMode::Dark),
            "light" => Ok(ThemeMode::Light),
            other => Err(format!("Unknown theme '{}'", other)),
        }
    }
}

#[derive(Clone)]
pub struct ThemeState {
    current: Arc<watch::Sender<ThemeMode>>,
    store: Arc<dyn PreferenceStore>,
    toggle_lock: Arc<Mutex<()>>,
}

impl ThemeState {
    /// Reads the persisted preference. Missing or unreadable values fall back to `default`.
    pub fn load(store: Arc<dyn PreferenceStore>, default: ThemeMode) -> Self {
        let initial = match store.get(THEME_KEY) {
            Ok(Some(value)) => value.parse().unwrap_or_else(|err| {
                warn!("{}; using default theme '{}'", err, default);
                default
            }),
            Ok(None) => default,
            Err(err) => {
                warn!("Failed to read theme preference, using '{}': {}", default, err);
                default
            }
        };
        info!("Theme initialized to '{}'", initial);

        let (current, _) = watch::channel(initial);
        Self {
            current: Arc::new(current),
            store,
            toggle_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn current(&self) -> ThemeMode {
        *self.current.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemeMode> {
        self.current.subscribe()
    }

    /// Flips the theme, persists it and notifies subscribers. A failed persist
    /// is logged; the new value still applies for this process.
    pub fn toggle(&self) -> ThemeMode {
        let _guard = match self.toggle_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("🚨 CRITICAL: ThemeState toggle lock poisoned");
                poisoned.into_inner()
            }
        };

        let next = self.current().flipped();
        if let Err(err) = self.store.set(THEME_KEY, next.as_str()) {
            error!("Failed to persist theme '{}': {}", next, err);
        }
        self.current.send_replace(next);
        next
    }
}
