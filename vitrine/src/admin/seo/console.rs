// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::meta::{MetaAccess, MetaRecord, PagePath, Subscription};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// What the dashboard knows about the record collection.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedState {
    Connecting,
    Live(Vec<MetaRecord>),
    Unavailable(String),
}

impl FeedState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedState::Connecting => "connecting",
            FeedState::Live(_) => "live",
            FeedState::Unavailable(_) => "unavailable",
        }
    }

    fn is_settled(&self) -> bool {
        !matches!(self, FeedState::Connecting)
    }
}

/// Holds the dashboard's `subscribe_all` feed. The list is only ever
/// replaced by deliveries from the feed, never edited locally.
pub struct SeoConsole {
    access: MetaAccess,
    subscription: Mutex<Option<Subscription>>,
    state: Arc<watch::Sender<FeedState>>,
    connect_lock: tokio::sync::Mutex<()>,
}

impl SeoConsole {
    pub fn new(access: MetaAccess) -> Self {
        let (state, _) = watch::channel(FeedState::Connecting);
        Self {
            access,
            subscription: Mutex::new(None),
            state: Arc::new(state),
            connect_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn access(&self) -> &MetaAccess {
        &self.access
    }

    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Opens the feed when it was never opened or the last attempt failed.
    /// A live feed is left alone.
    pub async fn ensure_connected(&self) {
        let _guard = self.connect_lock.lock().await;
        let needs_connect = match self.subscription.lock() {
            Ok(subscription) => {
                subscription.is_none()
                    || matches!(*self.state.borrow(), FeedState::Unavailable(_))
            }
            Err(_) => {
                error!("🚨 CRITICAL: SeoConsole lock poisoned in ensure_connected");
                false
            }
        };
        if needs_connect {
            self.connect().await;
        }
    }

    async fn connect(&self) {
        self.state.send_replace(FeedState::Connecting);
        info!("Connecting SEO dashboard feed to {}", self.access.describe());

        let state = self.state.clone();
        let result = self
            .access
            .subscribe_all(move |records| {
                debug!("SEO dashboard received {} records", records.len());
                state.send_replace(FeedState::Live(records));
            })
            .await;

        match result {
            Ok(subscription) => match self.subscription.lock() {
                Ok(mut slot) => {
                    if let Some(previous) = slot.replace(subscription) {
                        previous.unsubscribe();
                    }
                }
                Err(_) => error!("🚨 CRITICAL: SeoConsole lock poisoned in connect"),
            },
            Err(err) => {
                warn!("SEO dashboard feed unavailable: {}", err);
                self.state
                    .send_replace(FeedState::Unavailable(err.message().to_string()));
            }
        }
    }

    /// Waits up to `timeout` for the feed to leave `Connecting`.
    pub async fn settled(&self, timeout: Duration) -> FeedState {
        let mut receiver = self.state.subscribe();
        let waited = tokio::time::timeout(timeout, async {
            receiver
                .wait_for(FeedState::is_settled)
                .await
                .map(|state| state.clone())
        })
        .await;
        match waited {
            Ok(Ok(state)) => state,
            _ => self.state(),
        }
    }

    /// The record for `path` in the last delivered list.
    pub fn find(&self, path: &str) -> Option<MetaRecord> {
        let target = PagePath::parse(path);
        match &*self.state.borrow() {
            FeedState::Live(records) => records
                .iter()
                .find(|record| record.page_path == target.as_str())
                .cloned(),
            _ => None,
        }
    }
}
