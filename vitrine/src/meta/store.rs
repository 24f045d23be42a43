// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error::StoreError;
use super::record::{MetaInput, MetaRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

const CHANGE_FEED_DEPTH: usize = 64;

/// Notification that a document was written or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub document_id: String,
    pub revision: u64,
}

/// A collection of metadata documents keyed by document id.
#[async_trait]
pub trait MetaStore: Send + Sync {
    async fn list(&self) -> Result<Vec<MetaRecord>, StoreError>;

    async fn get(&self, document_id: &str) -> Result<Option<MetaRecord>, StoreError>;

    /// Applies `input` to the stored document (or an empty one) as a single
    /// step and returns the merged record. Concurrent merges touching
    /// different fields never drop each other's values.
    async fn merge(
        &self,
        document_id: &str,
        page_path: &str,
        input: &MetaInput,
        now: DateTime<Utc>,
    ) -> Result<MetaRecord, StoreError>;

    /// Removing a missing document is not an error.
    async fn remove(&self, document_id: &str) -> Result<(), StoreError>;

    /// Opens a change feed. An error means the store cannot be watched at all.
    async fn watch(&self) -> Result<broadcast::Receiver<StoreChange>, StoreError>;

    fn describe(&self) -> String;
}

/// Broadcast side of a store's change notifications.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<StoreChange>,
    revision: Arc<AtomicU64>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_FEED_DEPTH);
        Self {
            sender,
            revision: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn publish(&self, document_id: &str) -> u64 {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        // No receivers is fine; nobody is watching yet.
        let _ = self.sender.send(StoreChange {
            document_id: document_id.to_string(),
            revision,
        });
        revision
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
