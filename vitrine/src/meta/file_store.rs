// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error::StoreError;
use super::record::{MetaInput, MetaRecord, sort_by_recency};
use super::store::{ChangeFeed, MetaStore, StoreChange};
use crate::util::yaml_store::{read_yaml_file, write_yaml_file};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::error;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::sync::broadcast;

const STORE_LABEL: &str = "metadata store";

type Documents = BTreeMap<String, MetaRecord>;

/// Metadata collection persisted as a single YAML document map.
pub struct FileMetaStore {
    path: PathBuf,
    documents: RwLock<Documents>,
    feed: ChangeFeed,
}

impl FileMetaStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let documents: Documents = read_yaml_file(path, STORE_LABEL)?.unwrap_or_default();
        log::info!(
            "Loaded {} metadata record(s) from {}",
            documents.len(),
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            documents: RwLock::new(documents),
            feed: ChangeFeed::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn snapshot(&self) -> Result<Documents, StoreError> {
        match self.documents.read() {
            Ok(documents) => Ok(documents.clone()),
            Err(_) => {
                error!("🚨 CRITICAL: FileMetaStore read lock poisoned");
                Err(StoreError::new("Metadata store lock poisoned"))
            }
        }
    }

    fn mutate<F>(&self, document_id: &str, apply: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut Documents) -> bool,
    {
        let mut documents = match self.documents.write() {
            Ok(documents) => documents,
            Err(_) => {
                error!("🚨 CRITICAL: FileMetaStore write lock poisoned");
                return Err(StoreError::new("Metadata store lock poisoned"));
            }
        };

        let mut next = documents.clone();
        if !apply(&mut next) {
            return Ok(false);
        }
        write_yaml_file(&self.path, STORE_LABEL, &next)?;
        *documents = next;
        drop(documents);

        self.feed.publish(document_id);
        Ok(true)
    }
}

#[async_trait]
impl MetaStore for FileMetaStore {
    async fn list(&self) -> Result<Vec<MetaRecord>, StoreError> {
        let mut records: Vec<MetaRecord> = self.snapshot()?.into_values().collect();
        sort_by_recency(&mut records);
        Ok(records)
    }

    async fn get(&self, document_id: &str) -> Result<Option<MetaRecord>, StoreError> {
        match self.documents.read() {
            Ok(documents) => Ok(documents.get(document_id).cloned()),
            Err(_) => {
                error!("🚨 CRITICAL: FileMetaStore read lock poisoned in get");
                Err(StoreError::new("Metadata store lock poisoned"))
            }
        }
    }

    async fn merge(
        &self,
        document_id: &str,
        page_path: &str,
        input: &MetaInput,
        now: DateTime<Utc>,
    ) -> Result<MetaRecord, StoreError> {
        let mut merged = None;
        self.mutate(document_id, |documents| {
            let record =
                MetaRecord::merged(documents.get(document_id), page_path.to_string(), input, now);
            documents.insert(document_id.to_string(), record.clone());
            merged = Some(record);
            true
        })?;
        merged.ok_or_else(|| StoreError::new("Metadata merge produced no record"))
    }

    async fn remove(&self, document_id: &str) -> Result<(), StoreError> {
        self.mutate(document_id, |documents| {
            documents.remove(document_id).is_some()
        })?;
        Ok(())
    }

    async fn watch(&self) -> Result<broadcast::Receiver<StoreChange>, StoreError> {
        Ok(self.feed.subscribe())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
