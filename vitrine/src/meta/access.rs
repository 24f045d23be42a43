// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Path-keyed access to the metadata store.
//!
//! Reads and writes fail differently on purpose: read paths (`get_all`,
//! `get_by_path`, subscription refetches) log and fall back to empty or
//! absent values so public pages always render, while write paths
//! (`upsert`, `delete`) hand the error back to the caller.

use super::error::{MetaError, StoreError};
use super::path::PagePath;
use super::record::{MetaInput, MetaRecord};
use super::store::{MetaStore, StoreChange};
use super::subscription::{Liveness, Subscription};
use chrono::Utc;
use log::{debug, error, warn};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

/// Result of a read that distinguishes an unreachable store from an empty one.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T> {
    Fresh(T),
    Unreachable(String),
}

impl<T> ReadOutcome<T> {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ReadOutcome::Unreachable(_))
    }

    pub fn fresh(self) -> Option<T> {
        match self {
            ReadOutcome::Fresh(value) => Some(value),
            ReadOutcome::Unreachable(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct MetaAccess {
    store: Arc<dyn MetaStore>,
}

impl MetaAccess {
    pub fn new(store: Arc<dyn MetaStore>) -> Self {
        Self { store }
    }

    pub fn describe(&self) -> String {
        self.store.describe()
    }

    pub async fn fetch_all(&self) -> ReadOutcome<Vec<MetaRecord>> {
        match self.store.list().await {
            Ok(records) => ReadOutcome::Fresh(records),
            Err(err) => {
                warn!("Metadata listing failed: {}", err);
                ReadOutcome::Unreachable(err.to_string())
            }
        }
    }

    /// All records, newest first. Empty when the store is unreachable.
    pub async fn get_all(&self) -> Vec<MetaRecord> {
        self.fetch_all().await.fresh().unwrap_or_default()
    }

    pub async fn get_by_path(&self, path: &str) -> Option<MetaRecord> {
        let document_id = PagePath::parse(path).document_id();
        read_soft(self.store.get(&document_id).await, "get metadata")
    }

    pub async fn upsert(&self, input: &MetaInput) -> Result<MetaRecord, MetaError> {
        if input.page_path.trim().is_empty() {
            return Err(MetaError::Validation("Page path is required".to_string()));
        }

        let page_path = PagePath::parse(&input.page_path);
        let document_id = page_path.document_id();

        let record = write_strict(
            self.store
                .merge(&document_id, page_path.as_str(), input, Utc::now())
                .await,
            "upsert metadata",
        )?;

        log::info!("Metadata saved for {} ({})", record.page_path, document_id);
        Ok(record)
    }

    pub async fn delete(&self, path: &str) -> Result<(), MetaError> {
        let page_path = PagePath::parse(path);
        let document_id = page_path.document_id();
        write_strict(self.store.remove(&document_id).await, "delete metadata")?;
        log::info!("Metadata deleted for {} ({})", page_path, document_id);
        Ok(())
    }

    /// Delivers the record for `path` (or `None`) now and after every change to it.
    pub async fn subscribe_one<F>(&self, path: &str, callback: F) -> Result<Subscription, MetaError>
    where
        F: Fn(Option<MetaRecord>) + Send + Sync + 'static,
    {
        let page_path = PagePath::parse(path);
        let document_id = page_path.document_id();
        let changes = self.open_feed(page_path.as_str()).await?;

        let store = self.store.clone();
        let liveness = Liveness::new();
        let task_liveness = liveness.clone();
        let task = tokio::spawn(async move {
            let mut changes = changes;
            loop {
                let refreshed = read_soft_keep(store.get(&document_id).await, "refresh metadata");
                if let Some(record) = refreshed
                    && task_liveness.is_live()
                {
                    callback(record);
                }
                if !next_relevant_change(&mut changes, &task_liveness, |change| {
                    change.document_id == document_id
                })
                .await
                {
                    break;
                }
            }
        });

        Ok(Subscription::new(
            format!("meta:{}", page_path),
            liveness,
            task,
        ))
    }

    /// Delivers the full ordered list now and after every change in the collection.
    pub async fn subscribe_all<F>(&self, callback: F) -> Result<Subscription, MetaError>
    where
        F: Fn(Vec<MetaRecord>) + Send + Sync + 'static,
    {
        let changes = self.open_feed("*").await?;

        let store = self.store.clone();
        let liveness = Liveness::new();
        let task_liveness = liveness.clone();
        let task = tokio::spawn(async move {
            let mut changes = changes;
            loop {
                let refreshed = read_soft_keep(store.list().await, "refresh metadata listing");
                if let Some(records) = refreshed
                    && task_liveness.is_live()
                {
                    callback(records);
                }
                if !next_relevant_change(&mut changes, &task_liveness, |_| true).await {
                    break;
                }
            }
        });

        Ok(Subscription::new("meta:*".to_string(), liveness, task))
    }

    async fn open_feed(&self, target: &str) -> Result<broadcast::Receiver<StoreChange>, MetaError> {
        self.store.watch().await.map_err(|err| {
            warn!("Metadata subscription for {} could not be set up: {}", target, err);
            MetaError::from(err)
        })
    }
}

/// Waits until a change matching `relevant` arrives. A lagged receiver counts
/// as relevant since the skipped changes are unknown. Returns `false` once the
/// feed closes or the subscription is cancelled.
async fn next_relevant_change<R>(
    changes: &mut broadcast::Receiver<StoreChange>,
    liveness: &Liveness,
    relevant: R,
) -> bool
where
    R: Fn(&StoreChange) -> bool,
{
    while liveness.is_live() {
        match changes.recv().await {
            Ok(change) if relevant(&change) => {
                debug!(
                    "Metadata change {} (revision {})",
                    change.document_id, change.revision
                );
                return liveness.is_live();
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                debug!("Metadata change feed lagged by {} message(s)", skipped);
                return liveness.is_live();
            }
            Err(RecvError::Closed) => return false,
        }
    }
    false
}

/// Read-path policy: log and fall back to the default value.
fn read_soft<T: Default>(result: Result<T, StoreError>, operation: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!("Failed to {}: {}", operation, err);
            T::default()
        }
    }
}

/// Read-path policy for live feeds: log and skip, so the last delivered value stands.
fn read_soft_keep<T>(result: Result<T, StoreError>, operation: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Failed to {}; keeping last delivered value: {}", operation, err);
            None
        }
    }
}

/// Write-path policy: log and surface the error to the caller.
fn write_strict<T>(result: Result<T, StoreError>, operation: &str) -> Result<T, MetaError> {
    result.map_err(|err| {
        error!("Failed to {}: {}", operation, err);
        MetaError::from(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::file_store::FileMetaStore;
    use crate::meta::record::RobotsDirective;
    use crate::util::test_fixtures::TestFixtureRoot;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct UnreachableStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetaStore for UnreachableStore {
        async fn list(&self) -> Result<Vec<MetaRecord>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::new("connection refused"))
        }

        async fn get(&self, _document_id: &str) -> Result<Option<MetaRecord>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::new("connection refused"))
        }

        async fn merge(
            &self,
            _document_id: &str,
            _page_path: &str,
            _input: &MetaInput,
            _now: DateTime<Utc>,
        ) -> Result<MetaRecord, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::new("connection refused"))
        }

        async fn remove(&self, _document_id: &str) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::new("connection refused"))
        }

        async fn watch(&self) -> Result<broadcast::Receiver<StoreChange>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::new("connection refused"))
        }

        fn describe(&self) -> String {
            "unreachable".to_string()
        }
    }

    /// File store that answers every call after a fixed latency, so
    /// overlapping requests interleave the way they do against a remote API.
    struct SlowStore {
        inner: FileMetaStore,
        latency: Duration,
    }

    #[async_trait]
    impl MetaStore for SlowStore {
        async fn list(&self) -> Result<Vec<MetaRecord>, StoreError> {
            tokio::time::sleep(self.latency).await;
            self.inner.list().await
        }

        async fn get(&self, document_id: &str) -> Result<Option<MetaRecord>, StoreError> {
            tokio::time::sleep(self.latency).await;
            self.inner.get(document_id).await
        }

        async fn merge(
            &self,
            document_id: &str,
            page_path: &str,
            input: &MetaInput,
            now: DateTime<Utc>,
        ) -> Result<MetaRecord, StoreError> {
            tokio::time::sleep(self.latency).await;
            self.inner.merge(document_id, page_path, input, now).await
        }

        async fn remove(&self, document_id: &str) -> Result<(), StoreError> {
            tokio::time::sleep(self.latency).await;
            self.inner.remove(document_id).await
        }

        async fn watch(&self) -> Result<broadcast::Receiver<StoreChange>, StoreError> {
            self.inner.watch().await
        }

        fn describe(&self) -> String {
            format!("slow:{}", self.inner.describe())
        }
    }

    fn unreachable_access() -> (MetaAccess, Arc<UnreachableStore>) {
        let store = Arc::new(UnreachableStore {
            calls: AtomicUsize::new(0),
        });
        (MetaAccess::new(store.clone()), store)
    }

    fn file_access(fixture: &TestFixtureRoot) -> MetaAccess {
        let store = FileMetaStore::open(&fixture.path().join("meta_tags.yaml")).unwrap();
        MetaAccess::new(Arc::new(store))
    }

    async fn eventually<F: Fn() -> bool>(check: F) -> bool {
        for _ in 0..200 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check()
    }

    #[tokio::test]
    async fn upsert_rejects_blank_path_without_touching_store() {
        let (access, store) = unreachable_access();
        let err = access
            .upsert(&MetaInput::for_path("   "))
            .await
            .expect_err("blank path rejected");
        assert!(err.is_validation());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reads_degrade_and_writes_surface_when_unreachable() {
        let (access, _) = unreachable_access();
        assert!(access.get_all().await.is_empty());
        assert!(access.fetch_all().await.is_unreachable());
        assert!(access.get_by_path("/services").await.is_none());

        let err = access
            .upsert(&MetaInput::for_path("/services"))
            .await
            .expect_err("write surfaces");
        assert!(matches!(err, MetaError::Connectivity(_)));
        assert!(matches!(
            access.delete("/services").await,
            Err(MetaError::Connectivity(_))
        ));
    }

    #[tokio::test]
    async fn subscription_setup_failure_is_reported() {
        let (access, _) = unreachable_access();
        let result = access.subscribe_one("/", |_| {}).await;
        assert!(matches!(result, Err(MetaError::Connectivity(_))));
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips_fields() {
        let fixture = TestFixtureRoot::new_unique("access-round-trip").unwrap();
        let access = file_access(&fixture);
        let input = MetaInput {
            title: Some("Our Services".to_string()),
            description: Some("What we build".to_string()),
            keywords: Some("rust, web".to_string()),
            og_title: Some("Services".to_string()),
            og_description: Some("Social copy".to_string()),
            og_image: Some("https://cdn.example.com/og.png".to_string()),
            canonical_url: Some("https://example.com/services".to_string()),
            robots: Some(RobotsDirective::IndexNofollow),
            ..MetaInput::for_path("services")
        };
        access.upsert(&input).await.unwrap();

        let stored = access.get_by_path("/services").await.expect("stored");
        assert_eq!(stored.page_path, "/services");
        assert_eq!(stored.title, input.title);
        assert_eq!(stored.description, input.description);
        assert_eq!(stored.keywords, input.keywords);
        assert_eq!(stored.og_title, input.og_title);
        assert_eq!(stored.og_description, input.og_description);
        assert_eq!(stored.og_image, input.og_image);
        assert_eq!(stored.canonical_url, input.canonical_url);
        assert_eq!(stored.robots, RobotsDirective::IndexNofollow);
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn second_upsert_merges_instead_of_replacing() {
        let fixture = TestFixtureRoot::new_unique("access-merge").unwrap();
        let access = file_access(&fixture);
        let first = access
            .upsert(&MetaInput {
                title: Some("A".to_string()),
                ..MetaInput::for_path("/x")
            })
            .await
            .unwrap();
        access
            .upsert(&MetaInput {
                description: Some("B".to_string()),
                ..MetaInput::for_path("/x")
            })
            .await
            .unwrap();

        let stored = access.get_by_path("/x").await.unwrap();
        assert_eq!(stored.title.as_deref(), Some("A"));
        assert_eq!(stored.description.as_deref(), Some("B"));
        assert_eq!(stored.created_at, first.created_at);
    }

    #[tokio::test]
    async fn concurrent_upserts_of_different_fields_both_survive() {
        let fixture = TestFixtureRoot::new_unique("access-concurrent-upsert").unwrap();
        let store = SlowStore {
            inner: FileMetaStore::open(&fixture.path().join("meta_tags.yaml")).unwrap(),
            latency: Duration::from_millis(20),
        };
        let access = MetaAccess::new(Arc::new(store));

        let title = MetaInput {
            title: Some("T".to_string()),
            ..MetaInput::for_path("/x")
        };
        let description = MetaInput {
            description: Some("D".to_string()),
            ..MetaInput::for_path("/x")
        };
        let (first, second) = tokio::join!(access.upsert(&title), access.upsert(&description));
        first.unwrap();
        second.unwrap();

        let stored = access.get_by_path("/x").await.unwrap();
        assert_eq!(stored.title.as_deref(), Some("T"));
        assert_eq!(stored.description.as_deref(), Some("D"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let fixture = TestFixtureRoot::new_unique("access-delete").unwrap();
        let access = file_access(&fixture);
        access.upsert(&MetaInput::for_path("/x")).await.unwrap();
        access.delete("/x").await.unwrap();
        access.delete("/x").await.unwrap();
        assert!(access.get_by_path("/x").await.is_none());
    }

    #[tokio::test]
    async fn root_and_home_are_distinct_records() {
        let fixture = TestFixtureRoot::new_unique("access-root").unwrap();
        let access = file_access(&fixture);
        access
            .upsert(&MetaInput {
                title: Some("Root".to_string()),
                ..MetaInput::for_path("/")
            })
            .await
            .unwrap();
        access
            .upsert(&MetaInput {
                title: Some("Home page".to_string()),
                ..MetaInput::for_path("/home")
            })
            .await
            .unwrap();

        assert_eq!(
            access.get_by_path("").await.unwrap().title.as_deref(),
            Some("Root")
        );
        assert_eq!(
            access.get_by_path("/home").await.unwrap().title.as_deref(),
            Some("Home page")
        );
        assert_eq!(access.get_all().await.len(), 2);
    }

    #[tokio::test]
    async fn subscribe_one_delivers_initial_value_and_changes() {
        let fixture = TestFixtureRoot::new_unique("access-subscribe-one").unwrap();
        let access = file_access(&fixture);
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let subscription = access
            .subscribe_one("/about", move |record| {
                sink.lock()
                    .unwrap()
                    .push(record.and_then(|record| record.title));
            })
            .await
            .unwrap();

        assert!(eventually(|| seen.lock().unwrap().len() == 1).await);
        access
            .upsert(&MetaInput {
                title: Some("About".to_string()),
                ..MetaInput::for_path("/about")
            })
            .await
            .unwrap();
        access
            .upsert(&MetaInput {
                title: Some("Other".to_string()),
                ..MetaInput::for_path("/contact")
            })
            .await
            .unwrap();

        assert!(eventually(|| seen.lock().unwrap().len() >= 2).await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let values = seen.lock().unwrap().clone();
        assert_eq!(values, vec![None, Some("About".to_string())]);
        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn no_delivery_after_unsubscribe() {
        let fixture = TestFixtureRoot::new_unique("access-unsubscribe").unwrap();
        let access = file_access(&fixture);
        let count = Arc::new(AtomicUsize::new(0));
        let sink = count.clone();

        let subscription = access
            .subscribe_all(move |_| {
                sink.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        assert!(eventually(|| count.load(Ordering::SeqCst) == 1).await);

        subscription.unsubscribe();
        access.upsert(&MetaInput::for_path("/x")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subscribe_all_delivers_ordered_list() {
        let fixture = TestFixtureRoot::new_unique("access-subscribe-all").unwrap();
        let access = file_access(&fixture);
        let latest: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = latest.clone();

        let _subscription = access
            .subscribe_all(move |records| {
                *sink.lock().unwrap() = records.into_iter().map(|r| r.page_path).collect();
            })
            .await
            .unwrap();

        access.upsert(&MetaInput::for_path("/a")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        access.upsert(&MetaInput::for_path("/b")).await.unwrap();

        assert!(eventually(|| latest.lock().unwrap().len() == 2).await);
        assert_eq!(
            latest.lock().unwrap().clone(),
            vec!["/b".to_string(), "/a".to_string()]
        );
    }
}
