// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Per-route binding between a page path and its live metadata record.

use super::access::MetaAccess;
use super::head::{HeadTags, SeoDefaults, resolve_head};
use super::path::PagePath;
use super::record::MetaRecord;
use super::subscription::Subscription;
use log::{debug, error, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub enum BindingState {
    Loading,
    /// First delivery arrived; `None` means no record exists for the path.
    Bound(Option<MetaRecord>),
    /// The subscription could not be set up. Stays until the next `bind`.
    Unavailable,
}

impl BindingState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, BindingState::Loading)
    }
}

struct Binding {
    path: Option<PagePath>,
    subscription: Option<Subscription>,
}

pub struct PageMetaBinder {
    access: MetaAccess,
    binding: Mutex<Binding>,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<BindingState>>,
}

impl PageMetaBinder {
    pub fn new(access: MetaAccess) -> Self {
        let (state, _) = watch::channel(BindingState::Loading);
        Self {
            access,
            binding: Mutex::new(Binding {
                path: None,
                subscription: None,
            }),
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    /// Binds to `path` unless already bound to it.
    pub async fn mount(&self, path: &str) {
        let target = PagePath::parse(path);
        if self.path().as_ref() == Some(&target) && self.has_live_subscription() {
            return;
        }
        self.bind(target.as_str()).await;
    }

    /// Replaces any previous binding with a fresh subscription to `path`.
    pub async fn bind(&self, path: &str) {
        let target = PagePath::parse(path);
        let generation = match self.binding.lock() {
            Ok(mut binding) => {
                if let Some(previous) = binding.subscription.take() {
                    previous.unsubscribe();
                }
                binding.path = Some(target.clone());
                self.generation.fetch_add(1, Ordering::SeqCst) + 1
            }
            Err(_) => {
                error!("🚨 CRITICAL: PageMetaBinder lock poisoned in bind");
                self.state.send_replace(BindingState::Unavailable);
                return;
            }
        };
        self.state.send_replace(BindingState::Loading);

        let current = self.generation.clone();
        let state = self.state.clone();
        let result = self
            .access
            .subscribe_one(target.as_str(), move |record| {
                if current.load(Ordering::SeqCst) == generation {
                    state.send_replace(BindingState::Bound(record));
                }
            })
            .await;

        match result {
            Ok(subscription) => match self.binding.lock() {
                Ok(mut binding) => {
                    if self.generation.load(Ordering::SeqCst) == generation {
                        binding.subscription = Some(subscription);
                        debug!("Binder mounted on {}", target);
                    } else {
                        subscription.unsubscribe();
                    }
                }
                Err(_) => {
                    error!("🚨 CRITICAL: PageMetaBinder lock poisoned in bind");
                }
            },
            Err(err) => {
                if self.generation.load(Ordering::SeqCst) == generation {
                    warn!("Metadata for {} unavailable, using defaults: {}", target, err);
                    self.state.send_replace(BindingState::Unavailable);
                }
            }
        }
    }

    pub fn unmount(&self) {
        match self.binding.lock() {
            Ok(mut binding) => {
                self.generation.fetch_add(1, Ordering::SeqCst);
                if let Some(subscription) = binding.subscription.take() {
                    subscription.unsubscribe();
                }
                binding.path = None;
            }
            Err(_) => error!("🚨 CRITICAL: PageMetaBinder lock poisoned in unmount"),
        }
        self.state.send_replace(BindingState::Loading);
    }

    pub fn state(&self) -> BindingState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<BindingState> {
        self.state.subscribe()
    }

    pub fn path(&self) -> Option<PagePath> {
        match self.binding.lock() {
            Ok(binding) => binding.path.clone(),
            Err(_) => {
                error!("🚨 CRITICAL: PageMetaBinder lock poisoned in path");
                None
            }
        }
    }

    pub fn has_live_subscription(&self) -> bool {
        match self.binding.lock() {
            Ok(binding) => binding
                .subscription
                .as_ref()
                .is_some_and(Subscription::is_active),
            Err(_) => false,
        }
    }

    /// Waits up to `timeout` for the binding to leave `Loading`, then returns
    /// whatever state it is in.
    pub async fn settled(&self, timeout: Duration) -> BindingState {
        let mut receiver = self.state.subscribe();
        let waited = tokio::time::timeout(timeout, async {
            receiver
                .wait_for(BindingState::is_settled)
                .await
                .map(|state| state.clone())
        })
        .await;
        match waited {
            Ok(Ok(state)) => state,
            _ => self.state(),
        }
    }

    pub fn head_tags(&self, defaults: &SeoDefaults, origin: &str) -> HeadTags {
        let path = self.path().unwrap_or_else(PagePath::root);
        resolve_head(&self.state(), &path, defaults, origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::file_store::FileMetaStore;
    use crate::meta::record::MetaInput;
    use crate::meta::remote_store::{RemoteMetaStore, RemoteStoreSettings};
    use crate::util::test_fixtures::TestFixtureRoot;

    const WAIT: Duration = Duration::from_secs(2);

    fn file_access(fixture: &TestFixtureRoot) -> MetaAccess {
        let store = FileMetaStore::open(&fixture.path().join("meta_tags.yaml")).unwrap();
        MetaAccess::new(Arc::new(store))
    }

    async fn wait_until<F: Fn(&BindingState) -> bool>(binder: &PageMetaBinder, check: F) -> bool {
        let mut receiver = binder.watch();
        tokio::time::timeout(WAIT, receiver.wait_for(|state| check(state)))
            .await
            .is_ok()
    }

    #[tokio::test]
    async fn binds_to_absent_record() {
        let fixture = TestFixtureRoot::new_unique("binder-absent").unwrap();
        let binder = PageMetaBinder::new(file_access(&fixture));
        binder.mount("/unknown").await;

        assert_eq!(binder.settled(WAIT).await, BindingState::Bound(None));
        assert!(binder.has_live_subscription());
    }

    #[tokio::test]
    async fn follows_live_updates() {
        let fixture = TestFixtureRoot::new_unique("binder-live").unwrap();
        let access = file_access(&fixture);
        let binder = PageMetaBinder::new(access.clone());
        binder.mount("/about").await;
        binder.settled(WAIT).await;

        access
            .upsert(&MetaInput {
                title: Some("About us".to_string()),
                ..MetaInput::for_path("/about")
            })
            .await
            .unwrap();

        assert!(
            wait_until(&binder, |state| matches!(
                state,
                BindingState::Bound(Some(record)) if record.title.as_deref() == Some("About us")
            ))
            .await
        );
    }

    #[tokio::test]
    async fn rebinding_drops_previous_path() {
        let fixture = TestFixtureRoot::new_unique("binder-rebind").unwrap();
        let access = file_access(&fixture);
        let binder = PageMetaBinder::new(access.clone());
        binder.bind("/a").await;
        binder.settled(WAIT).await;
        binder.bind("/b").await;
        binder.settled(WAIT).await;

        access
            .upsert(&MetaInput {
                title: Some("A".to_string()),
                ..MetaInput::for_path("/a")
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(binder.path(), Some(PagePath::parse("/b")));
        assert_eq!(binder.state(), BindingState::Bound(None));
    }

    #[tokio::test]
    async fn unmount_stops_updates() {
        let fixture = TestFixtureRoot::new_unique("binder-unmount").unwrap();
        let access = file_access(&fixture);
        let binder = PageMetaBinder::new(access.clone());
        binder.mount("/x").await;
        binder.settled(WAIT).await;
        binder.unmount();

        access.upsert(&MetaInput::for_path("/x")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!binder.has_live_subscription());
        assert_eq!(binder.state(), BindingState::Loading);
    }

    #[tokio::test]
    async fn unmounting_one_binder_leaves_another_on_the_same_path_live() {
        let fixture = TestFixtureRoot::new_unique("binder-shared-path").unwrap();
        let access = file_access(&fixture);
        let first = PageMetaBinder::new(access.clone());
        let second = PageMetaBinder::new(access.clone());
        first.mount("/x").await;
        second.mount("/x").await;
        first.settled(WAIT).await;
        second.settled(WAIT).await;

        first.unmount();
        access
            .upsert(&MetaInput {
                title: Some("Still live".to_string()),
                ..MetaInput::for_path("/x")
            })
            .await
            .unwrap();

        assert!(
            wait_until(&second, |state| matches!(
                state,
                BindingState::Bound(Some(record)) if record.title.as_deref() == Some("Still live")
            ))
            .await
        );
        assert!(second.has_live_subscription());
        assert!(!first.has_live_subscription());
        assert_eq!(first.state(), BindingState::Loading);
    }

    #[tokio::test]
    async fn unreachable_store_makes_binding_unavailable() {
        let settings = RemoteStoreSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            collection: "metaTags".to_string(),
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_millis(500),
        };
        let store = RemoteMetaStore::new(&settings).unwrap();
        let binder = PageMetaBinder::new(MetaAccess::new(Arc::new(store)));
        binder.mount("/").await;

        assert_eq!(binder.state(), BindingState::Unavailable);
        assert!(!binder.has_live_subscription());
    }
}
