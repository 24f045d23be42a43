// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::access::MetaAccess;
use super::binder::PageMetaBinder;
use super::path::PagePath;
use log::{error, info};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Keeps one mounted binder per page path.
#[derive(Clone)]
pub struct BinderRegistry {
    access: MetaAccess,
    binders: Arc<RwLock<HashMap<PagePath, Arc<PageMetaBinder>>>>,
}

impl BinderRegistry {
    pub fn new(access: MetaAccess) -> Self {
        Self {
            access,
            binders: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn access(&self) -> &MetaAccess {
        &self.access
    }

    pub async fn mount_routes<'a, I>(&self, routes: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut mounted = 0;
        for route in routes {
            self.binder_for(route).await;
            mounted += 1;
        }
        info!("Mounted {} page metadata binder(s)", mounted);
    }

    /// Returns the binder for `path`, mounting a new one on first use.
    pub async fn binder_for(&self, path: &str) -> Arc<PageMetaBinder> {
        let key = PagePath::parse(path);
        if let Some(existing) = self.lookup(&key) {
            return existing;
        }

        let binder = Arc::new(PageMetaBinder::new(self.access.clone()));
        let binder = match self.binders.write() {
            Ok(mut binders) => {
                if let Some(raced) = binders.get(&key) {
                    return raced.clone();
                }
                binders.insert(key.clone(), binder.clone());
                binder
            }
            Err(_) => {
                error!("🚨 CRITICAL: BinderRegistry write lock poisoned in binder_for");
                binder
            }
        };
        binder.mount(key.as_str()).await;
        binder
    }

    pub fn mounted_paths(&self) -> Vec<PagePath> {
        match self.binders.read() {
            Ok(binders) => {
                let mut paths: Vec<PagePath> = binders.keys().cloned().collect();
                paths.sort();
                paths
            }
            Err(_) => {
                error!("🚨 CRITICAL: BinderRegistry read lock poisoned in mounted_paths");
                Vec::new()
            }
        }
    }

    fn lookup(&self, key: &PagePath) -> Option<Arc<PageMetaBinder>> {
        match self.binders.read() {
            Ok(binders) => binders.get(key).cloned(),
            Err(_) => {
                error!("🚨 CRITICAL: BinderRegistry read lock poisoned in lookup");
                None
            }
        }
    }
}
