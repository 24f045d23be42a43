// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Per-page SEO metadata: storage, access, live subscriptions and head projection.

pub mod access;
pub mod binder;
pub mod error;
pub mod file_store;
pub mod head;
pub mod path;
pub mod record;
pub mod registry;
pub mod remote_store;
pub mod store;
pub mod subscription;

pub use access::{MetaAccess, ReadOutcome};
pub use binder::{BindingState, PageMetaBinder};
pub use error::{MetaError, StoreError};
pub use file_store::FileMetaStore;
pub use head::{HeadTag, HeadTags, SeoDefaults, resolve_head};
pub use path::{PagePath, ROOT_DOCUMENT_ID, normalize_page_path};
pub use record::{MetaInput, MetaRecord, RobotsDirective};
pub use registry::BinderRegistry;
pub use remote_store::{RemoteMetaStore, RemoteStoreSettings};
pub use store::{MetaStore, StoreChange};
pub use subscription::Subscription;

use crate::config::{ValidatedConfig, ValidatedStoreConfig};
use crate::runtime_paths::RuntimePaths;
use std::sync::Arc;

/// Opens the configured metadata backend.
pub fn open_store(
    config: &ValidatedConfig,
    runtime_paths: &RuntimePaths,
) -> Result<Arc<dyn MetaStore>, StoreError> {
    let store: Arc<dyn MetaStore> = match &config.store {
        ValidatedStoreConfig::File => Arc::new(FileMetaStore::open(&runtime_paths.meta_store_file)?),
        ValidatedStoreConfig::Remote(remote) => Arc::new(RemoteMetaStore::new(&remote.settings())?),
    };
    log::info!("Metadata store: {}", store.describe());
    Ok(store)
}
