// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;

/// Flag captured by a delivery task at subscribe time. Deliveries check it
/// right before invoking the callback, so nothing is delivered once the
/// subscription has been cancelled, even if the task was already scheduled.
#[derive(Clone, Debug)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Liveness(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn revoke(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for a live metadata subscription. Dropping it unsubscribes.
pub struct Subscription {
    label: String,
    liveness: Liveness,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(label: String, liveness: Liveness, task: JoinHandle<()>) -> Self {
        log::debug!("Subscription opened ({})", label);
        Self {
            label,
            liveness,
            task: Some(task),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_active(&self) -> bool {
        self.liveness.is_live()
    }

    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if !self.liveness.is_live() {
            return;
        }
        self.liveness.revoke();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        log::debug!("Subscription closed ({})", self.label);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}
