// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;

use crate::meta::SeoDefaults;
use crate::public::error::ErrorRenderer;
use crate::runtime_paths::RuntimePaths;
use crate::templates::{MiniJinjaEngine, TemplateEngine};

pub struct AppState {
    pub templates: Arc<dyn TemplateEngine>,
    pub error_renderer: ErrorRenderer,
    pub seo_defaults: SeoDefaults,
    pub runtime_paths: RuntimePaths,
}

impl AppState {
    pub fn new(app_name: &str, seo_defaults: SeoDefaults, runtime_paths: RuntimePaths) -> Self {
        Self {
            templates: Arc::new(MiniJinjaEngine::new()),
            error_renderer: ErrorRenderer::new(app_name.to_string()),
            seo_defaults,
            runtime_paths,
        }
    }
}
