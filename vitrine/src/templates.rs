// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use minijinja::Value;

mod context;
mod engine;

pub use context::{AdminPageContext, ErrorPageContext, SitePageContext};
pub use engine::{MiniJinjaEngine, TemplateEngine};

/// Render a minijinja template with the given context
pub fn render_minijinja_template(
    engine: &dyn TemplateEngine,
    template_name: &str,
    context: Value,
) -> Result<String, minijinja::Error> {
    engine.render(template_name, context)
}
