// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::meta::HeadTags;
use crate::public::site::SitePage;
use crate::theme::ThemeMode;
use minijinja::{Value, context};

fn nav_items(active: Option<SitePage>) -> Vec<Value> {
    SitePage::ALL
        .iter()
        .map(|page| {
            context! {
                label => page.label(),
                path => page.path(),
                active => Some(*page) == active
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ErrorPageContext {
    app_name: String,
    theme: ThemeMode,
}

impl ErrorPageContext {
    pub fn new(app_name: &str, theme: ThemeMode) -> Self {
        Self {
            app_name: app_name.to_string(),
            theme,
        }
    }

    pub fn to_value(&self) -> Value {
        context! {
            app_name => &self.app_name,
            theme => self.theme.as_str(),
            nav => nav_items(None)
        }
    }
}

/// Context for one public page; the head markup is pre-escaped.
#[derive(Debug, Clone)]
pub struct SitePageContext {
    app_name: String,
    theme: ThemeMode,
    page: SitePage,
    head_html: String,
}

impl SitePageContext {
    pub fn new(app_name: &str, theme: ThemeMode, page: SitePage, head: &HeadTags) -> Self {
        Self {
            app_name: app_name.to_string(),
            theme,
            page,
            head_html: head.render_html(),
        }
    }

    pub fn to_value(&self) -> Value {
        context! {
            app_name => &self.app_name,
            theme => self.theme.as_str(),
            head => Value::from_safe_string(self.head_html.clone()),
            nav => nav_items(Some(self.page)),
            page => context! {
                label => self.page.label(),
                path => self.page.path(),
                heading => self.page.heading(),
                intro => self.page.intro(),
                highlights => self.page.highlights()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminPageContext {
    app_name: String,
    admin_path: String,
    theme: ThemeMode,
}

impl AdminPageContext {
    pub fn new(app_name: &str, admin_path: &str, theme: ThemeMode) -> Self {
        Self {
            app_name: app_name.to_string(),
            admin_path: admin_path.to_string(),
            theme,
        }
    }

    /// Merges the shared admin fields into a page-specific context.
    pub fn with(&self, page: Value) -> Value {
        context! {
            app_name => &self.app_name,
            admin_path => &self.admin_path,
            theme => self.theme.as_str(),
            nav => nav_items(None),
            ..page
        }
    }
}
