// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::meta::record::{DESCRIPTION_RECOMMENDED_MAX, TITLE_RECOMMENDED_MAX};
use crate::meta::{MetaInput, MetaRecord, RobotsDirective};
use crate::public::site::SitePage;
use minijinja::{Value, context};
use serde::{Deserialize, Serialize};

/// Form fields as posted by the editor. Every field is a plain string so an
/// empty input round-trips as an empty value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeoForm {
    #[serde(default)]
    pub page_path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub og_title: String,
    #[serde(default)]
    pub og_description: String,
    #[serde(default)]
    pub og_image: String,
    #[serde(default)]
    pub canonical_url: String,
    #[serde(default)]
    pub robots: String,
}

impl SeoForm {
    pub fn blank() -> Self {
        Self {
            robots: RobotsDirective::default().as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn from_record(record: &MetaRecord) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            page_path: record.page_path.clone(),
            title: text(&record.title),
            description: text(&record.description),
            keywords: text(&record.keywords),
            og_title: text(&record.og_title),
            og_description: text(&record.og_description),
            og_image: text(&record.og_image),
            canonical_url: text(&record.canonical_url),
            robots: record.robots.as_str().to_string(),
        }
    }

    /// Local checks run before anything is sent to the store. Every text
    /// field is passed through, so blanks clear the stored value.
    pub fn validate(&self) -> Result<MetaInput, String> {
        if self.page_path.trim().is_empty() {
            return Err("Please select a page path".to_string());
        }
        let robots = if self.robots.trim().is_empty() {
            RobotsDirective::default()
        } else {
            self.robots.parse::<RobotsDirective>()?
        };

        Ok(MetaInput {
            page_path: self.page_path.trim().to_string(),
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            keywords: Some(self.keywords.clone()),
            og_title: Some(self.og_title.clone()),
            og_description: Some(self.og_description.clone()),
            og_image: Some(self.og_image.clone()),
            canonical_url: Some(self.canonical_url.clone()),
            robots: Some(robots),
            created_at: None,
        })
    }

    pub fn counters(&self) -> Value {
        let title_len = self.title.chars().count();
        let description_len = self.description.chars().count();
        context! {
            title_len => title_len,
            title_max => TITLE_RECOMMENDED_MAX,
            title_over => title_len > TITLE_RECOMMENDED_MAX,
            description_len => description_len,
            description_max => DESCRIPTION_RECOMMENDED_MAX,
            description_over => description_len > DESCRIPTION_RECOMMENDED_MAX
        }
    }

    pub fn page_options(&self) -> Vec<Value> {
        SitePage::ALL
            .iter()
            .map(|page| {
                context! {
                    path => page.path(),
                    label => page.label(),
                    selected => page.path() == self.page_path.trim()
                }
            })
            .collect()
    }

    pub fn robots_options(&self) -> Vec<Value> {
        let current = self.robots.parse::<RobotsDirective>().ok();
        RobotsDirective::ALL
            .iter()
            .map(|directive| {
                context! {
                    value => directive.as_str(),
                    label => directive.label(),
                    selected => Some(*directive) == current
                }
            })
            .collect()
    }
}
