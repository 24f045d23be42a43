// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::binder::BindingState;
use super::path::PagePath;
use super::record::{MetaRecord, RobotsDirective, non_blank};
use crate::config::SeoConfig;
use serde::Serialize;
use std::fmt::Write;

/// Site-wide fallbacks used whenever a record (or one of its fields) is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct SeoDefaults {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub og_image: String,
    pub robots: RobotsDirective,
}

impl SeoDefaults {
    pub fn from_config(seo: &SeoConfig) -> Self {
        Self {
            title: seo.default_title.clone(),
            description: seo.default_description.clone(),
            keywords: seo.default_keywords.clone(),
            og_image: seo.default_og_image.clone(),
            robots: RobotsDirective::default(),
        }
    }
}

/// Fully resolved head values for one page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadTags {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub robots: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
    pub og_url: String,
    pub canonical_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadTag {
    Title(String),
    MetaName { name: &'static str, content: String },
    MetaProperty { property: &'static str, content: String },
    Canonical(String),
}

impl HeadTag {
    fn write_html(&self, out: &mut String) {
        let _ = match self {
            HeadTag::Title(text) => writeln!(out, "<title>{}</title>", html_escape(text)),
            HeadTag::MetaName { name, content } => writeln!(
                out,
                "<meta name=\"{}\" content=\"{}\">",
                name,
                html_escape(content)
            ),
            HeadTag::MetaProperty { property, content } => writeln!(
                out,
                "<meta property=\"{}\" content=\"{}\">",
                property,
                html_escape(content)
            ),
            HeadTag::Canonical(href) => {
                writeln!(out, "<link rel=\"canonical\" href=\"{}\">", html_escape(href))
            }
        };
    }
}

impl HeadTags {
    pub fn tags(&self) -> Vec<HeadTag> {
        let name = |name, content: &str| HeadTag::MetaName {
            name,
            content: content.to_string(),
        };
        let property = |property, content: &str| HeadTag::MetaProperty {
            property,
            content: content.to_string(),
        };

        vec![
            HeadTag::Title(self.title.clone()),
            name("description", &self.description),
            name("keywords", &self.keywords),
            name("robots", &self.robots),
            property("og:title", &self.og_title),
            property("og:description", &self.og_description),
            property("og:image", &self.og_image),
            property("og:url", &self.og_url),
            property("og:type", "website"),
            name("twitter:card", "summary_large_image"),
            name("twitter:title", &self.og_title),
            name("twitter:description", &self.og_description),
            name("twitter:image", &self.og_image),
            HeadTag::Canonical(self.canonical_url.clone()),
        ]
    }

    /// Escaped markup for the document head. Same values, same output.
    pub fn render_html(&self) -> String {
        let mut html = String::new();
        for tag in self.tags() {
            tag.write_html(&mut html);
        }
        html
    }
}

/// Projects a binding state onto head values, falling back field by field.
pub fn resolve_head(
    state: &BindingState,
    path: &PagePath,
    defaults: &SeoDefaults,
    origin: &str,
) -> HeadTags {
    let record = match state {
        BindingState::Bound(Some(record)) => Some(record),
        BindingState::Bound(None) | BindingState::Loading | BindingState::Unavailable => None,
    };
    resolve_record(record, path, defaults, origin)
}

pub fn resolve_record(
    record: Option<&MetaRecord>,
    path: &PagePath,
    defaults: &SeoDefaults,
    origin: &str,
) -> HeadTags {
    let title = field(record, |r| r.title.as_ref())
        .unwrap_or(defaults.title.as_str())
        .to_string();
    let description = field(record, |r| r.description.as_ref())
        .unwrap_or(defaults.description.as_str())
        .to_string();
    let keywords = field(record, |r| r.keywords.as_ref())
        .unwrap_or(defaults.keywords.as_str())
        .to_string();
    let og_title = field(record, |r| r.og_title.as_ref())
        .map(str::to_string)
        .unwrap_or_else(|| title.clone());
    let og_description = field(record, |r| r.og_description.as_ref())
        .map(str::to_string)
        .unwrap_or_else(|| description.clone());
    let og_image = field(record, |r| r.og_image.as_ref())
        .unwrap_or(defaults.og_image.as_str())
        .to_string();
    let url = page_url(origin, path);
    let canonical_url = field(record, |r| r.canonical_url.as_ref())
        .map(str::to_string)
        .unwrap_or_else(|| url.clone());
    let robots = record.map(|r| r.robots).unwrap_or(defaults.robots);

    HeadTags {
        title,
        description,
        keywords,
        robots: robots.as_str().to_string(),
        og_title,
        og_description,
        og_image,
        og_url: url,
        canonical_url,
    }
}

fn field<'a>(
    record: Option<&'a MetaRecord>,
    pick: impl Fn(&'a MetaRecord) -> Option<&'a String>,
) -> Option<&'a str> {
    record.and_then(|r| non_blank(pick(r)))
}

pub fn page_url(origin: &str, path: &PagePath) -> String {
    format!("{}{}", origin.trim_end_matches('/'), path.as_str())
}

pub fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
