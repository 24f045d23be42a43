// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::fmt;

/// Document id reserved for the site root. Every other path produces an id
/// built from percent-encoded segments, which can never start with `_`.
pub const ROOT_DOCUMENT_ID: &str = "_root";

const SEGMENT_SEPARATOR: char = '_';

/// A page path in canonical form: leading slash, no repeated slashes, no
/// trailing slash (except for the root), no query string or fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PagePath(String);

impl PagePath {
    pub fn parse(raw: &str) -> Self {
        PagePath(normalize_page_path(raw))
    }

    pub fn root() -> Self {
        PagePath("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Store key for this path.
    pub fn document_id(&self) -> String {
        if self.is_root() {
            return ROOT_DOCUMENT_ID.to_string();
        }

        self.0
            .trim_start_matches('/')
            .split('/')
            .map(encode_segment)
            .collect::<Vec<_>>()
            .join(&SEGMENT_SEPARATOR.to_string())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PagePath {
    fn from(raw: &str) -> Self {
        PagePath::parse(raw)
    }
}

pub fn normalize_page_path(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_fragment = trimmed.split('#').next().unwrap_or("");
    let without_query = without_fragment.split('?').next().unwrap_or("");

    let segments: Vec<&str> = without_query
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut normalized = String::with_capacity(without_query.len() + 1);
    for segment in segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    normalized
}

/// Shorthand for `PagePath::parse(raw).document_id()`.
pub fn document_id_for(raw: &str) -> String {
    PagePath::parse(raw).document_id()
}

fn encode_segment(segment: &str) -> String {
    // urlencoding leaves `_` alone; escape it so it cannot be confused with the separator.
    urlencoding::encode(segment).replace(SEGMENT_SEPARATOR, "%5F")
}
