// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Recommended upper bound for titles, shown as a hint in the admin form.
pub const TITLE_RECOMMENDED_MAX: usize = 60;
/// Recommended upper bound for descriptions, shown as a hint in the admin form.
pub const DESCRIPTION_RECOMMENDED_MAX: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RobotsDirective {
    #[default]
    IndexFollow,
    IndexNofollow,
    NoindexFollow,
    NoindexNofollow,
}

impl RobotsDirective {
    pub const ALL: [RobotsDirective; 4] = [
        RobotsDirective::IndexFollow,
        RobotsDirective::IndexNofollow,
        RobotsDirective::NoindexFollow,
        RobotsDirective::NoindexNofollow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RobotsDirective::IndexFollow => "index, follow",
            RobotsDirective::IndexNofollow => "index, nofollow",
            RobotsDirective::NoindexFollow => "noindex, follow",
            RobotsDirective::NoindexNofollow => "noindex, nofollow",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RobotsDirective::IndexFollow => "Index, Follow",
            RobotsDirective::IndexNofollow => "Index, Nofollow",
            RobotsDirective::NoindexFollow => "Noindex, Follow",
            RobotsDirective::NoindexNofollow => "Noindex, Nofollow",
        }
    }

    pub fn allows_indexing(&self) -> bool {
        matches!(
            self,
            RobotsDirective::IndexFollow | RobotsDirective::IndexNofollow
        )
    }
}

impl fmt::Display for RobotsDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RobotsDirective {
    type Err = String;

    /// Accepts `index, follow`, `index,follow`, `INDEX+FOLLOW` and similar spellings.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let compact: String = value
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .map(|ch| if ch == '+' { ',' } else { ch })
            .collect::<String>()
            .to_ascii_lowercase();
        match compact.as_str() {
            "index,follow" => Ok(RobotsDirective::IndexFollow),
            "index,nofollow" => Ok(RobotsDirective::IndexNofollow),
            "noindex,follow" => Ok(RobotsDirective::NoindexFollow),
            "noindex,nofollow" => Ok(RobotsDirective::NoindexNofollow),
            _ => Err(format!("Unknown robots directive '{}'", value)),
        }
    }
}

impl Serialize for RobotsDirective {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RobotsDirective {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaRecord {
    pub page_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub robots: RobotsDirective,
    /// Documents written without timestamps read as the Unix epoch.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl MetaRecord {
    /// Applies `input` on top of `existing` (or an empty record). Absent input
    /// fields keep the existing value, blank ones clear it.
    pub fn merged(
        existing: Option<&MetaRecord>,
        page_path: String,
        input: &MetaInput,
        now: DateTime<Utc>,
    ) -> MetaRecord {
        let created_at = existing
            .map(|record| record.created_at)
            .or(input.created_at)
            .unwrap_or(now);

        MetaRecord {
            page_path,
            title: merge_field(existing.and_then(|r| r.title.as_ref()), &input.title),
            description: merge_field(
                existing.and_then(|r| r.description.as_ref()),
                &input.description,
            ),
            keywords: merge_field(existing.and_then(|r| r.keywords.as_ref()), &input.keywords),
            og_title: merge_field(existing.and_then(|r| r.og_title.as_ref()), &input.og_title),
            og_description: merge_field(
                existing.and_then(|r| r.og_description.as_ref()),
                &input.og_description,
            ),
            og_image: merge_field(existing.and_then(|r| r.og_image.as_ref()), &input.og_image),
            canonical_url: merge_field(
                existing.and_then(|r| r.canonical_url.as_ref()),
                &input.canonical_url,
            ),
            robots: input
                .robots
                .or(existing.map(|record| record.robots))
                .unwrap_or_default(),
            created_at,
            updated_at: now,
        }
    }
}

/// Upsert payload. `None` means "not provided".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaInput {
    pub page_path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub og_title: Option<String>,
    #[serde(default)]
    pub og_description: Option<String>,
    #[serde(default)]
    pub og_image: Option<String>,
    #[serde(default)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub robots: Option<RobotsDirective>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl MetaInput {
    pub fn for_path(page_path: &str) -> Self {
        Self {
            page_path: page_path.to_string(),
            ..Self::default()
        }
    }
}

impl From<&MetaRecord> for MetaInput {
    fn from(record: &MetaRecord) -> Self {
        Self {
            page_path: record.page_path.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            keywords: record.keywords.clone(),
            og_title: record.og_title.clone(),
            og_description: record.og_description.clone(),
            og_image: record.og_image.clone(),
            canonical_url: record.canonical_url.clone(),
            robots: Some(record.robots),
            created_at: Some(record.created_at),
        }
    }
}

fn merge_field(existing: Option<&String>, incoming: &Option<String>) -> Option<String> {
    match incoming {
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value.clone()),
        None => existing.cloned(),
    }
}

/// Returns the value when it has visible content.
pub fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.as_str()).filter(|v| !v.trim().is_empty())
}

/// Sorts records newest first, breaking ties by path for a stable order.
pub fn sort_by_recency(records: &mut [MetaRecord]) {
    records.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.page_path.cmp(&b.page_path))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn robots_parses_common_spellings() {
        assert_eq!(
            "index, follow".parse::<RobotsDirective>().unwrap(),
            RobotsDirective::IndexFollow
        );
        assert_eq!(
            "NOINDEX,NOFOLLOW".parse::<RobotsDirective>().unwrap(),
            RobotsDirective::NoindexNofollow
        );
        assert_eq!(
            "noindex+follow".parse::<RobotsDirective>().unwrap(),
            RobotsDirective::NoindexFollow
        );
        assert!("follow".parse::<RobotsDirective>().is_err());
    }

    #[test]
    fn robots_serializes_as_meta_content() {
        let json = serde_json::to_string(&RobotsDirective::IndexNofollow).unwrap();
        assert_eq!(json, "\"index, nofollow\"");
    }

    #[test]
    fn merge_initializes_timestamps_for_new_record() {
        let input = MetaInput {
            title: Some("Hello".to_string()),
            ..MetaInput::for_path("/x")
        };
        let record = MetaRecord::merged(None, "/x".to_string(), &input, at(0));
        assert_eq!(record.created_at, at(0));
        assert_eq!(record.updated_at, at(0));
        assert_eq!(record.robots, RobotsDirective::IndexFollow);
    }

    #[test]
    fn merge_preserves_absent_fields_and_created_at() {
        let first = MetaInput {
            title: Some("A".to_string()),
            ..MetaInput::for_path("/x")
        };
        let stored = MetaRecord::merged(None, "/x".to_string(), &first, at(0));

        let second = MetaInput {
            description: Some("B".to_string()),
            ..MetaInput::for_path("/x")
        };
        let merged = MetaRecord::merged(Some(&stored), "/x".to_string(), &second, at(60));

        assert_eq!(merged.title.as_deref(), Some("A"));
        assert_eq!(merged.description.as_deref(), Some("B"));
        assert_eq!(merged.created_at, at(0));
        assert_eq!(merged.updated_at, at(0) + Duration::seconds(60));
    }

    #[test]
    fn merge_clears_blank_fields() {
        let first = MetaInput {
            keywords: Some("rust, web".to_string()),
            ..MetaInput::for_path("/x")
        };
        let stored = MetaRecord::merged(None, "/x".to_string(), &first, at(0));
        let clear = MetaInput {
            keywords: Some("   ".to_string()),
            ..MetaInput::for_path("/x")
        };
        let merged = MetaRecord::merged(Some(&stored), "/x".to_string(), &clear, at(1));
        assert_eq!(merged.keywords, None);
    }

    #[test]
    fn merge_stores_non_blank_values_verbatim() {
        let input = MetaInput {
            title: Some(" A ".to_string()),
            description: Some("two  spaces\n".to_string()),
            ..MetaInput::for_path("/x")
        };
        let record = MetaRecord::merged(None, "/x".to_string(), &input, at(0));
        assert_eq!(record.title.as_deref(), Some(" A "));
        assert_eq!(record.description.as_deref(), Some("two  spaces\n"));
    }

    #[test]
    fn record_without_timestamps_still_parses() {
        let json = serde_json::json!({
            "pagePath": "/contact",
            "title": "Contact",
            "robots": "noindex, follow"
        });
        let record: MetaRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.title.as_deref(), Some("Contact"));
        assert_eq!(record.robots, RobotsDirective::NoindexFollow);
        assert_eq!(record.created_at, Utc.timestamp_opt(0, 0).unwrap());
        assert_eq!(record.updated_at, Utc.timestamp_opt(0, 0).unwrap());
    }

    #[test]
    fn merge_keeps_existing_robots_when_not_provided() {
        let first = MetaInput {
            robots: Some(RobotsDirective::NoindexFollow),
            ..MetaInput::for_path("/x")
        };
        let stored = MetaRecord::merged(None, "/x".to_string(), &first, at(0));
        let merged = MetaRecord::merged(
            Some(&stored),
            "/x".to_string(),
            &MetaInput::for_path("/x"),
            at(1),
        );
        assert_eq!(merged.robots, RobotsDirective::NoindexFollow);
    }

    #[test]
    fn record_round_trips_through_camel_case_json() {
        let record = MetaRecord::merged(
            None,
            "/about".to_string(),
            &MetaInput {
                og_title: Some("About us".to_string()),
                ..MetaInput::for_path("/about")
            },
            at(5),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["pagePath"], "/about");
        assert_eq!(json["ogTitle"], "About us");
        assert!(json.get("title").is_none());
        let decoded: MetaRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn recency_sort_puts_newest_first() {
        let mut records = vec![
            MetaRecord::merged(None, "/a".to_string(), &MetaInput::for_path("/a"), at(1)),
            MetaRecord::merged(None, "/b".to_string(), &MetaInput::for_path("/b"), at(3)),
            MetaRecord::merged(None, "/c".to_string(), &MetaInput::for_path("/c"), at(2)),
        ];
        sort_by_recency(&mut records);
        let paths: Vec<_> = records.iter().map(|r| r.page_path.as_str()).collect();
        assert_eq!(paths, vec!["/b", "/c", "/a"]);
    }
}
