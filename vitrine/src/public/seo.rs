// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::handlers::request_origin;
use super::site::SitePage;
use crate::config::ValidatedConfig;
use crate::meta::{MetaAccess, MetaRecord};
use actix_web::{HttpRequest, HttpResponse, Result, web};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Write;

pub async fn robots_txt(
    req: HttpRequest,
    config: web::Data<ValidatedConfig>,
) -> Result<HttpResponse> {
    let base_url = request_origin(&req, &config);

    let mut body = String::new();
    body.push_str("User-agent: *\n");
    let _ = writeln!(body, "Disallow: {}", config.admin.path);
    body.push_str("Allow: /\n\n");
    let _ = writeln!(body, "Sitemap: {}/sitemap.xml", base_url);

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(body))
}

pub async fn sitemap_xml(
    req: HttpRequest,
    config: web::Data<ValidatedConfig>,
    access: web::Data<MetaAccess>,
) -> Result<HttpResponse> {
    let base_url = request_origin(&req, &config);
    let records = access.get_all().await;
    let xml = build_sitemap(&base_url, &records);

    Ok(HttpResponse::Ok()
        .content_type("application/xml; charset=utf-8")
        .body(xml))
}

struct SitemapEntry {
    loc: String,
    last_modified: Option<DateTime<Utc>>,
}

/// Site routes whose effective robots directive allows indexing.
fn build_sitemap(base_url: &str, records: &[MetaRecord]) -> String {
    let by_path: HashMap<&str, &MetaRecord> = records
        .iter()
        .map(|record| (record.page_path.as_str(), record))
        .collect();

    let entries: Vec<SitemapEntry> = SitePage::ALL
        .iter()
        .filter_map(|page| {
            let record = by_path.get(page.path()).copied();
            let robots = record.map(|r| r.robots).unwrap_or_default();
            if !robots.allows_indexing() {
                return None;
            }
            Some(SitemapEntry {
                loc: format!("{}{}", base_url.trim_end_matches('/'), page.path()),
                last_modified: record.map(|r| r.updated_at),
            })
        })
        .collect();

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    for entry in entries {
        xml.push_str("  <url>\n");
        let _ = writeln!(xml, "    <loc>{}</loc>", escape_xml(&entry.loc));
        if let Some(last_modified) = entry.last_modified {
            let _ = writeln!(
                xml,
                "    <lastmod>{}</lastmod>",
                last_modified.format("%Y-%m-%d")
            );
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::RobotsDirective;
    use chrono::TimeZone;

    fn record(path: &str, robots: RobotsDirective) -> MetaRecord {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
        MetaRecord {
            page_path: path.to_string(),
            title: None,
            description: None,
            keywords: None,
            og_title: None,
            og_description: None,
            og_image: None,
            canonical_url: None,
            robots,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn sitemap_lists_all_routes_by_default() {
        let xml = build_sitemap("https://agency.test", &[]);
        for page in SitePage::ALL {
            assert!(xml.contains(&format!("<loc>https://agency.test{}</loc>", page.path())));
        }
        assert!(!xml.contains("<lastmod>"));
    }

    #[test]
    fn sitemap_omits_noindex_pages_and_dates_known_ones() {
        let records = vec![
            record("/contact", RobotsDirective::NoindexFollow),
            record("/services", RobotsDirective::IndexNofollow),
        ];
        let xml = build_sitemap("https://agency.test/", &records);
        assert!(!xml.contains("/contact</loc>"));
        assert!(xml.contains("<loc>https://agency.test/services</loc>\n    <lastmod>2026-03-14</lastmod>"));
    }
}
