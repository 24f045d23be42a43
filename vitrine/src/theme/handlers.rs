// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::ThemeState;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/theme", web::get().to(current_theme))
        .route("/theme/toggle", web::post().to(toggle_theme));
}

async fn current_theme(theme: web::Data<ThemeState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "theme": theme.current().as_str() }))
}

async fn toggle_theme(req: HttpRequest, theme: web::Data<ThemeState>) -> HttpResponse {
    let next = theme.toggle();
    log::debug!("Theme toggled to '{}'", next);

    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, return_location(&req)))
        .finish()
}

/// Same-origin referer path, or `/`.
fn return_location(req: &HttpRequest) -> String {
    let Some(referer) = req
        .headers()
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
    else {
        return "/".to_string();
    };

    let host = req.connection_info().host().to_string();
    let path = referer
        .strip_prefix("http://")
        .or_else(|| referer.strip_prefix("https://"))
        .and_then(|rest| rest.strip_prefix(host.as_str()));

    match path {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}
