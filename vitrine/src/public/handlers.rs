// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error;
use super::site::SitePage;
use crate::app_state::AppState;
use crate::config::ValidatedConfig;
use crate::meta::BinderRegistry;
use crate::templates::{SitePageContext, render_minijinja_template};
use crate::theme::ThemeState;
use actix_web::{HttpRequest, HttpResponse, Result, web};
use log::debug;
use std::time::Duration;

/// How long a render waits for a freshly mounted binder before using defaults.
const BINDING_SETTLE_TIMEOUT: Duration = Duration::from_millis(1500);

pub async fn site_page(
    req: HttpRequest,
    config: web::Data<ValidatedConfig>,
    app_state: web::Data<AppState>,
    registry: web::Data<BinderRegistry>,
    theme: web::Data<ThemeState>,
) -> Result<HttpResponse> {
    let Some(page) = SitePage::from_path(req.path()) else {
        return not_found(app_state, theme).await;
    };

    let binder = registry.binder_for(page.path()).await;
    let state = binder.settled(BINDING_SETTLE_TIMEOUT).await;
    debug!("Rendering {} with binding {:?}", page.path(), state);

    let origin = request_origin(&req, &config);
    let head = binder.head_tags(&app_state.seo_defaults, &origin);
    let context = SitePageContext::new(&config.app.name, theme.current(), page, &head).to_value();

    match render_minijinja_template(app_state.templates.as_ref(), page.template(), context) {
        Ok(html) => Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .insert_header(("Cache-Control", "no-cache"))
            .body(html)),
        Err(e) => {
            log::error!("Failed to render {}: {}", page.template(), e);
            error::serve_500(
                &app_state.error_renderer,
                Some(app_state.templates.as_ref()),
                theme.current(),
            )
        }
    }
}

pub async fn not_found(
    app_state: web::Data<AppState>,
    theme: web::Data<ThemeState>,
) -> Result<HttpResponse> {
    error::serve_404(
        &app_state.error_renderer,
        Some(app_state.templates.as_ref()),
        theme.current(),
    )
}

/// `seo.site_url` when configured, otherwise the request's scheme and host.
pub fn request_origin(req: &HttpRequest, config: &ValidatedConfig) -> String {
    match config.seo.site_url.as_ref() {
        Some(site_url) => site_url.clone(),
        None => {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        }
    }
}
