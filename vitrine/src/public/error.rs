// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::templates::{ErrorPageContext, TemplateEngine, render_minijinja_template};
use crate::theme::ThemeMode;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Result};

#[derive(Clone)]
pub struct ErrorRenderer {
    app_name: String,
}

impl ErrorRenderer {
    pub fn new(app_name: String) -> Self {
        Self { app_name }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}

pub fn serve_404(
    renderer: &ErrorRenderer,
    template_engine: Option<&dyn TemplateEngine>,
    theme: ThemeMode,
) -> Result<HttpResponse> {
    serve_error(
        renderer.app_name(),
        template_engine,
        theme,
        StatusCode::NOT_FOUND,
    )
}

pub fn serve_500(
    renderer: &ErrorRenderer,
    template_engine: Option<&dyn TemplateEngine>,
    theme: ThemeMode,
) -> Result<HttpResponse> {
    serve_error(
        renderer.app_name(),
        template_engine,
        theme,
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

fn serve_error(
    app_name: &str,
    template_engine: Option<&dyn TemplateEngine>,
    theme: ThemeMode,
    status: StatusCode,
) -> Result<HttpResponse> {
    let template = if status == StatusCode::NOT_FOUND {
        "error_404.html"
    } else {
        "error_500.html"
    };
    let context = ErrorPageContext::new(app_name, theme).to_value();

    let html = match template_engine {
        Some(engine) => match render_minijinja_template(engine, template, context) {
            Ok(html) => html,
            Err(e) => {
                log::error!("Failed to render {} error template: {}", status.as_u16(), e);
                fallback_html(app_name, status)
            }
        },
        None => fallback_html(app_name, status),
    };

    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .insert_header(("Cache-Control", "no-cache, no-store, must-revalidate"))
        .insert_header(("Pragma", "no-cache"))
        .insert_header(("Expires", "0"))
        .body(html))
}

fn fallback_html(app_name: &str, status: StatusCode) -> String {
    let heading = if status == StatusCode::NOT_FOUND {
        "404 - Page Not Found"
    } else {
        "500 - Internal Server Error"
    };
    format!(
        r#"<!DOCTYPE html>
<html><head><title>{heading} | {app}</title></head>
<body><h1>{heading}</h1></body></html>"#,
        heading = heading,
        app = crate::meta::head::html_escape(app_name)
    )
}
