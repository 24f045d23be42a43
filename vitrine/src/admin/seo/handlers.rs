// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::console::{FeedState, SeoConsole};
use super::form::SeoForm;
use crate::app_state::AppState;
use crate::config::ValidatedConfig;
use crate::meta::{MetaRecord, normalize_page_path};
use crate::public::error;
use crate::templates::{AdminPageContext, render_minijinja_template};
use crate::theme::ThemeState;
use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, Result, web};
use minijinja::{Value, context};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const FEED_SETTLE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Default, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    path: String,
    #[serde(default)]
    confirm: String,
}

/// Shared per-request dependencies of the dashboard pages.
struct AdminView<'a> {
    config: &'a ValidatedConfig,
    app_state: &'a AppState,
    theme: &'a ThemeState,
}

impl AdminView<'_> {
    fn render(&self, template: &str, page: Value, status: StatusCode) -> Result<HttpResponse> {
        let context = AdminPageContext::new(
            &self.config.app.name,
            &self.config.admin.path,
            self.theme.current(),
        )
        .with(page);

        match render_minijinja_template(self.app_state.templates.as_ref(), template, context) {
            Ok(html) => Ok(HttpResponse::build(status)
                .content_type("text/html; charset=utf-8")
                .insert_header(("Cache-Control", "no-store"))
                .body(html)),
            Err(e) => {
                log::error!("Failed to render {}: {}", template, e);
                error::serve_500(
                    &self.app_state.error_renderer,
                    Some(self.app_state.templates.as_ref()),
                    self.theme.current(),
                )
            }
        }
    }

    fn unavailable(&self, reason: &str) -> Result<HttpResponse> {
        self.render(
            "admin/seo_unavailable.html",
            context! { reason => reason },
            StatusCode::SERVICE_UNAVAILABLE,
        )
    }

    fn form(
        &self,
        form: &SeoForm,
        is_edit: bool,
        error: Option<&str>,
        status: StatusCode,
    ) -> Result<HttpResponse> {
        let page = context! {
            form => form,
            is_edit => is_edit,
            error => error,
            counters => form.counters(),
            page_options => form.page_options(),
            robots_options => form.robots_options()
        };
        self.render("admin/seo_form.html", page, status)
    }

    fn redirect_to_list(&self) -> HttpResponse {
        HttpResponse::SeeOther()
            .insert_header((header::LOCATION, self.config.admin.path.as_str()))
            .finish()
    }
}

fn record_row(record: &MetaRecord) -> Value {
    context! {
        page_path => &record.page_path,
        title => record.title.clone().unwrap_or_default(),
        description => record.description.clone().unwrap_or_default(),
        robots => record.robots.label(),
        updated_at => record.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        query => urlencoding::encode(&record.page_path).into_owned()
    }
}

/// Opens the feed if needed and waits briefly for its first delivery.
async fn current_feed(console: &SeoConsole) -> FeedState {
    console.ensure_connected().await;
    console.settled(FEED_SETTLE_TIMEOUT).await
}

pub async fn seo_dashboard(
    config: web::Data<ValidatedConfig>,
    app_state: web::Data<AppState>,
    theme: web::Data<ThemeState>,
    console: web::Data<SeoConsole>,
) -> Result<HttpResponse> {
    log::info!("SEO dashboard requested");
    let view = AdminView {
        config: &config,
        app_state: &app_state,
        theme: &theme,
    };

    let feed = current_feed(&console).await;
    let records: Vec<Value> = match &feed {
        FeedState::Unavailable(reason) => return view.unavailable(reason),
        FeedState::Connecting => Vec::new(),
        FeedState::Live(records) => records.iter().map(record_row).collect(),
    };

    view.render(
        "admin/seo_dashboard.html",
        context! {
            feed_state => feed.as_str(),
            records => records
        },
        StatusCode::OK,
    )
}

pub async fn new_form(
    config: web::Data<ValidatedConfig>,
    app_state: web::Data<AppState>,
    theme: web::Data<ThemeState>,
) -> Result<HttpResponse> {
    let view = AdminView {
        config: &config,
        app_state: &app_state,
        theme: &theme,
    };
    view.form(&SeoForm::blank(), false, None, StatusCode::OK)
}

pub async fn edit_form(
    query: web::Query<PathQuery>,
    config: web::Data<ValidatedConfig>,
    app_state: web::Data<AppState>,
    theme: web::Data<ThemeState>,
    console: web::Data<SeoConsole>,
) -> Result<HttpResponse> {
    let view = AdminView {
        config: &config,
        app_state: &app_state,
        theme: &theme,
    };
    if query.path.trim().is_empty() {
        return Ok(view.redirect_to_list());
    }

    if let FeedState::Unavailable(reason) = current_feed(&console).await {
        return view.unavailable(&reason);
    }

    match console.find(&query.path) {
        Some(record) => view.form(&SeoForm::from_record(&record), true, None, StatusCode::OK),
        None => {
            log::debug!("No record for {} in the feed; starting a new one", query.path);
            let form = SeoForm {
                page_path: normalize_page_path(&query.path),
                ..SeoForm::blank()
            };
            view.form(&form, false, None, StatusCode::OK)
        }
    }
}

pub async fn save(
    form: web::Form<SeoForm>,
    config: web::Data<ValidatedConfig>,
    app_state: web::Data<AppState>,
    theme: web::Data<ThemeState>,
    console: web::Data<SeoConsole>,
) -> Result<HttpResponse> {
    let view = AdminView {
        config: &config,
        app_state: &app_state,
        theme: &theme,
    };
    let form = form.into_inner();
    let is_edit = !form.page_path.trim().is_empty() && console.find(&form.page_path).is_some();

    let input = match form.validate() {
        Ok(input) => input,
        Err(message) => {
            log::debug!("SEO form rejected: {}", message);
            return view.form(&form, is_edit, Some(message.as_str()), StatusCode::BAD_REQUEST);
        }
    };

    match console.access().upsert(&input).await {
        Ok(record) => {
            log::info!("SEO dashboard saved meta tags for {}", record.page_path);
            Ok(view.redirect_to_list())
        }
        Err(err) if err.is_validation() => {
            view.form(&form, is_edit, Some(err.message()), StatusCode::BAD_REQUEST)
        }
        Err(err) => {
            let message = format!("Could not save meta tags: {}", err.message());
            view.form(&form, is_edit, Some(message.as_str()), StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

pub async fn confirm_delete(
    query: web::Query<PathQuery>,
    config: web::Data<ValidatedConfig>,
    app_state: web::Data<AppState>,
    theme: web::Data<ThemeState>,
    console: web::Data<SeoConsole>,
) -> Result<HttpResponse> {
    let view = AdminView {
        config: &config,
        app_state: &app_state,
        theme: &theme,
    };
    if query.path.trim().is_empty() {
        return Ok(view.redirect_to_list());
    }

    let title = console.find(&query.path).and_then(|record| record.title);
    view.render(
        "admin/seo_confirm_delete.html",
        context! {
            page_path => normalize_page_path(&query.path),
            title => title,
            error => None::<String>
        },
        StatusCode::OK,
    )
}

pub async fn delete(
    form: web::Form<DeleteForm>,
    config: web::Data<ValidatedConfig>,
    app_state: web::Data<AppState>,
    theme: web::Data<ThemeState>,
    console: web::Data<SeoConsole>,
) -> Result<HttpResponse> {
    let view = AdminView {
        config: &config,
        app_state: &app_state,
        theme: &theme,
    };
    if form.path.trim().is_empty() {
        return Ok(view.redirect_to_list());
    }

    if form.confirm != "yes" {
        log::debug!("Delete of {} not confirmed", form.path);
        let location = format!(
            "{}/delete?path={}",
            config.admin.path,
            urlencoding::encode(form.path.trim())
        );
        return Ok(HttpResponse::SeeOther()
            .insert_header((header::LOCATION, location))
            .finish());
    }

    match console.access().delete(&form.path).await {
        Ok(()) => Ok(view.redirect_to_list()),
        Err(err) => {
            let title = console.find(&form.path).and_then(|record| record.title);
            view.render(
                "admin/seo_confirm_delete.html",
                context! {
                    page_path => normalize_page_path(&form.path),
                    title => title,
                    error => format!("Could not delete meta tags: {}", err.message())
                },
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}

pub async fn list_api(console: web::Data<SeoConsole>) -> HttpResponse {
    let feed = current_feed(&console).await;
    let body = match &feed {
        FeedState::Live(records) => json!({ "state": feed.as_str(), "records": records }),
        FeedState::Connecting => json!({ "state": feed.as_str(), "records": [] }),
        FeedState::Unavailable(reason) => json!({
            "state": feed.as_str(),
            "records": [],
            "error": reason,
        }),
    };

    let status = if matches!(feed, FeedState::Unavailable(_)) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    HttpResponse::build(status).json(body)
}
