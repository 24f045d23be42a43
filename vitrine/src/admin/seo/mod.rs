// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::web;

pub mod console;
pub mod form;
pub mod handlers;

pub use console::{FeedState, SeoConsole};
pub use form::SeoForm;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(handlers::seo_dashboard))
        .route("/", web::get().to(handlers::seo_dashboard))
        .route("/new", web::get().to(handlers::new_form))
        .route("/edit", web::get().to(handlers::edit_form))
        .route("/save", web::post().to(handlers::save))
        .route("/list-api", web::get().to(handlers::list_api))
        .service(
            web::resource("/delete")
                .route(web::get().to(handlers::confirm_delete))
                .route(web::post().to(handlers::delete)),
        );
}
