// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::http::{StatusCode, header};
use actix_web::test;
use std::sync::Arc;
use vitrine::theme::{FilePreferenceStore, ThemeMode, ThemeState};

#[actix_web::test]
async fn toggle_flips_rendered_class_and_persists() {
    let harness = common::TestHarness::new().await;
    let app = test::init_service(common::build_test_app(harness.app_bundle())).await;

    let req = test::TestRequest::get().uri("/theme").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["theme"], "dark");

    let req = test::TestRequest::post()
        .uri("/theme/toggle")
        .insert_header((header::HOST, "agency.test"))
        .insert_header((header::REFERER, "http://agency.test/about"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/about");

    let req = test::TestRequest::get().uri("/about").to_request();
    let (_, html) = common::body_text(test::call_service(&app, req).await).await;
    assert!(html.contains("<html lang=\"en\" class=\"light\">"));

    let reloaded = ThemeState::load(
        Arc::new(FilePreferenceStore::new(&harness.runtime_paths.preferences_file)),
        ThemeMode::Dark,
    );
    assert_eq!(reloaded.current(), ThemeMode::Light);
}
