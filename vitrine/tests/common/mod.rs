// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use std::sync::Arc;
use std::time::Duration;
use vitrine::admin::{self, seo::SeoConsole};
use vitrine::app_state::AppState;
use vitrine::config::ValidatedConfig;
use vitrine::meta::{
    self, BinderRegistry, MetaAccess, MetaInput, MetaRecord, MetaStore, SeoDefaults,
};
use vitrine::public::{self, site::SitePage};
use vitrine::runtime_paths::RuntimePaths;
use vitrine::theme::{self, FilePreferenceStore, ThemeState};
use vitrine::util::test_config;
use vitrine::util::test_fixtures::TestFixtureRoot;

pub struct TestHarness {
    pub fixture: TestFixtureRoot,
    pub config: Arc<ValidatedConfig>,
    pub runtime_paths: RuntimePaths,
    pub store: Arc<dyn MetaStore>,
    pub access: Arc<MetaAccess>,
    pub registry: Arc<BinderRegistry>,
    pub console: Arc<SeoConsole>,
    pub theme: Arc<ThemeState>,
    pub app_state: Arc<AppState>,
}

#[derive(Clone)]
pub struct AppBundle {
    pub config: Arc<ValidatedConfig>,
    pub app_state: Arc<AppState>,
    pub access: Arc<MetaAccess>,
    pub registry: Arc<BinderRegistry>,
    pub console: Arc<SeoConsole>,
    pub theme: Arc<ThemeState>,
    pub admin_path: String,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: ValidatedConfig) -> Self {
        let fixture = TestFixtureRoot::new_unique("http-test-suite").expect("fixture root");
        let runtime_paths = fixture.runtime_paths().expect("runtime paths");
        let config = Arc::new(config);

        let store = meta::open_store(&config, &runtime_paths).expect("metadata store");
        let access = MetaAccess::new(store.clone());
        let registry = Arc::new(BinderRegistry::new(access.clone()));
        registry
            .mount_routes(SitePage::ALL.iter().map(|page| page.path()))
            .await;
        let console = Arc::new(SeoConsole::new(access.clone()));

        let preferences = Arc::new(FilePreferenceStore::new(&runtime_paths.preferences_file));
        let theme = Arc::new(ThemeState::load(preferences, config.theme.default));

        let app_state = Arc::new(AppState::new(
            &config.app.name,
            SeoDefaults::from_config(&config.seo),
            runtime_paths.clone(),
        ));

        Self {
            fixture,
            config,
            runtime_paths,
            store,
            access: Arc::new(access),
            registry,
            console,
            theme,
            app_state,
        }
    }

    pub fn app_bundle(&self) -> AppBundle {
        AppBundle {
            config: self.config.clone(),
            app_state: self.app_state.clone(),
            access: self.access.clone(),
            registry: self.registry.clone(),
            console: self.console.clone(),
            theme: self.theme.clone(),
            admin_path: self.config.admin.path.clone(),
        }
    }

    /// Writes a record through the access layer.
    pub async fn seed(&self, input: MetaInput) -> MetaRecord {
        self.access.upsert(&input).await.expect("seed record")
    }

    /// Polls until the binder for `path` reports `expected_title` in its head.
    pub async fn wait_for_title(&self, path: &str, expected_title: &str) {
        let binder = self.registry.binder_for(path).await;
        let defaults = &self.app_state.seo_defaults;
        for _ in 0..100 {
            if binder.head_tags(defaults, "https://agency.test").title == expected_title {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("binder for {} never reported title {}", path, expected_title);
    }

    pub async fn stored_count(&self) -> usize {
        self.store.list().await.expect("list records").len()
    }
}

pub fn build_test_app(
    bundle: AppBundle,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let admin_path = bundle.admin_path;

    App::new()
        .app_data(web::Data::from(bundle.config))
        .app_data(web::Data::from(bundle.app_state))
        .app_data(web::Data::from(bundle.access))
        .app_data(web::Data::from(bundle.registry))
        .app_data(web::Data::from(bundle.console))
        .app_data(web::Data::from(bundle.theme))
        .configure(move |cfg| admin::configure(cfg, &admin_path))
        .configure(theme::configure)
        .configure(public::configure)
        .default_service(web::route().to(public::handlers::not_found))
}

pub fn record_input(path: &str, title: Option<&str>) -> MetaInput {
    let mut input = MetaInput::for_path(path);
    input.title = title.map(str::to_string);
    input
}

pub async fn body_text(resp: ServiceResponse) -> (actix_web::http::StatusCode, String) {
    let status = resp.status();
    let body = actix_web::test::read_body(resp).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}
