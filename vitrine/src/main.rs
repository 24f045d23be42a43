// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use vitrine::admin::{self, seo::SeoConsole};
use vitrine::app_state::AppState;
use vitrine::bootstrap::{self, BootstrapResult};
use vitrine::config::{ValidatedConfig, ValidatedStoreConfig};
use vitrine::meta::{self, BinderRegistry, MetaAccess, SeoDefaults};
use vitrine::public::{self, site::SitePage};
use vitrine::runtime_paths::RuntimePaths;
use vitrine::theme::{self, FilePreferenceStore, ThemeState};
use vitrine::util;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    if matches!(parsed_args.mode, RunMode::Help) {
        print!("{}", help_text());
        return 0;
    }

    let bootstrap = match bootstrap::bootstrap_runtime(&parsed_args.runtime_root) {
        Ok(result) => result,
        Err(error) => {
            eprintln!("❌ Bootstrap error: {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };

    match System::new().block_on(run_server(bootstrap)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("❌ Server failed to start: {}", error);
            1
        }
    }
}

async fn run_server(bootstrap: BootstrapResult) -> std::io::Result<()> {
    let validated_config = Arc::new(bootstrap.validated_config);
    let runtime_paths = bootstrap.runtime_paths;

    let logger = util::build_logger(util::parse_level_filter(&validated_config.logging.level));
    util::init_logger(util::default_level_rules(), logger).map_err(|error| {
        eprintln!("❌ Failed to initialize logger: {}", error);
        std::io::Error::other(error.to_string())
    })?;

    log_startup_info(&validated_config, &runtime_paths);

    let store = match meta::open_store(&validated_config, &runtime_paths) {
        Ok(store) => store,
        Err(error) => {
            eprintln!("❌ Failed to open metadata store: {}", error);
            return Err(std::io::Error::other(error.to_string()));
        }
    };
    let access = MetaAccess::new(store);

    let registry = Arc::new(BinderRegistry::new(access.clone()));
    registry
        .mount_routes(SitePage::ALL.iter().map(|page| page.path()))
        .await;
    info!("✅ Page metadata binders mounted for {} routes", SitePage::ALL.len());

    let console = Arc::new(SeoConsole::new(access.clone()));
    let access = Arc::new(access);

    let preferences = Arc::new(FilePreferenceStore::new(&runtime_paths.preferences_file));
    let theme_state = Arc::new(ThemeState::load(preferences, validated_config.theme.default));
    info!("✅ Theme loaded: {}", theme_state.current());

    let app_state = Arc::new(AppState::new(
        &validated_config.app.name,
        SeoDefaults::from_config(&validated_config.seo),
        runtime_paths.clone(),
    ));
    info!(
        "✅ App state initialized with app name: {}",
        validated_config.app.name
    );

    let admin_path = validated_config.admin.path.clone();
    let workers = validated_config.server.workers;
    let bind_address = validated_config.bind_address();

    let factory = {
        let config = validated_config.clone();
        move || {
            let admin_path = admin_path.clone();
            App::new()
                .app_data(web::Data::from(config.clone()))
                .app_data(web::Data::from(app_state.clone()))
                .app_data(web::Data::from(access.clone()))
                .app_data(web::Data::from(registry.clone()))
                .app_data(web::Data::from(console.clone()))
                .app_data(web::Data::from(theme_state.clone()))
                .wrap(Logger::new(
                    r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#,
                ))
                .configure(move |cfg| admin::configure(cfg, &admin_path))
                .configure(theme::configure)
                .configure(public::configure)
                .default_service(web::route().to(public::handlers::not_found))
        }
    };

    HttpServer::new(factory)
        .workers(workers)
        .bind(bind_address)?
        .run()
        .await
}

fn log_startup_info(config: &ValidatedConfig, runtime_paths: &RuntimePaths) {
    info!("Starting {} - {}", config.app.name, config.app.description);
    info!("Workers: {}", config.server.workers);
    info!("Listening on {}:{}", config.server.host, config.server.port);
    info!(
        "SEO dashboard available at: http://{}:{}{}",
        config.server.host, config.server.port, config.admin.path
    );
    match &config.store {
        ValidatedStoreConfig::File => info!(
            "Metadata file: {}",
            runtime_paths.meta_store_file.display()
        ),
        ValidatedStoreConfig::Remote(remote) => info!(
            "Metadata service: {} (collection {})",
            remote.base_url, remote.collection
        ),
    }
    info!("Config file: {}", runtime_paths.config_file.display());
    info!("Runtime root: {}", runtime_paths.root.display());

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {}", current_dir.display());
    }
}

fn help_text() -> String {
    let mut text = String::new();
    text.push_str("Usage: vitrine [-C <root>]\n\n");
    text.push_str("Serves the agency site and its SEO dashboard.\n\n");
    text.push_str("Options:\n");
    text.push_str("  -C <root>    Runtime directory holding config.yaml and state/ (default: .)\n");
    text.push_str("  -h, --help   Show this help\n");
    text
}

#[derive(Debug)]
enum RunMode {
    Serve,
    Help,
}

struct ParsedArgs {
    runtime_root: PathBuf,
    mode: RunMode,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(ParsedArgs {
            runtime_root: PathBuf::from("."),
            mode: RunMode::Help,
        });
    }

    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");

    while let Some(arg) = args.next() {
        if arg == "--" {
            continue;
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = PathBuf::from(value);
        } else {
            return Err(format!("Unexpected argument '{}'", arg));
        }
    }

    Ok(ParsedArgs {
        runtime_root: make_runtime_root_absolute(runtime_root)?,
        mode: RunMode::Serve,
    })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}

#[cfg(test)]
mod tests {
    use super::{RunMode, help_text, parse_args_from};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_args_defaults_to_serving_from_cwd() {
        let parsed = parse_args_from(Vec::new()).expect("parse args");
        assert!(matches!(parsed.mode, RunMode::Serve));
        assert!(parsed.runtime_root.is_absolute());
    }

    #[test]
    fn parse_args_accepts_runtime_root() {
        let parsed = parse_args_from(args(&["-C", "runtime"])).expect("parse args");
        assert!(matches!(parsed.mode, RunMode::Serve));
        assert!(parsed.runtime_root.ends_with("runtime"));
    }

    #[test]
    fn parse_args_ignores_double_dash() {
        let parsed = parse_args_from(args(&["--", "-C", "runtime"])).expect("parse args");
        assert!(parsed.runtime_root.ends_with("runtime"));
    }

    #[test]
    fn parse_args_requires_value_for_root() {
        match parse_args_from(args(&["-C"])) {
            Err(error) => assert!(error.contains("-C")),
            Ok(_) => panic!("expected missing value error"),
        }
    }

    #[test]
    fn parse_args_rejects_unknown_arguments() {
        assert!(parse_args_from(args(&["serve"])).is_err());
    }

    #[test]
    fn help_flag_wins_over_other_arguments() {
        let parsed = parse_args_from(args(&["-C", "runtime", "--help"])).expect("parse args");
        assert!(matches!(parsed.mode, RunMode::Help));
        assert!(help_text().contains("-C <root>"));
    }
}
