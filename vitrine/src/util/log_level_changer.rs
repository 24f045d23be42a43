// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use env_logger::Logger;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

/// Rewrites `from` to `to` for records whose target starts with `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRule {
    pub target: String,
    pub from: Level,
    pub to: Level,
}

impl LevelRule {
    pub fn new(target: &str, from: Level, to: Level) -> Self {
        Self {
            target: target.to_string(),
            from,
            to,
        }
    }
}

/// Demotes chatty dependency targets so `info` stays readable.
pub fn default_level_rules() -> Vec<LevelRule> {
    vec![
        LevelRule::new("actix_server", Level::Info, Level::Debug),
        LevelRule::new("reqwest", Level::Debug, Level::Trace),
        LevelRule::new("hyper_util", Level::Debug, Level::Trace),
    ]
}

pub fn parse_level_filter(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

/// `timestamp [LEVEL] target: message` on stdout.
pub fn build_logger(level: LevelFilter) -> Logger {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .build()
}

struct LevelModifierLogger {
    inner: Logger,
    rules: Vec<LevelRule>,
}

impl LevelModifierLogger {
    fn effective_level(&self, target: &str, level: Level) -> Level {
        self.rules
            .iter()
            .find(|rule| rule.from == level && target.starts_with(&rule.target))
            .map(|rule| rule.to)
            .unwrap_or(level)
    }
}

impl Log for LevelModifierLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let level = self.effective_level(metadata.target(), metadata.level());
        self.inner.enabled(
            &Metadata::builder()
                .level(level)
                .target(metadata.target())
                .build(),
        )
    }

    fn log(&self, record: &Record) {
        let level = self.effective_level(record.target(), record.level());
        self.inner.log(
            &Record::builder()
                .level(level)
                .target(record.target())
                .args(*record.args())
                .module_path(record.module_path())
                .file(record.file())
                .line(record.line())
                .build(),
        );
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn init_logger(rules: Vec<LevelRule>, logger: Logger) -> Result<(), SetLoggerError> {
    let max_level = logger.filter();
    log::set_boxed_logger(Box::new(LevelModifierLogger {
        inner: logger,
        rules,
    }))?;
    log::set_max_level(max_level);
    Ok(())
}
