// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod log_level_changer;
pub mod test_config;
pub mod test_fixtures;
pub mod yaml_store;

pub use log_level_changer::{
    LevelRule, build_logger, default_level_rules, init_logger, parse_level_filter,
};
pub use test_config::{TestConfigBuilder, test_config};
