// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a mergeable `*ConfigLayer` and a
//! resolved `*Config`.

mod backend;
mod database;
mod logging;
mod paths;
mod security;

pub use backend::{BackendConfig, BackendConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use paths::{PathsConfig, PathsConfigLayer};
pub use security::{SecurityConfig, SecurityConfigLayer};
