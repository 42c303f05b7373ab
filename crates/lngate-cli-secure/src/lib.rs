// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Interactive provisioning for lngate.
//!
//! Establishes the access password, encrypts the configured backend's
//! credential into the store and optionally bakes the macaroon artifacts.
//! The binary is a thin wrapper around [`Workflow`]; everything that talks
//! to the operator goes through [`Prompter`] so the whole run can be
//! scripted.

pub mod backend;
pub mod cleanup;
pub mod entropy;
pub mod error;
pub mod idle;
pub mod prompt;
pub mod seed;
pub mod workflow;

pub use entropy::{EntropyCollector, EntropySettings};
pub use error::{Result, SecureError};
pub use prompt::{LineEvent, Prompter, Reply, ScriptedPrompter, TerminalPrompter};
pub use seed::SeedPool;
pub use workflow::{migrate_store, Phase, ProvisionOptions, ProvisionReport, Workflow};
