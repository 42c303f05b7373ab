// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Relational secret store for lngate.
//!
//! The store is a single SQLite file holding:
//!
//! - `access_token`: the encrypted constant that verifies the operator
//!   password, plus its scrypt parameters
//! - `implementation_secrets`: encrypted backend credentials keyed by
//!   `(implementation, secret_type)` with an `active` flag
//! - `mac_root_key`: scrypt parameters for the macaroon root key
//!
//! All access goes through a [`Session`]; its operations are also exposed
//! through the [`SecretStore`] trait.

pub mod access_token;
mod error;
pub mod health;
pub mod implementation_secret;
pub mod mac_root_key;
pub mod pool;
pub mod session;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use access_token::AccessTokenRow;
pub use error::{DbError, Result};
pub use health::{HealthIssue, StoreHealth};
pub use implementation_secret::{ImplementationSecretRow, SaveSecretParams};
pub use pool::{migrate, open_store, MIGRATOR};
pub use session::Session;
pub use store::SecretStore;
