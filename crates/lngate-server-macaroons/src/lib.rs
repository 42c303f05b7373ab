// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Macaroons for the lngate API.
//!
//! A [`Baker`] turns the password-derived root key into one bearer token per
//! [`PermissionSet`]; the API layer checks presented tokens with a
//! [`Verifier`] holding the same root key. Rotating the root key revokes
//! every token baked from the previous one.

pub mod baker;
mod error;
pub mod macaroon;
pub mod ops;
pub mod verifier;

pub use baker::{default_lifetime, Baker, DEFAULT_LIFETIME_DAYS};
pub use error::{MacaroonError, Result};
pub use macaroon::{Macaroon, MAC_VERSION};
pub use ops::{artifact_names, Action, Operation, PermissionSet, OPERATIONS};
pub use verifier::Verifier;
