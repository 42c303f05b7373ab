// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared vocabulary for lngate crates.
//!
//! - [`Implementation`]: the closed set of Lightning node backends lngate fronts
//! - [`BackendCapability`]: what each backend needs in terms of stored secrets
//! - [`str2bool`]: lenient yes/no parsing for prompts and environment switches

pub mod answer;
pub mod implementation;

pub use answer::str2bool;
pub use implementation::{
	BackendCapability, Implementation, ParseImplementationError, SecretPolicy, SecretSource,
	SecretType,
};

/// Plaintext whose successful decryption proves the operator password.
pub const ACCESS_TOKEN: &[u8] = b"lngate-access-token-v1";
