// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cryptography for lngate's secret store.
//!
//! - [`ScryptParams`]: per-secret salt plus fixed work factors, serialized
//!   next to each ciphertext
//! - [`Crypter`]: versioned AES-256-GCM payloads
//! - [`PasswordAlphabet`]: uniform password generation from entropy bytes
//! - [`access`]: unlock, secret storage and retrieval over a store session

pub mod access;
pub mod encryption;
mod error;
pub mod kdf;
pub mod password;

pub use access::{
	check_password, create_mac_root_key, derive_mac_root_key, detect_impl_secret, get_secret,
	recover_secret, save_access_token, save_secret, RecoveredSecret,
};
pub use encryption::{Crypter, FORMAT_VERSION};
pub use error::{SecretsError, SecretsResult};
pub use kdf::{ScryptParams, KEY_LEN, MAX_LOG_N, SALT_LEN};
pub use password::{PasswordAlphabet, DEFAULT_ALPHABET, PASSWORD_LEN};
