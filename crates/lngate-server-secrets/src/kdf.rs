// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! scrypt key derivation.
//!
//! Work factors are process-wide constants; only the salt differs between
//! instances. Parameters are stored next to the ciphertext they protect in
//! a compact binary layout:
//!
//! ```text
//! [log_n: u8][r: u32 be][p: u32 be][key_len: u8][salt ...]
//! ```
//!
//! Storing the work factors keeps old records readable if the constants are
//! ever raised. Stored parameters are bounded on the way in, so a tampered
//! row cannot make derivation allocate without limit.

use lngate_common_secret::SecretBytes;

use crate::error::{SecretsError, SecretsResult};

/// Salt length in bytes. Every secret gets its own salt.
pub const SALT_LEN: usize = 32;

/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

#[cfg(not(test))]
const LOG_N: u8 = 15;
// Fast, insecure work factor for tests ONLY.
#[cfg(test)]
const LOG_N: u8 = 4;

/// Largest accepted `log2(N)`: 1 GiB of scrypt memory at `r = 8`.
pub const MAX_LOG_N: u8 = 20;
const MAX_R: u32 = 16;
const MAX_P: u32 = 16;

const R: u32 = 8;
const P: u32 = 1;

const HEADER_LEN: usize = 1 + 4 + 4 + 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScryptParams {
	salt: Vec<u8>,
	log_n: u8,
	r: u32,
	p: u32,
	key_len: u8,
}

impl ScryptParams {
	/// Parameters with the process-wide work factors and the given salt.
	///
	/// `salt` must be exactly [`SALT_LEN`] bytes, taken from a fresh entropy
	/// draw that is not used for anything else.
	pub fn with_salt(salt: &[u8]) -> SecretsResult<Self> {
		Self::with_log_n(salt, LOG_N)
	}

	/// Like [`ScryptParams::with_salt`] with an explicit `log2(N)`.
	///
	/// Production callers use the default cost; a cheaper one is only for
	/// test suites of dependent crates.
	pub fn with_log_n(salt: &[u8], log_n: u8) -> SecretsResult<Self> {
		let params = Self {
			salt: salt.to_vec(),
			log_n,
			r: R,
			p: P,
			key_len: KEY_LEN as u8,
		};
		params.validate()?;
		Ok(params)
	}

	pub fn log_n(&self) -> u8 {
		self.log_n
	}

	pub fn salt(&self) -> &[u8] {
		&self.salt
	}

	pub fn serialize(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(HEADER_LEN + self.salt.len());
		out.push(self.log_n);
		out.extend_from_slice(&self.r.to_be_bytes());
		out.extend_from_slice(&self.p.to_be_bytes());
		out.push(self.key_len);
		out.extend_from_slice(&self.salt);
		out
	}

	pub fn deserialize(bytes: &[u8]) -> SecretsResult<Self> {
		if bytes.len() <= HEADER_LEN {
			return Err(SecretsError::InvalidParams(format!(
				"serialized params too short ({} bytes)",
				bytes.len()
			)));
		}
		let (header, salt) = bytes.split_at(HEADER_LEN);
		let word = |range: std::ops::Range<usize>| {
			let mut buf = [0u8; 4];
			buf.copy_from_slice(&header[range]);
			u32::from_be_bytes(buf)
		};
		let params = Self {
			salt: salt.to_vec(),
			log_n: header[0],
			r: word(1..5),
			p: word(5..9),
			key_len: header[9],
		};
		params.validate()?;
		Ok(params)
	}

	fn validate(&self) -> SecretsResult<()> {
		let invalid = |message: String| Err(SecretsError::InvalidParams(message));
		if self.salt.len() != SALT_LEN {
			return invalid(format!("salt must be {SALT_LEN} bytes, got {}", self.salt.len()));
		}
		if usize::from(self.key_len) != KEY_LEN {
			return invalid(format!("key length must be {KEY_LEN}, got {}", self.key_len));
		}
		if self.log_n == 0 || self.log_n > MAX_LOG_N {
			return invalid(format!("log_n {} outside 1..={MAX_LOG_N}", self.log_n));
		}
		if self.r == 0 || self.r > MAX_R || self.p == 0 || self.p > MAX_P {
			return invalid(format!("r={} p={} out of range", self.r, self.p));
		}
		self.scrypt_params().map(|_| ())
	}

	fn scrypt_params(&self) -> SecretsResult<scrypt::Params> {
		scrypt::Params::new(self.log_n, self.r, self.p, usize::from(self.key_len))
			.map_err(|e| SecretsError::InvalidParams(e.to_string()))
	}

	/// Derive a key from `password`. Deterministic and deliberately slow.
	pub fn derive(&self, password: &[u8]) -> SecretsResult<SecretBytes> {
		let params = self.scrypt_params()?;
		let mut key = SecretBytes::new(vec![0u8; usize::from(self.key_len)]);
		scrypt::scrypt(password, &self.salt, &params, key.expose_mut())
			.map_err(|e| SecretsError::InvalidParams(e.to_string()))?;
		Ok(key)
	}
}
