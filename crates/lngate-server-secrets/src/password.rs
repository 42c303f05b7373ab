// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Generated operator passwords.
//!
//! Each entropy byte maps to one symbol by `byte % len`. That mapping is
//! only uniform when the alphabet size divides 256, so other alphabets are
//! refused.

use lngate_common_secret::SecretString;

use crate::error::{SecretsError, SecretsResult};

/// Base58 plus symbols, 64 in total.
pub const DEFAULT_ALPHABET: &str =
	r"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz+/\&-_";

/// Entropy bytes consumed by a generated password.
pub const PASSWORD_LEN: usize = 24;

#[derive(Debug, Clone)]
pub struct PasswordAlphabet {
	symbols: Vec<char>,
}

impl PasswordAlphabet {
	pub fn new(symbols: &str) -> SecretsResult<Self> {
		let symbols: Vec<char> = symbols.chars().collect();
		if symbols.is_empty() || 256 % symbols.len() != 0 {
			return Err(SecretsError::PasswordAlphabet(symbols.len()));
		}
		Ok(Self { symbols })
	}

	pub fn len(&self) -> usize {
		self.symbols.len()
	}

	pub fn is_empty(&self) -> bool {
		self.symbols.is_empty()
	}

	/// One symbol per seed byte.
	pub fn password(&self, seed: &[u8]) -> SecretString {
		let password = seed
			.iter()
			.map(|b| self.symbols[usize::from(*b) % self.symbols.len()])
			.collect::<String>();
		SecretString::new(password)
	}
}

impl Default for PasswordAlphabet {
	fn default() -> Self {
		Self {
			symbols: DEFAULT_ALPHABET.chars().collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn default_alphabet_is_valid() {
		let alphabet = PasswordAlphabet::new(DEFAULT_ALPHABET).unwrap();
		assert_eq!(alphabet.len(), 64);
	}

	#[test]
	fn rejects_non_divisor_sizes() {
		assert!(matches!(
			PasswordAlphabet::new("abc"),
			Err(SecretsError::PasswordAlphabet(3))
		));
		assert!(PasswordAlphabet::new("").is_err());
		assert!(PasswordAlphabet::new("ab").is_ok());
	}

	#[test]
	fn every_symbol_equally_likely() {
		let alphabet = PasswordAlphabet::default();
		let seed: Vec<u8> = (0..=255u8).collect();
		let password = alphabet.password(&seed);
		for symbol in DEFAULT_ALPHABET.chars() {
			let count = password.expose().chars().filter(|c| *c == symbol).count();
			assert_eq!(count, 4, "symbol {symbol}");
		}
	}

	proptest! {
		#[test]
		fn one_symbol_per_byte(seed in proptest::collection::vec(any::<u8>(), 0..64)) {
			let password = PasswordAlphabet::default().password(&seed);
			prop_assert_eq!(password.expose().chars().count(), seed.len());
			prop_assert!(password.expose().chars().all(|c| DEFAULT_ALPHABET.contains(c)));
		}
	}
}
