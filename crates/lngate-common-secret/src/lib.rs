// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wrapper for sensitive material handled while provisioning lngate.
//!
//! Operator passwords, scrypt-derived keys, decrypted backend credentials and
//! macaroon root keys all travel inside [`Secret<T>`]. The wrapper:
//!
//! - renders `[REDACTED]` for `Debug`, `Display` and `Serialize`, so a stray
//!   `tracing::debug!(?password)` cannot leak anything
//! - zeroizes its contents on drop
//! - has no `Deref`; callers opt in with [`Secret::expose`]
//!
//! ```
//! use lngate_common_secret::{Secret, SecretBytes};
//!
//! let password = Secret::new("correct horse".to_string());
//! assert_eq!(format!("{password}"), "[REDACTED]");
//! assert_eq!(password.expose(), "correct horse");
//!
//! let key: SecretBytes = Secret::new(vec![0u8; 32]);
//! assert_eq!(format!("{key:?}"), "Secret(\"[REDACTED]\")");
//! ```

use std::fmt;
use zeroize::Zeroize;

/// The redaction placeholder used in all output.
pub const REDACTED: &str = "[REDACTED]";

/// A sensitive value that never prints and is wiped on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

/// Passwords and other textual secrets.
pub type SecretString = Secret<String>;

/// Keys, decrypted credentials and raw entropy.
pub type SecretBytes = Secret<Vec<u8>>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Explicitly access the inner value.
	pub fn expose(&self) -> &T {
		&self.inner
	}

	pub fn expose_mut(&mut self) -> &mut T {
		&mut self.inner
	}
}

impl SecretString {
	/// Borrow the password as bytes for key derivation.
	pub fn as_bytes(&self) -> &[u8] {
		self.inner.as_bytes()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl SecretBytes {
	pub fn as_slice(&self) -> &[u8] {
		&self.inner
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<Vec<u8>> for SecretBytes {
	fn from(value: Vec<u8>) -> Self {
		Self::new(value)
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

#[cfg(feature = "serde")]
mod serde_impl {
	use super::{Secret, REDACTED};
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	impl<T> Serialize for Secret<T>
	where
		T: Serialize + Zeroize,
	{
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			serializer.serialize_str(REDACTED)
		}
	}

	impl<'de, T> Deserialize<'de> for Secret<T>
	where
		T: Deserialize<'de> + Zeroize,
	{
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: Deserializer<'de>,
		{
			T::deserialize(deserializer).map(Secret::new)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn password_is_redacted_in_debug_and_display() {
		let password = Secret::new("correct-horse".to_string());
		assert_eq!(format!("{password}"), REDACTED);
		assert!(!format!("{password:?}").contains("correct-horse"));
	}

	#[test]
	fn derived_key_bytes_are_redacted() {
		let key: SecretBytes = vec![0xAB; 32].into();
		let debug = format!("{key:?}");
		assert!(debug.contains(REDACTED));
		assert!(!debug.contains("171"));
		assert_eq!(key.len(), 32);
	}

	#[test]
	fn optional_credential_debug_is_redacted() {
		let stored: Option<SecretBytes> = Some(b"lnd-macaroon".to_vec().into());
		assert!(!format!("{stored:?}").contains("lnd"));
	}

	#[test]
	fn equality_compares_inner_values() {
		let a = Secret::new("pw".to_string());
		let b = Secret::new("pw".to_string());
		let c = Secret::new("other".to_string());
		assert_eq!(a, b);
		assert_ne!(a, c);
	}

	#[cfg(feature = "serde")]
	#[test]
	fn serialize_is_redacted_deserialize_is_not() {
		let secret = Secret::new("eclair-password".to_string());
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, format!("\"{REDACTED}\""));

		let parsed: SecretString = serde_json::from_str("\"eclair-password\"").unwrap();
		assert_eq!(parsed.expose(), "eclair-password");
	}

	proptest! {
		#[test]
		fn display_never_contains_secret(inner in "[a-zA-Z0-9+/&_-]{3,64}") {
			prop_assume!(!inner.contains("REDACTED"));
			let secret = Secret::new(inner.clone());
			let displayed = format!("{secret}");
			let debugged = format!("{secret:?}");
			prop_assert!(!displayed.contains(&inner));
			prop_assert!(!debugged.contains(&inner));
		}

		#[test]
		fn expose_roundtrips(inner in proptest::collection::vec(any::<u8>(), 0..128)) {
			let secret = SecretBytes::new(inner.clone());
			prop_assert_eq!(secret.as_slice(), inner.as_slice());
		}
	}
}
