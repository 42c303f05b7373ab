// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Versioned authenticated encryption for stored secrets.
//!
//! Payload layout:
//!
//! ```text
//! [version: u8][nonce: 12 bytes][AES-256-GCM ciphertext + tag]
//! ```
//!
//! Decryption reports [`SecretsError::WrongPassword`] both when the tag does
//! not verify and when the version byte is missing or unknown, so a caller
//! probing with guessed passwords learns nothing about the stored data.

use aes_gcm::{
	aead::{Aead, KeyInit, OsRng},
	Aes256Gcm, Key, Nonce,
};
use lngate_common_secret::SecretBytes;
use rand::RngCore;

use crate::error::{SecretsError, SecretsResult};
use crate::kdf::{ScryptParams, KEY_LEN};

/// Current payload format.
pub const FORMAT_VERSION: u8 = 1;

/// Size of AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

pub struct Crypter {
	cipher: Aes256Gcm,
}

impl Crypter {
	pub fn new(key: &SecretBytes) -> SecretsResult<Self> {
		if key.len() != KEY_LEN {
			return Err(SecretsError::InvalidKeySize {
				expected: KEY_LEN,
				actual: key.len(),
			});
		}
		let key = Key::<Aes256Gcm>::from_slice(key.as_slice());
		Ok(Self {
			cipher: Aes256Gcm::new(key),
		})
	}

	/// Derive the key for `params` from `password` and build a crypter.
	pub fn from_password(password: &[u8], params: &ScryptParams) -> SecretsResult<Self> {
		Self::new(&params.derive(password)?)
	}

	pub fn encrypt(&self, plaintext: &[u8]) -> SecretsResult<Vec<u8>> {
		let mut nonce_bytes = [0u8; NONCE_SIZE];
		OsRng.fill_bytes(&mut nonce_bytes);
		let nonce = Nonce::from_slice(&nonce_bytes);

		let ciphertext = self
			.cipher
			.encrypt(nonce, plaintext)
			.map_err(|e| SecretsError::Encryption(format!("secret encryption failed: {e}")))?;

		let mut out = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
		out.push(FORMAT_VERSION);
		out.extend_from_slice(&nonce_bytes);
		out.extend_from_slice(&ciphertext);
		Ok(out)
	}

	pub fn decrypt(&self, payload: &[u8]) -> SecretsResult<SecretBytes> {
		let Some((&version, rest)) = payload.split_first() else {
			return Err(SecretsError::WrongPassword);
		};
		if version != FORMAT_VERSION || rest.len() < NONCE_SIZE {
			tracing::debug!("payload is not in a known format");
			return Err(SecretsError::WrongPassword);
		}
		let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);
		let plaintext = self
			.cipher
			.decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
			.map_err(|_| SecretsError::WrongPassword)?;
		Ok(SecretBytes::new(plaintext))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn key(byte: u8) -> SecretBytes {
		SecretBytes::new(vec![byte; KEY_LEN])
	}

	#[test]
	fn rejects_short_key() {
		let err = Crypter::new(&SecretBytes::new(vec![0; 16])).err().unwrap();
		assert!(matches!(
			err,
			SecretsError::InvalidKeySize {
				expected: KEY_LEN,
				actual: 16
			}
		));
	}

	#[test]
	fn payload_starts_with_version() {
		let payload = Crypter::new(&key(1)).unwrap().encrypt(b"x").unwrap();
		assert_eq!(payload[0], FORMAT_VERSION);
		assert!(payload.len() > 1 + NONCE_SIZE);
	}

	#[test]
	fn fresh_nonce_per_encryption() {
		let crypter = Crypter::new(&key(1)).unwrap();
		assert_ne!(crypter.encrypt(b"same").unwrap(), crypter.encrypt(b"same").unwrap());
	}

	#[test]
	fn unknown_version_is_wrong_password() {
		let crypter = Crypter::new(&key(1)).unwrap();
		let mut payload = crypter.encrypt(b"secret").unwrap();
		payload[0] = FORMAT_VERSION + 1;
		assert!(matches!(crypter.decrypt(&payload), Err(SecretsError::WrongPassword)));
	}

	#[test]
	fn empty_and_truncated_payloads_are_wrong_password() {
		let crypter = Crypter::new(&key(1)).unwrap();
		assert!(matches!(crypter.decrypt(&[]), Err(SecretsError::WrongPassword)));
		assert!(matches!(
			crypter.decrypt(&[FORMAT_VERSION, 1, 2]),
			Err(SecretsError::WrongPassword)
		));
	}

	#[test]
	fn tampered_ciphertext_fails() {
		let crypter = Crypter::new(&key(1)).unwrap();
		let mut payload = crypter.encrypt(b"secret").unwrap();
		let last = payload.len() - 1;
		payload[last] ^= 0xFF;
		assert!(matches!(crypter.decrypt(&payload), Err(SecretsError::WrongPassword)));
	}

	#[test]
	fn password_crypter_roundtrip() {
		let params = ScryptParams::with_salt(&[9; crate::kdf::SALT_LEN]).unwrap();
		let payload = Crypter::from_password(b"pw", &params)
			.unwrap()
			.encrypt(b"eclair-password")
			.unwrap();
		let plain = Crypter::from_password(b"pw", &params)
			.unwrap()
			.decrypt(&payload)
			.unwrap();
		assert_eq!(plain.as_slice(), b"eclair-password");

		let wrong = Crypter::from_password(b"other", &params).unwrap();
		assert!(matches!(wrong.decrypt(&payload), Err(SecretsError::WrongPassword)));
	}

	proptest! {
		#[test]
		fn roundtrip(
			plaintext in proptest::collection::vec(any::<u8>(), 0..512),
			k in any::<u8>(),
		) {
			let crypter = Crypter::new(&key(k)).unwrap();
			let payload = crypter.encrypt(&plaintext).unwrap();
			let decrypted = crypter.decrypt(&payload).unwrap();
			prop_assert_eq!(decrypted.as_slice(), plaintext.as_slice());
		}

		#[test]
		fn wrong_key_is_wrong_password(
			plaintext in proptest::collection::vec(any::<u8>(), 0..128),
			k1 in any::<u8>(),
			k2 in any::<u8>(),
		) {
			prop_assume!(k1 != k2);
			let payload = Crypter::new(&key(k1)).unwrap().encrypt(&plaintext).unwrap();
			let result = Crypter::new(&key(k2)).unwrap().decrypt(&payload);
			prop_assert!(matches!(result, Err(SecretsError::WrongPassword)));
		}

		#[test]
		fn arbitrary_bytes_are_wrong_password(
			garbage in proptest::collection::vec(any::<u8>(), 0..128),
			k in any::<u8>(),
		) {
			let result = Crypter::new(&key(k)).unwrap().decrypt(&garbage);
			prop_assert!(matches!(result, Err(SecretsError::WrongPassword)));
		}
	}
}
