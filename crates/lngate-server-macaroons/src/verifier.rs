// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use lngate_common_secret::SecretBytes;
use sha2::Sha256;

use crate::baker::{OPS_PREFIX, TIME_BEFORE_PREFIX};
use crate::error::{MacaroonError, Result};
use crate::macaroon::{hmac, Macaroon, MAC_VERSION};
use crate::ops::Operation;

/// Checks presented macaroons against the root key.
pub struct Verifier {
	root_key: SecretBytes,
}

impl Verifier {
	pub fn new(root_key: SecretBytes) -> Self {
		Self { root_key }
	}

	/// Verify `token` for `required` at time `now`.
	///
	/// The signature is compared in constant time. Every caveat must be
	/// understood and satisfied; an unknown caveat rejects the token.
	pub fn verify(&self, token: &str, required: Operation, now: DateTime<Utc>) -> Result<()> {
		let macaroon = Macaroon::deserialize(token)?;
		match macaroon.version() {
			Some(MAC_VERSION) => {}
			Some(other) => return Err(MacaroonError::UnsupportedVersion(other)),
			None => return Err(MacaroonError::Malformed("empty identifier".to_string())),
		}
		self.verify_signature(&macaroon)?;

		let required_text = required.to_string();
		let mut permitted = false;
		for caveat in macaroon.caveats() {
			if let Some(ts) = caveat.strip_prefix(TIME_BEFORE_PREFIX) {
				let expires = DateTime::parse_from_rfc3339(ts)
					.map_err(|e| MacaroonError::Malformed(format!("time-before: {e}")))?
					.with_timezone(&Utc);
				if now >= expires {
					return Err(MacaroonError::Expired(expires));
				}
			} else if let Some(ops) = caveat.strip_prefix(OPS_PREFIX) {
				// Several ops caveats intersect.
				permitted = ops.split_whitespace().any(|op| op == required_text);
				if !permitted {
					break;
				}
			} else {
				return Err(MacaroonError::UnknownCaveat(caveat.clone()));
			}
		}

		if !permitted {
			return Err(MacaroonError::OperationDenied(required_text));
		}
		tracing::debug!(operation = %required, "macaroon verified");
		Ok(())
	}

	fn verify_signature(&self, macaroon: &Macaroon) -> Result<()> {
		let mut elements = std::iter::once(macaroon.identifier())
			.chain(macaroon.caveats().iter().map(String::as_bytes))
			.collect::<Vec<_>>();
		let last = elements
			.pop()
			.ok_or_else(|| MacaroonError::Malformed("empty macaroon".to_string()))?;

		let mut key = self.root_key.as_slice().to_vec();
		for element in elements {
			key = hmac(&key, element)?.to_vec();
		}
		let mut mac = Hmac::<Sha256>::new_from_slice(&key)
			.map_err(|e| MacaroonError::InvalidKey(e.to_string()))?;
		mac.update(last);
		mac.verify_slice(macaroon.signature())
			.map_err(|_| MacaroonError::InvalidSignature)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::baker::{default_lifetime, Baker};
	use crate::ops::PermissionSet;
	use chrono::Duration;

	fn root_key(byte: u8) -> SecretBytes {
		SecretBytes::new(vec![byte; 32])
	}

	fn token(set: PermissionSet, expires: DateTime<Utc>) -> String {
		Baker::new(root_key(1))
			.bake(&set.operations(), expires)
			.unwrap()
			.serialize()
			.unwrap()
	}

	#[test]
	fn two_sets_verify_independently() {
		let now = Utc::now();
		let expires = now + default_lifetime();
		let verifier = Verifier::new(root_key(1));
		let admin = token(PermissionSet::Admin, expires);
		let readonly = token(PermissionSet::ReadOnly, expires);

		verifier
			.verify(&admin, Operation::write("payment"), now)
			.unwrap();
		verifier
			.verify(&readonly, Operation::read("payment"), now)
			.unwrap();
		assert!(matches!(
			verifier.verify(&readonly, Operation::write("payment"), now),
			Err(MacaroonError::OperationDenied(_))
		));
	}

	#[test]
	fn expired_token_is_rejected() {
		let now = Utc::now();
		let token = token(PermissionSet::Admin, now - Duration::seconds(1));
		assert!(matches!(
			Verifier::new(root_key(1)).verify(&token, Operation::read("info"), now),
			Err(MacaroonError::Expired(_))
		));
	}

	#[test]
	fn wrong_root_key_is_rejected() {
		let now = Utc::now();
		let token = token(PermissionSet::Admin, now + default_lifetime());
		assert!(matches!(
			Verifier::new(root_key(2)).verify(&token, Operation::read("info"), now),
			Err(MacaroonError::InvalidSignature)
		));
	}

	#[test]
	fn stripped_caveat_breaks_signature() {
		use base64::engine::general_purpose::URL_SAFE_NO_PAD;
		use base64::Engine;

		let now = Utc::now();
		let token = token(PermissionSet::ReadOnly, now + default_lifetime());
		let mut json: serde_json::Value =
			serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&token).unwrap()).unwrap();
		json["c"].as_array_mut().unwrap().truncate(1);
		let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json).unwrap());

		assert!(matches!(
			Verifier::new(root_key(1)).verify(&forged, Operation::write("peer"), now),
			Err(MacaroonError::InvalidSignature)
		));
	}

	#[test]
	fn unknown_caveat_fails_closed() {
		let now = Utc::now();
		let mut mac = Baker::new(root_key(1))
			.bake(&PermissionSet::Admin.operations(), now + default_lifetime())
			.unwrap();
		mac.add_first_party_caveat("ip-address 127.0.0.1").unwrap();
		assert!(matches!(
			Verifier::new(root_key(1)).verify(&mac.serialize().unwrap(), Operation::read("info"), now),
			Err(MacaroonError::UnknownCaveat(_))
		));
	}

	#[test]
	fn attenuation_narrows_permissions() {
		let now = Utc::now();
		let mut mac = Baker::new(root_key(1))
			.bake(&PermissionSet::Admin.operations(), now + default_lifetime())
			.unwrap();
		mac.add_first_party_caveat("ops info:read").unwrap();
		let token = mac.serialize().unwrap();
		let verifier = Verifier::new(root_key(1));
		verifier.verify(&token, Operation::read("info"), now).unwrap();
		assert!(matches!(
			verifier.verify(&token, Operation::read("peer"), now),
			Err(MacaroonError::OperationDenied(_))
		));
	}

	#[test]
	fn garbage_is_malformed() {
		assert!(matches!(
			Verifier::new(root_key(1)).verify("%%%", Operation::read("info"), Utc::now()),
			Err(MacaroonError::Malformed(_))
		));
	}
}
