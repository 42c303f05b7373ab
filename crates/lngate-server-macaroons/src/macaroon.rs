// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Macaroon structure, HMAC chain and text serialization.
//!
//! The signature starts as `HMAC(root_key, identifier)` and each
//! first-party caveat folds in as `sig = HMAC(sig, caveat)`. Holders can add
//! caveats to narrow a token but never remove one without the root key.
//!
//! Serialized form is unpadded base64url over the JSON v2 layout:
//!
//! ```text
//! {"v":2,"i64":"<identifier>","c":[{"i":"<caveat>"}...],"s64":"<signature>"}
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{MacaroonError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Format version, also the first identifier byte.
pub const MAC_VERSION: u8 = 2;

/// Random bytes following the version in the identifier.
pub const NONCE_LEN: usize = 16;

pub const SIGNATURE_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macaroon {
	identifier: Vec<u8>,
	caveats: Vec<String>,
	signature: [u8; SIGNATURE_LEN],
}

#[derive(Serialize, Deserialize)]
struct WireCaveat {
	i: String,
}

#[derive(Serialize, Deserialize)]
struct WireMacaroon {
	v: u8,
	i64: String,
	#[serde(default)]
	c: Vec<WireCaveat>,
	s64: String,
}

pub(crate) fn hmac(key: &[u8], data: &[u8]) -> Result<[u8; SIGNATURE_LEN]> {
	let mut mac =
		HmacSha256::new_from_slice(key).map_err(|e| MacaroonError::InvalidKey(e.to_string()))?;
	mac.update(data);
	let mut out = [0u8; SIGNATURE_LEN];
	out.copy_from_slice(&mac.finalize().into_bytes());
	Ok(out)
}

impl Macaroon {
	pub fn new(root_key: &[u8], identifier: Vec<u8>) -> Result<Self> {
		let signature = hmac(root_key, &identifier)?;
		Ok(Self {
			identifier,
			caveats: Vec::new(),
			signature,
		})
	}

	pub fn add_first_party_caveat(&mut self, caveat: impl Into<String>) -> Result<()> {
		let caveat = caveat.into();
		self.signature = hmac(&self.signature, caveat.as_bytes())?;
		self.caveats.push(caveat);
		Ok(())
	}

	pub fn identifier(&self) -> &[u8] {
		&self.identifier
	}

	pub fn caveats(&self) -> &[String] {
		&self.caveats
	}

	pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
		&self.signature
	}

	/// Format version carried in the identifier.
	pub fn version(&self) -> Option<u8> {
		self.identifier.first().copied()
	}

	pub fn serialize(&self) -> Result<String> {
		let wire = WireMacaroon {
			v: MAC_VERSION,
			i64: URL_SAFE_NO_PAD.encode(&self.identifier),
			c: self
				.caveats
				.iter()
				.map(|i| WireCaveat { i: i.clone() })
				.collect(),
			s64: URL_SAFE_NO_PAD.encode(self.signature),
		};
		let json = serde_json::to_vec(&wire)
			.map_err(|e| MacaroonError::Malformed(format!("encode: {e}")))?;
		Ok(URL_SAFE_NO_PAD.encode(json))
	}

	pub fn deserialize(token: &str) -> Result<Self> {
		let json = URL_SAFE_NO_PAD
			.decode(token.trim())
			.map_err(|e| MacaroonError::Malformed(format!("base64: {e}")))?;
		let wire: WireMacaroon = serde_json::from_slice(&json)
			.map_err(|e| MacaroonError::Malformed(format!("json: {e}")))?;
		if wire.v != MAC_VERSION {
			return Err(MacaroonError::UnsupportedVersion(wire.v));
		}
		let identifier = URL_SAFE_NO_PAD
			.decode(&wire.i64)
			.map_err(|e| MacaroonError::Malformed(format!("identifier: {e}")))?;
		let signature: [u8; SIGNATURE_LEN] = URL_SAFE_NO_PAD
			.decode(&wire.s64)
			.map_err(|e| MacaroonError::Malformed(format!("signature: {e}")))?
			.try_into()
			.map_err(|_| MacaroonError::Malformed("signature length".to_string()))?;
		Ok(Self {
			identifier,
			caveats: wire.c.into_iter().map(|c| c.i).collect(),
			signature,
		})
	}
}
