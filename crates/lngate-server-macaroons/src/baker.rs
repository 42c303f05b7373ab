// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use lngate_common_secret::SecretBytes;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{MacaroonError, Result};
use crate::macaroon::{Macaroon, MAC_VERSION, NONCE_LEN};
use crate::ops::{Operation, PermissionSet};

pub const TIME_BEFORE_PREFIX: &str = "time-before ";
pub const OPS_PREFIX: &str = "ops ";

/// Default artifact lifetime.
pub const DEFAULT_LIFETIME_DAYS: i64 = 365;

pub fn default_lifetime() -> Duration {
	Duration::days(DEFAULT_LIFETIME_DAYS)
}

/// Issues macaroons from one root key.
///
/// Every token carries a fresh random identifier, so tokens baked from the
/// same root key share nothing but the key.
pub struct Baker {
	root_key: SecretBytes,
}

impl Baker {
	pub fn new(root_key: SecretBytes) -> Self {
		Self { root_key }
	}

	pub fn bake(&self, operations: &[Operation], expires_at: DateTime<Utc>) -> Result<Macaroon> {
		let mut identifier = vec![MAC_VERSION];
		let mut nonce = [0u8; NONCE_LEN];
		OsRng.fill_bytes(&mut nonce);
		identifier.extend_from_slice(&nonce);

		let mut macaroon = Macaroon::new(self.root_key.as_slice(), identifier)?;
		macaroon.add_first_party_caveat(format!(
			"{TIME_BEFORE_PREFIX}{}",
			expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)
		))?;
		let ops = operations
			.iter()
			.map(ToString::to_string)
			.collect::<Vec<_>>()
			.join(" ");
		macaroon.add_first_party_caveat(format!("{OPS_PREFIX}{ops}"))?;
		Ok(macaroon)
	}

	/// Bake every permission set into `dir`, one artifact each.
	#[tracing::instrument(skip(self), fields(dir = %dir.display()))]
	pub fn write_artifacts(&self, dir: &Path, expires_at: DateTime<Utc>) -> Result<Vec<PathBuf>> {
		let mut written = Vec::with_capacity(PermissionSet::ALL.len());
		for set in PermissionSet::ALL {
			let token = self.bake(&set.operations(), expires_at)?.serialize()?;
			let path = dir.join(set.file_name());
			write_private(&path, token.as_bytes())
				.map_err(|source| MacaroonError::Write {
					path: path.clone(),
					source,
				})?;
			tracing::info!(file = set.file_name(), "macaroon written");
			written.push(path);
		}
		Ok(written)
	}
}

fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
	let mut options = fs::OpenOptions::new();
	options.write(true).create(true).truncate(true);
	#[cfg(unix)]
	{
		use std::os::unix::fs::OpenOptionsExt;
		options.mode(0o600);
	}
	let mut file = options.open(path)?;
	file.write_all(contents)?;
	file.sync_all()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn baker() -> Baker {
		Baker::new(SecretBytes::new(vec![7; 32]))
	}

	#[test]
	fn tokens_are_unlinkable() {
		let expires = Utc::now() + default_lifetime();
		let ops = PermissionSet::ReadOnly.operations();
		let a = baker().bake(&ops, expires).unwrap();
		let b = baker().bake(&ops, expires).unwrap();
		assert_ne!(a.identifier(), b.identifier());
		assert_ne!(a.signature(), b.signature());
		assert_eq!(a.version(), Some(MAC_VERSION));
	}

	#[test]
	fn caveats_carry_expiry_and_ops() {
		let expires = DateTime::parse_from_rfc3339("2030-05-01T12:00:00Z")
			.unwrap()
			.with_timezone(&Utc);
		let mac = baker()
			.bake(&PermissionSet::Invoices.operations(), expires)
			.unwrap();
		assert_eq!(mac.caveats()[0], "time-before 2030-05-01T12:00:00Z");
		assert_eq!(mac.caveats()[1], "ops info:read invoice:read invoice:write");
	}

	#[test]
	fn writes_one_private_artifact_per_set() {
		let dir = tempfile::tempdir().unwrap();
		let written = baker()
			.write_artifacts(dir.path(), Utc::now() + default_lifetime())
			.unwrap();
		assert_eq!(written.len(), 3);
		for set in PermissionSet::ALL {
			let path = dir.path().join(set.file_name());
			let token = fs::read_to_string(&path).unwrap();
			assert!(Macaroon::deserialize(&token).is_ok());
			#[cfg(unix)]
			{
				use std::os::unix::fs::PermissionsExt;
				let mode = fs::metadata(&path).unwrap().permissions().mode();
				assert_eq!(mode & 0o777, 0o600);
			}
		}
	}

	#[test]
	fn missing_directory_is_a_write_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = baker()
			.write_artifacts(&dir.path().join("absent"), Utc::now())
			.unwrap_err();
		assert!(matches!(err, MacaroonError::Write { .. }));
	}
}
