// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Singleton macaroon root-key parameters. Only the scrypt parameters are
//! stored; the root key itself is re-derived from the operator password.

use crate::error::Result;
use crate::session::Session;

impl Session {
	#[tracing::instrument(skip(self))]
	pub async fn get_mac_root_params(&mut self) -> Result<Option<Vec<u8>>> {
		let params = sqlx::query_scalar("SELECT scrypt_params FROM mac_root_key WHERE id = 1")
			.fetch_optional(self.conn())
			.await?;
		Ok(params)
	}

	/// Insert or replace the singleton row. Replacing it rotates the root
	/// key, revoking every macaroon baked from the previous one.
	#[tracing::instrument(skip_all)]
	pub async fn save_mac_root_params(&mut self, scrypt_params: &[u8]) -> Result<()> {
		sqlx::query("INSERT OR REPLACE INTO mac_root_key (id, scrypt_params) VALUES (1, ?)")
			.bind(scrypt_params)
			.execute(self.conn())
			.await?;

		tracing::debug!("macaroon root key parameters stored");
		Ok(())
	}
}
