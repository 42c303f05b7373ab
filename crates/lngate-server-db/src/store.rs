// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use lngate_common_core::{Implementation, SecretType};

use crate::access_token::AccessTokenRow;
use crate::error::Result;
use crate::health::StoreHealth;
use crate::implementation_secret::{ImplementationSecretRow, SaveSecretParams};
use crate::session::Session;

/// Operations available inside one store session.
///
/// Higher layers (password checks, secret retrieval, provisioning) are
/// written against this trait rather than against [`Session`] directly.
#[async_trait]
pub trait SecretStore: Send {
	async fn get_access_token(&mut self) -> Result<Option<AccessTokenRow>>;

	async fn save_access_token(&mut self, data: &[u8], scrypt_params: &[u8]) -> Result<()>;

	async fn get_mac_root_params(&mut self) -> Result<Option<Vec<u8>>>;

	async fn save_mac_root_params(&mut self, scrypt_params: &[u8]) -> Result<()>;

	async fn get_implementation_secret(
		&mut self,
		implementation: Implementation,
		secret_type: SecretType,
	) -> Result<Option<ImplementationSecretRow>>;

	async fn save_implementation_secret(&mut self, params: SaveSecretParams<'_>) -> Result<()>;

	async fn set_implementation_secret_active(
		&mut self,
		implementation: Implementation,
		secret_type: SecretType,
		active: bool,
	) -> Result<()>;

	async fn health_check(&mut self, requires_macaroons: bool) -> Result<StoreHealth>;
}

#[async_trait]
impl SecretStore for Session {
	async fn get_access_token(&mut self) -> Result<Option<AccessTokenRow>> {
		Session::get_access_token(self).await
	}

	async fn save_access_token(&mut self, data: &[u8], scrypt_params: &[u8]) -> Result<()> {
		Session::save_access_token(self, data, scrypt_params).await
	}

	async fn get_mac_root_params(&mut self) -> Result<Option<Vec<u8>>> {
		Session::get_mac_root_params(self).await
	}

	async fn save_mac_root_params(&mut self, scrypt_params: &[u8]) -> Result<()> {
		Session::save_mac_root_params(self, scrypt_params).await
	}

	async fn get_implementation_secret(
		&mut self,
		implementation: Implementation,
		secret_type: SecretType,
	) -> Result<Option<ImplementationSecretRow>> {
		Session::get_implementation_secret(self, implementation, secret_type).await
	}

	async fn save_implementation_secret(&mut self, params: SaveSecretParams<'_>) -> Result<()> {
		Session::save_implementation_secret(self, params).await
	}

	async fn set_implementation_secret_active(
		&mut self,
		implementation: Implementation,
		secret_type: SecretType,
		active: bool,
	) -> Result<()> {
		Session::set_implementation_secret_active(self, implementation, secret_type, active).await
	}

	async fn health_check(&mut self, requires_macaroons: bool) -> Result<StoreHealth> {
		Session::health_check(self, requires_macaroons).await
	}
}
