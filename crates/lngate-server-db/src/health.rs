// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-only consistency check of an existing store.
//!
//! A store is unusable when it still carries the legacy salt table, lacks
//! the access token, lacks the macaroon root-key parameters while macaroons
//! are required, lacks a table, or has not applied every embedded
//! migration. Nothing here writes; the check can run any number of times.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::Result;
use crate::pool::MIGRATOR;
use crate::session::Session;

const LEGACY_SALT_TABLE: &str = "salt_table";
const MIGRATIONS_TABLE: &str = "_sqlx_migrations";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreHealth {
	Ok,
	/// Layout is outdated or partially created.
	Stale(HealthIssue),
	/// Layout is fine but essential data was never written.
	Missing(HealthIssue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthIssue {
	LegacyLayout,
	MissingTable(&'static str),
	AccessTokenAbsent,
	MacRootKeyAbsent,
	NotAtHead,
}

impl StoreHealth {
	pub fn is_ok(&self) -> bool {
		matches!(self, StoreHealth::Ok)
	}
}

impl fmt::Display for HealthIssue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HealthIssue::LegacyLayout => f.write_str("obsolete table layout detected"),
			HealthIssue::MissingTable(name) => write!(f, "table {name} is missing"),
			HealthIssue::AccessTokenAbsent => f.write_str("access token is missing"),
			HealthIssue::MacRootKeyAbsent => {
				f.write_str("macaroon root key was never generated, create macaroons at least once")
			}
			HealthIssue::NotAtHead => f.write_str("migrations may not have applied correctly"),
		}
	}
}

impl Session {
	async fn has_table(&mut self, name: &str) -> Result<bool> {
		let count: i64 =
			sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
				.bind(name)
				.fetch_one(self.conn())
				.await?;
		Ok(count > 0)
	}

	async fn is_at_head(&mut self) -> Result<bool> {
		if !self.has_table(MIGRATIONS_TABLE).await? {
			return Ok(false);
		}
		let applied: Vec<i64> =
			sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = 1")
				.fetch_all(self.conn())
				.await?;
		let applied: BTreeSet<i64> = applied.into_iter().collect();
		let embedded: BTreeSet<i64> = MIGRATOR
			.iter()
			.filter(|m| !m.migration_type.is_down_migration())
			.map(|m| m.version)
			.collect();
		Ok(applied == embedded)
	}

	/// Check the store before unlocking it.
	///
	/// `requires_macaroons` is false when macaroons are disabled or when the
	/// caller is about to (re)create them.
	#[tracing::instrument(skip(self))]
	pub async fn health_check(&mut self, requires_macaroons: bool) -> Result<StoreHealth> {
		if self.has_table(LEGACY_SALT_TABLE).await? {
			return Ok(StoreHealth::Stale(HealthIssue::LegacyLayout));
		}
		if !self.has_table("access_token").await? {
			return Ok(StoreHealth::Stale(HealthIssue::MissingTable("access_token")));
		}
		if self.get_access_token().await?.is_none() {
			return Ok(StoreHealth::Missing(HealthIssue::AccessTokenAbsent));
		}
		if requires_macaroons {
			if !self.has_table("mac_root_key").await? {
				return Ok(StoreHealth::Stale(HealthIssue::MissingTable("mac_root_key")));
			}
			if self.get_mac_root_params().await?.is_none() {
				tracing::error!("Please make sure you have generated macaroons at least once");
				return Ok(StoreHealth::Missing(HealthIssue::MacRootKeyAbsent));
			}
		}
		if !self.has_table("implementation_secrets").await? {
			return Ok(StoreHealth::Stale(HealthIssue::MissingTable(
				"implementation_secrets",
			)));
		}
		if !self.is_at_head().await? {
			tracing::error!("Migrations may not have applied correctly");
			return Ok(StoreHealth::Stale(HealthIssue::NotAtHead));
		}
		Ok(StoreHealth::Ok)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_empty_pool, create_legacy_salt_table, create_test_pool};

	async fn configured_session(pool: &sqlx::SqlitePool) -> Session {
		let mut session = Session::begin(pool).await.unwrap();
		session.save_access_token(b"token", b"params").await.unwrap();
		session
	}

	#[tokio::test]
	async fn fresh_store_misses_access_token() {
		let pool = create_test_pool().await;
		let mut session = Session::begin(&pool).await.unwrap();
		assert_eq!(
			session.health_check(false).await.unwrap(),
			StoreHealth::Missing(HealthIssue::AccessTokenAbsent)
		);
	}

	#[tokio::test]
	async fn configured_store_is_ok_without_macaroons() {
		let pool = create_test_pool().await;
		let mut session = configured_session(&pool).await;
		assert!(session.health_check(false).await.unwrap().is_ok());
	}

	#[tokio::test]
	async fn macaroons_required_but_absent() {
		let pool = create_test_pool().await;
		let mut session = configured_session(&pool).await;
		assert_eq!(
			session.health_check(true).await.unwrap(),
			StoreHealth::Missing(HealthIssue::MacRootKeyAbsent)
		);

		session.save_mac_root_params(b"salt").await.unwrap();
		assert!(session.health_check(true).await.unwrap().is_ok());
	}

	#[tokio::test]
	async fn legacy_layout_is_stale() {
		let pool = create_test_pool().await;
		create_legacy_salt_table(&pool).await;
		let mut session = configured_session(&pool).await;
		assert_eq!(
			session.health_check(false).await.unwrap(),
			StoreHealth::Stale(HealthIssue::LegacyLayout)
		);
	}

	#[tokio::test]
	async fn missing_secrets_table_is_not_ok() {
		let pool = create_test_pool().await;
		sqlx::query("DROP TABLE implementation_secrets")
			.execute(&pool)
			.await
			.unwrap();
		let mut session = configured_session(&pool).await;
		assert_eq!(
			session.health_check(false).await.unwrap(),
			StoreHealth::Stale(HealthIssue::MissingTable("implementation_secrets"))
		);
	}

	#[tokio::test]
	async fn unversioned_schema_is_not_at_head() {
		let pool = create_empty_pool().await;
		for migration in MIGRATOR.iter() {
			sqlx::raw_sql(&migration.sql).execute(&pool).await.unwrap();
		}
		let mut session = configured_session(&pool).await;
		assert_eq!(
			session.health_check(false).await.unwrap(),
			StoreHealth::Stale(HealthIssue::NotAtHead)
		);
	}

	#[tokio::test]
	async fn check_is_repeatable_and_read_only() {
		let pool = create_test_pool().await;
		let mut session = configured_session(&pool).await;
		let first = session.health_check(true).await.unwrap();
		let second = session.health_check(true).await.unwrap();
		assert_eq!(first, second);
		assert!(session.get_mac_root_params().await.unwrap().is_none());
	}
}
