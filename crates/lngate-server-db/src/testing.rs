// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::pool::MIGRATOR;

/// In-memory store without any schema. One connection, never recycled, so
/// every query sees the same database.
pub async fn create_empty_pool() -> SqlitePool {
	SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect("sqlite::memory:")
		.await
		.unwrap()
}

/// In-memory store migrated to head.
pub async fn create_test_pool() -> SqlitePool {
	let pool = create_empty_pool().await;
	MIGRATOR.run(&pool).await.unwrap();
	pool
}

pub async fn create_legacy_salt_table(pool: &SqlitePool) {
	sqlx::query("CREATE TABLE salt_table (data BLOB)")
		.execute(pool)
		.await
		.unwrap();
}
