// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Best-effort removal of the store and macaroon artifacts.
//!
//! Used for `--rm-db` and after a failed or interrupted first-time setup.
//! Missing files are expected here and never reported as errors.

use std::io;
use std::path::Path;

use lngate_server_macaroons::artifact_names;

fn remove_quietly(path: &Path) {
	match std::fs::remove_file(path) {
		Ok(()) => tracing::info!(path = %path.display(), "removed"),
		Err(err) if err.kind() == io::ErrorKind::NotFound => {}
		Err(err) => tracing::warn!(path = %path.display(), error = %err, "could not remove"),
	}
}

pub fn remove_artifacts(macaroons_dir: &Path) {
	for name in artifact_names() {
		remove_quietly(&macaroons_dir.join(name));
	}
}

#[tracing::instrument(skip_all)]
pub fn remove_store_files(db_path: &Path, macaroons_dir: &Path) {
	tracing::info!("Removing database and macaroons");
	remove_quietly(db_path);
	// Rollback journal left by an interrupted transaction.
	let mut journal = db_path.as_os_str().to_owned();
	journal.push("-journal");
	remove_quietly(Path::new(&journal));
	remove_artifacts(macaroons_dir);
}
