// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum MacaroonError {
	#[error("Invalid root key: {0}")]
	InvalidKey(String),

	#[error("Malformed macaroon: {0}")]
	Malformed(String),

	#[error("Unsupported macaroon version {0}")]
	UnsupportedVersion(u8),

	#[error("Macaroon signature does not verify")]
	InvalidSignature,

	#[error("Macaroon expired at {0}")]
	Expired(DateTime<Utc>),

	#[error("Operation {0} is not permitted by this macaroon")]
	OperationDenied(String),

	#[error("Unknown caveat: {0}")]
	UnknownCaveat(String),

	#[error("Failed to write {path}: {source}")]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

pub type Result<T> = std::result::Result<T, MacaroonError>;
