// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entropy and macaroon settings.

use std::path::PathBuf;

use serde::Deserialize;

const DEFAULT_ENTROPY_SOURCE: &str = "/dev/random";
const DEFAULT_ENTROPY_AVAIL: &str = "/proc/sys/kernel/random/entropy_avail";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SecurityConfigLayer {
	pub entropy_blocking: Option<bool>,
	pub entropy_source: Option<PathBuf>,
	pub entropy_avail_path: Option<PathBuf>,
	pub disable_macaroons: Option<bool>,
	pub insecure_connection: Option<bool>,
}

impl SecurityConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.entropy_blocking.is_some() {
			self.entropy_blocking = other.entropy_blocking;
		}
		if other.entropy_source.is_some() {
			self.entropy_source = other.entropy_source;
		}
		if other.entropy_avail_path.is_some() {
			self.entropy_avail_path = other.entropy_avail_path;
		}
		if other.disable_macaroons.is_some() {
			self.disable_macaroons = other.disable_macaroons;
		}
		if other.insecure_connection.is_some() {
			self.insecure_connection = other.insecure_connection;
		}
	}

	pub fn finalize(self) -> SecurityConfig {
		let insecure_connection = self.insecure_connection.unwrap_or(false);
		SecurityConfig {
			entropy_blocking: self.entropy_blocking.unwrap_or(true),
			entropy_source: self
				.entropy_source
				.unwrap_or_else(|| PathBuf::from(DEFAULT_ENTROPY_SOURCE)),
			entropy_avail_path: self
				.entropy_avail_path
				.unwrap_or_else(|| PathBuf::from(DEFAULT_ENTROPY_AVAIL)),
			// Plaintext transport cannot protect bearer tokens.
			disable_macaroons: insecure_connection || self.disable_macaroons.unwrap_or(false),
			insecure_connection,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityConfig {
	/// Strict entropy mode: read from the blocking source.
	pub entropy_blocking: bool,
	pub entropy_source: PathBuf,
	pub entropy_avail_path: PathBuf,
	pub disable_macaroons: bool,
	pub insecure_connection: bool,
}

impl Default for SecurityConfig {
	fn default() -> Self {
		SecurityConfigLayer::default().finalize()
	}
}
