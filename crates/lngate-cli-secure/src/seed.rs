// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use lngate_common_secret::SecretBytes;

use crate::error::{Result, SecureError};

/// One entropy draw, handed out in non-overlapping slices.
pub struct SeedPool {
	bytes: SecretBytes,
	offset: usize,
}

impl SeedPool {
	pub fn new(bytes: SecretBytes) -> Self {
		Self { bytes, offset: 0 }
	}

	pub fn remaining(&self) -> usize {
		self.bytes.len() - self.offset
	}

	/// Next `len` unused bytes.
	pub fn take(&mut self, len: usize) -> Result<&[u8]> {
		if len > self.remaining() {
			return Err(SecureError::SeedExhausted {
				requested: len,
				remaining: self.remaining(),
			});
		}
		let start = self.offset;
		self.offset += len;
		Ok(&self.bytes.as_slice()[start..self.offset])
	}
}
