// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! API operations and the permission sets baked into macaroon artifacts.

use std::fmt;
use std::str::FromStr;

use crate::error::MacaroonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
	Read,
	Write,
}

impl Action {
	pub fn as_str(&self) -> &'static str {
		match self {
			Action::Read => "read",
			Action::Write => "write",
		}
	}
}

/// An `(entity, action)` pair, written `entity:action` inside caveats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Operation {
	pub entity: &'static str,
	pub action: Action,
}

impl Operation {
	pub const fn read(entity: &'static str) -> Self {
		Self {
			entity,
			action: Action::Read,
		}
	}

	pub const fn write(entity: &'static str) -> Self {
		Self {
			entity,
			action: Action::Write,
		}
	}
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.entity, self.action.as_str())
	}
}

impl FromStr for Operation {
	type Err = MacaroonError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		OPERATIONS
			.iter()
			.copied()
			.find(|op| op.to_string() == s)
			.ok_or_else(|| MacaroonError::Malformed(format!("unknown operation {s}")))
	}
}

/// Every operation the API authorizes.
pub const OPERATIONS: &[Operation] = &[
	Operation::read("info"),
	Operation::read("balance"),
	Operation::read("channel"),
	Operation::write("channel"),
	Operation::read("invoice"),
	Operation::write("invoice"),
	Operation::read("onchain"),
	Operation::write("onchain"),
	Operation::read("payment"),
	Operation::write("payment"),
	Operation::read("peer"),
	Operation::write("peer"),
];

/// A named permission set, one artifact file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionSet {
	Admin,
	ReadOnly,
	Invoices,
}

impl PermissionSet {
	pub const ALL: [PermissionSet; 3] = [
		PermissionSet::Admin,
		PermissionSet::ReadOnly,
		PermissionSet::Invoices,
	];

	pub fn file_name(&self) -> &'static str {
		match self {
			PermissionSet::Admin => "admin.macaroon",
			PermissionSet::ReadOnly => "readonly.macaroon",
			PermissionSet::Invoices => "invoices.macaroon",
		}
	}

	pub fn operations(&self) -> Vec<Operation> {
		match self {
			PermissionSet::Admin => OPERATIONS.to_vec(),
			PermissionSet::ReadOnly => OPERATIONS
				.iter()
				.copied()
				.filter(|op| op.action == Action::Read)
				.collect(),
			PermissionSet::Invoices => vec![
				Operation::read("info"),
				Operation::read("invoice"),
				Operation::write("invoice"),
			],
		}
	}
}

/// File names of every macaroon artifact.
pub fn artifact_names() -> impl Iterator<Item = &'static str> {
	PermissionSet::ALL.into_iter().map(|set| set.file_name())
}
