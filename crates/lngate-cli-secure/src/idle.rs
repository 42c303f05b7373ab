// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Status messages printed while the operator waits for entropy.

use std::time::Duration;

struct Tier {
	after: Duration,
	message: &'static str,
}

const TIERS: [Tier; 3] = [
	Tier {
		after: Duration::from_secs(5),
		message: "please keep generating entropy",
	},
	Tier {
		after: Duration::from_secs(15),
		message: "more entropy, please",
	},
	Tier {
		after: Duration::from_secs(30),
		message: "...good things come to those who wait...",
	},
];

/// Extra delay added each time the last tier fires.
const LAST_TIER_BACKOFF: Duration = Duration::from_secs(15);

/// Escalating idle messages.
///
/// Each tier fires once when the idle time passes its threshold. The last
/// tier keeps firing, its threshold growing by [`LAST_TIER_BACKOFF`] each
/// time. Tier progress is never reset; only the idle clock is, by the caller.
#[derive(Debug)]
pub struct IdleNotifier {
	tier: usize,
	last_tier_after: Duration,
}

impl IdleNotifier {
	pub fn new() -> Self {
		Self {
			tier: 0,
			last_tier_after: TIERS[TIERS.len() - 1].after,
		}
	}

	/// Message due after `idle` time without input, if any.
	pub fn poll(&mut self, idle: Duration) -> Option<&'static str> {
		let last = TIERS.len() - 1;
		if self.tier < last {
			let tier = &TIERS[self.tier];
			if idle > tier.after {
				self.tier += 1;
				return Some(tier.message);
			}
			return None;
		}
		if idle > self.last_tier_after {
			self.last_tier_after += LAST_TIER_BACKOFF;
			return Some(TIERS[last].message);
		}
		None
	}
}

impl Default for IdleNotifier {
	fn default() -> Self {
		Self::new()
	}
}
