// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Interpret an operator answer or environment switch as a boolean.
///
/// With `default_true` unset only `yes`, `true`, `y` and `1` are true and an
/// empty answer is false (`[y/N]` prompts). With `default_true` set only
/// `no`, `false`, `n` and `0` are false and an empty answer is true
/// (`[Y/n]` prompts).
pub fn str2bool(answer: &str, default_true: bool) -> bool {
	let answer = answer.trim().to_ascii_lowercase();
	if answer.is_empty() {
		return default_true;
	}
	if default_true {
		!matches!(answer.as_str(), "no" | "false" | "n" | "0")
	} else {
		matches!(answer.as_str(), "yes" | "true" | "y" | "1")
	}
}
