// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

/// Configuration for a [`Gate`](crate::Gate).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
	/// Initial default-allow flag for decisions that no guard has settled.
	///
	/// With `false` (the default) a missing policy or action is denied. Each
	/// decision can still be flipped with `allow_default()` / `deny_default()`.
	pub allow_default: bool,
}

impl GateConfig {
	pub fn allow_by_default() -> Self {
		Self {
			allow_default: true,
		}
	}
}
