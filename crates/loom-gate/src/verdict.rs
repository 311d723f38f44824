// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

/// Outcome of a single guard or a whole guard chain.
///
/// `Undecided` means "no opinion": the chain moves on to the next guard, or
/// the decision moves on to the next phase. `Decided` short-circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Verdict {
	#[default]
	Undecided,
	Decided(bool),
}

impl Verdict {
	pub const fn allow() -> Self {
		Verdict::Decided(true)
	}

	pub const fn deny() -> Self {
		Verdict::Decided(false)
	}

	pub const fn is_decided(&self) -> bool {
		matches!(self, Verdict::Decided(_))
	}

	pub const fn is_undecided(&self) -> bool {
		matches!(self, Verdict::Undecided)
	}

	/// Returns the decided value, if any.
	pub const fn decision(&self) -> Option<bool> {
		match self {
			Verdict::Decided(allowed) => Some(*allowed),
			Verdict::Undecided => None,
		}
	}
}

impl From<bool> for Verdict {
	fn from(allowed: bool) -> Self {
		Verdict::Decided(allowed)
	}
}

impl From<Option<bool>> for Verdict {
	fn from(decision: Option<bool>) -> Self {
		match decision {
			Some(allowed) => Verdict::Decided(allowed),
			None => Verdict::Undecided,
		}
	}
}

impl From<Verdict> for Option<bool> {
	fn from(verdict: Verdict) -> Self {
		verdict.decision()
	}
}

impl fmt::Display for Verdict {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Verdict::Undecided => write!(f, "undecided"),
			Verdict::Decided(true) => write!(f, "allow"),
			Verdict::Decided(false) => write!(f, "deny"),
		}
	}
}
