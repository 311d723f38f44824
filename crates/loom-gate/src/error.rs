// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for gate evaluation.

use thiserror::Error;

use crate::guard::ChainKind;

/// Error type returned by host-supplied guards and restrictions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;

/// Errors raised while resolving a decision.
///
/// A missing policy or action is never an error; it resolves through the
/// default-allow/default-deny rules instead. Only failures reported by host
/// closures surface here.
#[derive(Debug, Error)]
pub enum GateError {
	#[error("{kind} #{position} failed: {source}")]
	Guard {
		kind: ChainKind,
		position: usize,
		#[source]
		source: BoxError,
	},

	#[error("restriction for {policy}.{action} failed: {source}")]
	Restriction {
		policy: String,
		action: String,
		#[source]
		source: BoxError,
	},
}

impl GateError {
	/// Returns true if the error was raised by a guard.
	pub fn is_guard(&self) -> bool {
		matches!(self, GateError::Guard { .. })
	}

	/// Returns true if the error was raised by a restriction.
	pub fn is_restriction(&self) -> bool {
		matches!(self, GateError::Restriction { .. })
	}
}
