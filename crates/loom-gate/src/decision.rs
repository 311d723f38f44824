// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-request access decisions.
//!
//! A [`Decision`] is created by [`Representative::access`](crate::Representative::access)
//! for one `(policy, action)` pair. It is in one of two states:
//!
//! 1. **Guard-decided**: a global or policy guard already settled the
//!    outcome. `can`/`could` return it without running anything.
//! 2. **Pending**: resolved on `can`/`could` by running, in order:
//!    - the lazy guards (global first, then policy);
//!    - for `could` only, the async lazy guards (global first, then policy);
//!    - the restriction phase: default-allow, else the restriction, else the
//!      default flag.

use tracing::debug;

use crate::dependencies::{Dependencies, RestrictionContext};
use crate::error::{GateError, Result};
use crate::evaluator::{evaluate_async_guards, evaluate_guards};
use crate::guard::{AsyncLazyGuard, ChainKind, LazyGuard};
use crate::policy::Restriction;

#[derive(Debug, Clone, Copy)]
enum Phase {
	Guard,
	LazyGuard,
	AsyncLazyGuard,
	Default,
	Restriction,
}

impl Phase {
	fn as_str(&self) -> &'static str {
		match self {
			Phase::Guard => "guard",
			Phase::LazyGuard => "lazy_guard",
			Phase::AsyncLazyGuard => "async_lazy_guard",
			Phase::Default => "default",
			Phase::Restriction => "restriction",
		}
	}
}

/// The answer to "may this principal perform this action?".
pub struct Decision<'r, P, E = (), A = ()> {
	policy: String,
	action: String,
	lazy_guards: Vec<LazyGuard<P, E>>,
	async_lazy_guards: Vec<AsyncLazyGuard<P, E>>,
	principal: &'r P,
	conclusion: Option<bool>,
	allow_default: bool,
	has_policy: bool,
	has_action: bool,
	is_guard_decision: bool,
	restriction: Option<Restriction<P, E, A>>,
	dependencies: Dependencies,
}

impl<'r, P, E, A> Decision<'r, P, E, A> {
	/// A decision already settled by a guard verdict.
	pub(crate) fn guarded(
		policy: impl Into<String>,
		action: impl Into<String>,
		principal: &'r P,
		allowed: bool,
	) -> Self {
		Self {
			conclusion: Some(allowed),
			allow_default: allowed,
			is_guard_decision: true,
			..Self::pending(policy, action, principal)
		}
	}

	/// A decision to be resolved by `can`/`could`.
	pub(crate) fn pending(
		policy: impl Into<String>,
		action: impl Into<String>,
		principal: &'r P,
	) -> Self {
		Self {
			policy: policy.into(),
			action: action.into(),
			lazy_guards: Vec::new(),
			async_lazy_guards: Vec::new(),
			principal,
			conclusion: None,
			allow_default: false,
			has_policy: false,
			has_action: false,
			is_guard_decision: false,
			restriction: None,
			dependencies: Dependencies::new(),
		}
	}

	pub(crate) fn with_policy(mut self, has_policy: bool) -> Self {
		self.has_policy = has_policy;
		self
	}

	pub(crate) fn with_action(mut self, has_action: bool) -> Self {
		self.has_action = has_action;
		self
	}

	/// Attaches the restriction; `has_action` follows its presence.
	pub(crate) fn with_restriction(mut self, restriction: Option<Restriction<P, E, A>>) -> Self {
		self.has_action = restriction.is_some();
		self.restriction = restriction;
		self
	}

	pub(crate) fn with_lazy_guards(
		mut self,
		lazy_guards: Vec<LazyGuard<P, E>>,
		async_lazy_guards: Vec<AsyncLazyGuard<P, E>>,
	) -> Self {
		self.lazy_guards = lazy_guards;
		self.async_lazy_guards = async_lazy_guards;
		self
	}

	pub(crate) fn with_conclusion(mut self, conclusion: bool) -> Self {
		self.conclusion = Some(conclusion);
		self
	}

	pub(crate) fn with_allow_default(mut self, allow_default: bool) -> Self {
		self.allow_default = allow_default;
		self
	}

	pub(crate) fn with_dependencies(mut self, dependencies: Dependencies) -> Self {
		self.dependencies = dependencies;
		self
	}

	pub fn policy(&self) -> &str {
		&self.policy
	}

	pub fn action(&self) -> &str {
		&self.action
	}

	/// The last conclusion reached, or the default outcome if none yet.
	pub fn conclusion(&self) -> bool {
		self.conclusion.unwrap_or_else(|| self.passed_default())
	}

	/// True when default-allow applies because there is nothing more
	/// specific to check: no policy, or no restriction for the action.
	pub fn passed_default(&self) -> bool {
		self.allow_default && (!self.has_policy || !self.has_action)
	}

	pub fn has_policy(&self) -> bool {
		self.has_policy
	}

	pub fn has_action(&self) -> bool {
		self.has_action
	}

	pub fn is_guard_decision(&self) -> bool {
		self.is_guard_decision
	}

	pub fn is_default_allowed(&self) -> bool {
		self.allow_default
	}

	pub fn dependencies(&self) -> &Dependencies {
		&self.dependencies
	}

	/// Enables default-allow on this decision.
	pub fn allow_default(&mut self) -> &mut Self {
		self.allow_default = true;
		self
	}

	/// Disables default-allow on this decision.
	pub fn deny_default(&mut self) -> &mut Self {
		self.allow_default = false;
		self
	}

	/// Resolves the decision synchronously for `entity`.
	pub fn can(&mut self, entity: Option<&E>) -> Result<bool> {
		self.can_with(entity, &[])
	}

	/// Resolves the decision synchronously, passing `args` to the restriction.
	///
	/// Dependencies provided during the call are kept only if it succeeds.
	pub fn can_with(&mut self, entity: Option<&E>, args: &[A]) -> Result<bool> {
		if self.is_guard_decision {
			return Ok(self.conclude(self.conclusion(), Phase::Guard));
		}

		let mut collected = self.dependencies.clone();
		let (allowed, phase) = match self.evaluate_lazy_guards(entity, &mut collected)? {
			Some(allowed) => (allowed, Phase::LazyGuard),
			None => self.apply_restriction(&collected, entity, args)?,
		};

		Ok(self.commit(collected, allowed, phase))
	}

	/// Resolves the decision, additionally awaiting the async lazy guards
	/// before the restriction runs.
	pub async fn could(&mut self, entity: Option<&E>) -> Result<bool>
	where
		P: Sync,
		E: Sync,
	{
		self.could_with(entity, &[]).await
	}

	/// Like [`could`](Self::could), passing `args` to the restriction.
	pub async fn could_with(&mut self, entity: Option<&E>, args: &[A]) -> Result<bool>
	where
		P: Sync,
		E: Sync,
	{
		if self.is_guard_decision {
			return Ok(self.conclude(self.conclusion(), Phase::Guard));
		}

		let mut collected = self.dependencies.clone();
		if let Some(allowed) = self.evaluate_lazy_guards(entity, &mut collected)? {
			return Ok(self.commit(collected, allowed, Phase::LazyGuard));
		}

		let outcome = evaluate_async_guards(
			ChainKind::AsyncLazyGuard,
			&self.async_lazy_guards,
			self.principal,
			entity,
		)
		.await?;
		collected.merge(outcome.dependencies);

		let (allowed, phase) = match outcome.verdict.decision() {
			Some(allowed) => (allowed, Phase::AsyncLazyGuard),
			None => self.apply_restriction(&collected, entity, args)?,
		};

		Ok(self.commit(collected, allowed, phase))
	}

	fn evaluate_lazy_guards(
		&self,
		entity: Option<&E>,
		collected: &mut Dependencies,
	) -> Result<Option<bool>> {
		let outcome =
			evaluate_guards(ChainKind::LazyGuard, &self.lazy_guards, self.principal, entity)?;
		collected.merge(outcome.dependencies);
		Ok(outcome.verdict.decision())
	}

	fn apply_restriction(
		&self,
		dependencies: &Dependencies,
		entity: Option<&E>,
		args: &[A],
	) -> Result<(bool, Phase)> {
		if self.passed_default() {
			return Ok((true, Phase::Default));
		}

		let Some(restriction) = &self.restriction else {
			return Ok((self.allow_default, Phase::Default));
		};

		let ctx = RestrictionContext::new(dependencies);
		let allowed = restriction
			.check(&ctx, self.principal, entity, args)
			.map_err(|source| GateError::Restriction {
				policy: self.policy.clone(),
				action: self.action.clone(),
				source,
			})?;

		Ok((allowed, Phase::Restriction))
	}

	fn commit(&mut self, collected: Dependencies, allowed: bool, phase: Phase) -> bool {
		self.dependencies = collected;
		self.conclude(allowed, phase)
	}

	fn conclude(&mut self, allowed: bool, phase: Phase) -> bool {
		self.conclusion = Some(allowed);
		debug!(
			policy = %self.policy,
			action = %self.action,
			phase = phase.as_str(),
			allowed,
			"access decision concluded"
		);
		allowed
	}
}

impl<P, E, A> std::fmt::Debug for Decision<'_, P, E, A> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Decision")
			.field("policy", &self.policy)
			.field("action", &self.action)
			.field("conclusion", &self.conclusion)
			.field("allow_default", &self.allow_default)
			.field("has_policy", &self.has_policy)
			.field("has_action", &self.has_action)
			.field("is_guard_decision", &self.is_guard_decision)
			.field("lazy_guards", &self.lazy_guards.len())
			.field("async_lazy_guards", &self.async_lazy_guards.len())
			.field("dependencies", &self.dependencies)
			.finish()
	}
}
