// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Named policies.
//!
//! A policy groups the restrictions for one kind of entity (`"post"`,
//! `"user"`, ...) under action names, plus guards that apply to every action
//! of that policy. A policy does not know which gate holds it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dependencies::RestrictionContext;
use crate::error::{BoxError, Result};
use crate::evaluator::GuardDecision;
use crate::registry::{GuardContainer, GuardRegistry};

type RestrictionFn<P, E, A> = dyn Fn(
		&RestrictionContext<'_>,
		&P,
		Option<&E>,
		&[A],
	) -> std::result::Result<bool, BoxError>
	+ Send
	+ Sync;

/// The final-say predicate for one action of a policy.
///
/// It runs only when every guard is undecided and no default applies. The
/// [`RestrictionContext`] exposes dependencies provided by guards.
pub struct Restriction<P, E, A> {
	check: Arc<RestrictionFn<P, E, A>>,
}

impl<P, E, A> Restriction<P, E, A> {
	pub fn new<F>(check: F) -> Self
	where
		F: Fn(&RestrictionContext<'_>, &P, Option<&E>, &[A]) -> std::result::Result<bool, BoxError>
			+ Send
			+ Sync
			+ 'static,
	{
		Self {
			check: Arc::new(check),
		}
	}

	pub fn check(
		&self,
		ctx: &RestrictionContext<'_>,
		principal: &P,
		entity: Option<&E>,
		args: &[A],
	) -> std::result::Result<bool, BoxError> {
		(self.check)(ctx, principal, entity, args)
	}
}

impl<P, E, A> Clone for Restriction<P, E, A> {
	fn clone(&self) -> Self {
		Self {
			check: Arc::clone(&self.check),
		}
	}
}

impl<P, E, A> fmt::Debug for Restriction<P, E, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Restriction")
	}
}

/// A named set of action restrictions with its own guard chains.
pub struct Policy<P, E = (), A = ()> {
	name: String,
	actions: HashMap<String, Restriction<P, E, A>>,
	registry: GuardRegistry<P, E>,
}

impl<P, E, A> Policy<P, E, A> {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			actions: HashMap::new(),
			registry: GuardRegistry::new(),
		}
	}

	/// Builds a policy from `(action, restriction)` pairs.
	pub fn with_actions<I, K>(name: impl Into<String>, actions: I) -> Self
	where
		I: IntoIterator<Item = (K, Restriction<P, E, A>)>,
		K: Into<String>,
	{
		let mut policy = Self::new(name);
		for (action, restriction) in actions {
			policy.actions.insert(action.into(), restriction);
		}
		policy
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Defines the restriction for `action`, replacing any earlier one.
	pub fn define<F>(&mut self, action: impl Into<String>, restriction: F) -> &mut Self
	where
		F: Fn(&RestrictionContext<'_>, &P, Option<&E>, &[A]) -> std::result::Result<bool, BoxError>
			+ Send
			+ Sync
			+ 'static,
	{
		self.actions.insert(action.into(), Restriction::new(restriction));
		self
	}

	pub fn actions(&self) -> &HashMap<String, Restriction<P, E, A>> {
		&self.actions
	}

	pub fn action(&self, action: &str) -> Option<&Restriction<P, E, A>> {
		self.actions.get(action)
	}

	pub fn has_action(&self, action: &str) -> bool {
		self.actions.contains_key(action)
	}

	/// Runs this policy's entity-free synchronous guards.
	pub fn get_guard_decision(&self, principal: &P) -> Result<GuardDecision> {
		self.registry.evaluate_guards(principal)
	}

	/// Runs this policy's entity-free asynchronous guards.
	pub async fn get_async_guard_decision(&self, principal: &P) -> Result<GuardDecision>
	where
		P: Sync,
		E: Sync,
	{
		self.registry.evaluate_async_guards(principal).await
	}
}

impl<P, E, A> GuardContainer<P, E> for Policy<P, E, A> {
	fn registry(&self) -> &GuardRegistry<P, E> {
		&self.registry
	}

	fn registry_mut(&mut self) -> &mut GuardRegistry<P, E> {
		&mut self.registry
	}
}

impl<P, E, A> fmt::Debug for Policy<P, E, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut actions: Vec<&str> = self.actions.keys().map(String::as_str).collect();
		actions.sort_unstable();
		f.debug_struct("Policy")
			.field("name", &self.name)
			.field("actions", &actions)
			.field("registry", &self.registry)
			.finish()
	}
}
