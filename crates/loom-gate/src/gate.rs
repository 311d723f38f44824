// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The top-level authorization gate.
//!
//! A [`Gate`] holds named policies and the global guard chains. Binding a
//! principal with [`Gate::build`] or [`Gate::build_async`] evaluates the
//! global entity-free guards once and returns a [`Representative`] that
//! answers per-action access requests.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, instrument};

use crate::config::GateConfig;
use crate::error::Result;
use crate::policy::Policy;
use crate::registry::{GuardContainer, GuardRegistry};
use crate::representative::Representative;

/// Policies plus global guards.
///
/// `P` is the principal type, `E` the entity type and `A` the type of
/// extra arguments passed to restrictions.
pub struct Gate<P, E = (), A = ()> {
	policies: HashMap<String, Policy<P, E, A>>,
	registry: GuardRegistry<P, E>,
	config: GateConfig,
}

impl<P, E, A> Gate<P, E, A> {
	pub fn new() -> Self {
		Self::with_config(GateConfig::default())
	}

	pub fn with_config(config: GateConfig) -> Self {
		Self {
			policies: HashMap::new(),
			registry: GuardRegistry::new(),
			config,
		}
	}

	pub fn config(&self) -> &GateConfig {
		&self.config
	}

	/// Adds `policy` under its name, replacing any policy with the same name.
	pub fn add_policy(&mut self, policy: Policy<P, E, A>) -> &mut Self {
		let name = policy.name().to_string();
		if self.policies.insert(name.clone(), policy).is_some() {
			debug!(policy = %name, "replaced existing policy");
		}
		self
	}

	pub fn policies(&self) -> &HashMap<String, Policy<P, E, A>> {
		&self.policies
	}

	pub fn policy(&self, name: &str) -> Option<&Policy<P, E, A>> {
		self.policies.get(name)
	}

	pub fn policy_mut(&mut self, name: &str) -> Option<&mut Policy<P, E, A>> {
		self.policies.get_mut(name)
	}

	/// Binds `principal`, evaluating the global synchronous guards once.
	///
	/// The representative is returned whether or not the guards decided.
	#[instrument(level = "debug", skip_all)]
	pub fn build(&self, principal: P) -> Result<Representative<'_, P, E, A>> {
		let outcome = self.registry.evaluate_guards(&principal)?;
		debug!(verdict = %outcome.verdict, "built representative");

		Ok(Representative::new(
			self,
			principal,
			outcome.verdict,
			outcome.dependencies,
		))
	}

	/// Binds `principal`, evaluating the global synchronous guards and, only if
	/// they are undecided, the global asynchronous guards.
	///
	/// Dependencies from the asynchronous guards are layered over those from
	/// the synchronous ones.
	#[instrument(level = "debug", skip_all)]
	pub async fn build_async(&self, principal: P) -> Result<Representative<'_, P, E, A>>
	where
		P: Sync,
		E: Sync,
	{
		let mut outcome = self.registry.evaluate_guards(&principal)?;

		if !outcome.is_decided() {
			let async_outcome = self.registry.evaluate_async_guards(&principal).await?;
			outcome.verdict = async_outcome.verdict;
			outcome.dependencies.merge(async_outcome.dependencies);
		}
		debug!(verdict = %outcome.verdict, "built representative");

		Ok(Representative::new(
			self,
			principal,
			outcome.verdict,
			outcome.dependencies,
		))
	}
}

impl<P, E, A> GuardContainer<P, E> for Gate<P, E, A> {
	fn registry(&self) -> &GuardRegistry<P, E> {
		&self.registry
	}

	fn registry_mut(&mut self) -> &mut GuardRegistry<P, E> {
		&mut self.registry
	}
}

impl<P, E, A> Default for Gate<P, E, A> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P, E, A> fmt::Debug for Gate<P, E, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut policies: Vec<&str> = self.policies.keys().map(String::as_str).collect();
		policies.sort_unstable();
		f.debug_struct("Gate")
			.field("policies", &policies)
			.field("registry", &self.registry)
			.field("config", &self.config)
			.finish()
	}
}
