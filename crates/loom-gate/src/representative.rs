// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A principal bound to a gate.

use std::fmt;

use tracing::{debug, instrument};

use crate::decision::Decision;
use crate::dependencies::Dependencies;
use crate::error::Result;
use crate::evaluator::GuardDecision;
use crate::gate::Gate;
use crate::policy::Policy;
use crate::registry::GuardContainer;
use crate::verdict::Verdict;

/// The acting principal for one authorization context.
///
/// Holds the global guard verdict and dependencies computed when the
/// representative was built. Global guards are not re-run per access: a
/// decided global verdict is authoritative for every policy, and policy guards
/// are consulted only when it is undecided.
pub struct Representative<'g, P, E = (), A = ()> {
	gate: &'g Gate<P, E, A>,
	principal: P,
	guard_decision: Verdict,
	dependencies: Dependencies,
}

impl<'g, P, E, A> Representative<'g, P, E, A> {
	pub(crate) fn new(
		gate: &'g Gate<P, E, A>,
		principal: P,
		guard_decision: Verdict,
		dependencies: Dependencies,
	) -> Self {
		Self {
			gate,
			principal,
			guard_decision,
			dependencies,
		}
	}

	pub fn principal(&self) -> &P {
		&self.principal
	}

	/// The verdict of the global guards evaluated at build time.
	pub fn guard_decision(&self) -> Verdict {
		self.guard_decision
	}

	pub fn has_guard_decision(&self) -> bool {
		self.guard_decision.is_decided()
	}

	/// Dependencies provided by the global guards at build time.
	pub fn dependencies(&self) -> &Dependencies {
		&self.dependencies
	}

	/// Requests `action` on `policy`, consulting synchronous guards only.
	///
	/// An unknown policy or action is not an error: the returned decision
	/// resolves through the default rules.
	#[instrument(level = "debug", skip(self))]
	pub fn access(&self, policy: &str, action: &str) -> Result<Decision<'_, P, E, A>> {
		let found = self.gate.policy(policy);
		let outcome = self.policy_guard_decision(found)?;

		Ok(self.construct_decision(found, policy, action, outcome))
	}

	/// Requests `action` on `policy`, also awaiting the policy's asynchronous
	/// guards when its synchronous guards are undecided.
	#[instrument(level = "debug", skip(self))]
	pub async fn async_access(&self, policy: &str, action: &str) -> Result<Decision<'_, P, E, A>>
	where
		P: Sync,
		E: Sync,
	{
		let found = self.gate.policy(policy);
		let mut outcome = self.policy_guard_decision(found)?;

		if let Some(found) = found {
			if !outcome.is_decided() {
				let async_outcome = found.get_async_guard_decision(&self.principal).await?;
				outcome.verdict = async_outcome.verdict;
				outcome.dependencies.merge(async_outcome.dependencies);
			}
		}

		Ok(self.construct_decision(found, policy, action, outcome))
	}

	/// Global verdict if decided, else the policy's synchronous guard verdict.
	fn policy_guard_decision(&self, policy: Option<&Policy<P, E, A>>) -> Result<GuardDecision> {
		if self.has_guard_decision() {
			return Ok(GuardDecision {
				verdict: self.guard_decision,
				dependencies: Dependencies::new(),
			});
		}

		match policy {
			Some(policy) => policy.get_guard_decision(&self.principal),
			None => Ok(GuardDecision::default()),
		}
	}

	fn construct_decision(
		&self,
		policy: Option<&'g Policy<P, E, A>>,
		policy_name: &str,
		action: &str,
		outcome: GuardDecision,
	) -> Decision<'_, P, E, A> {
		let dependencies = self.dependencies.merged(outcome.dependencies);

		if let Some(allowed) = outcome.verdict.decision() {
			debug!(allowed, has_policy = policy.is_some(), "decided by guard");
			return Decision::guarded(policy_name, action, &self.principal, allowed)
				.with_policy(policy.is_some())
				.with_action(policy.is_some_and(|p| p.has_action(action)))
				.with_dependencies(dependencies);
		}

		let gate = self.gate;
		let mut lazy_guards = gate.lazy_guards().to_vec();
		let mut async_lazy_guards = gate.async_lazy_guards().to_vec();
		if let Some(policy) = policy {
			lazy_guards.extend_from_slice(policy.lazy_guards());
			async_lazy_guards.extend_from_slice(policy.async_lazy_guards());
		}

		Decision::pending(policy_name, action, &self.principal)
			.with_conclusion(false)
			.with_allow_default(gate.config().allow_default)
			.with_policy(policy.is_some())
			.with_restriction(policy.and_then(|p| p.action(action)).cloned())
			.with_lazy_guards(lazy_guards, async_lazy_guards)
			.with_dependencies(dependencies)
	}
}

impl<P: fmt::Debug, E, A> fmt::Debug for Representative<'_, P, E, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Representative")
			.field("principal", &self.principal)
			.field("guard_decision", &self.guard_decision)
			.field("dependencies", &self.dependencies)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::GateConfig;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	type TestGate = Gate<u32, u32>;

	fn gate_with_policies() -> TestGate {
		let mut gate = TestGate::new();
		gate.add_policy(Policy::new("user")).add_policy(Policy::new("post"));
		gate
	}

	#[test]
	fn global_guard_decision_is_authoritative() {
		let gate = gate_with_policies();
		let representative = Representative::new(&gate, 1, Verdict::allow(), Dependencies::new());

		let decision = representative.access("user", "view").unwrap();
		assert!(decision.conclusion());
		assert!(decision.is_guard_decision());
		assert!(decision.has_policy());
		assert!(!decision.has_action());
	}

	#[test]
	fn global_verdict_preempts_policy_guards() {
		let mut gate = gate_with_policies();
		gate.policy_mut("user").unwrap().guard(|_, _| Ok(Verdict::allow()));
		let representative = Representative::new(&gate, 1, Verdict::deny(), Dependencies::new());

		let mut decision = representative.access("user", "view").unwrap();
		assert!(!decision.can(None).unwrap());
	}

	#[test]
	fn missing_policy_is_denied() {
		let gate = gate_with_policies();
		let representative = Representative::new(&gate, 1, Verdict::Undecided, Dependencies::new());

		let mut decision = representative.access("nonexistent", "view").unwrap();
		assert!(!decision.conclusion());
		assert!(!decision.has_policy());
		assert!(!decision.is_guard_decision());
		assert!(!decision.can(None).unwrap());
	}

	#[test]
	fn policy_guard_decides_when_global_is_undecided() {
		let mut gate = gate_with_policies();
		gate.policy_mut("user").unwrap().guard(|_, _| Ok(Verdict::deny()));
		let representative = Representative::new(&gate, 1, Verdict::Undecided, Dependencies::new());

		let decision = representative.access("user", "update").unwrap();
		assert!(!decision.conclusion());
		assert!(decision.is_guard_decision());
	}

	#[tokio::test]
	async fn async_access_consults_policy_async_guards() {
		let mut gate = gate_with_policies();
		gate.policy_mut("post")
			.unwrap()
			.async_guard(|_, _| Box::pin(async { Ok(Verdict::allow()) }));
		let representative = Representative::new(&gate, 1, Verdict::Undecided, Dependencies::new());

		let decision = representative.async_access("post", "create").await.unwrap();
		assert!(decision.conclusion());
		assert!(decision.is_guard_decision());

		let sync_decision = representative.access("post", "create").unwrap();
		assert!(!sync_decision.is_guard_decision());
	}

	#[tokio::test]
	async fn async_access_skips_async_guards_when_sync_policy_guard_decides() {
		let mut gate = gate_with_policies();
		gate.policy_mut("post")
			.unwrap()
			.guard(|_, _| Ok(Verdict::deny()))
			.async_guard(|_, _| Box::pin(async { Err("must not run".into()) }));
		let representative = Representative::new(&gate, 1, Verdict::Undecided, Dependencies::new());

		let decision = representative.async_access("post", "create").await.unwrap();
		assert!(!decision.conclusion());
	}

	#[tokio::test]
	async fn global_verdict_preempts_policy_guards_on_async_access() {
		let calls = Arc::new(AtomicUsize::new(0));
		let sync_calls = calls.clone();
		let async_calls = calls.clone();

		let mut gate = gate_with_policies();
		gate.guard(|_, _| Ok(Verdict::deny()));
		gate.policy_mut("post")
			.unwrap()
			.guard(move |_, _| {
				sync_calls.fetch_add(1, Ordering::SeqCst);
				Ok(Verdict::allow())
			})
			.async_guard(move |_, _| {
				async_calls.fetch_add(1, Ordering::SeqCst);
				Box::pin(async { Ok(Verdict::allow()) })
			});
		let representative = gate.build_async(1).await.unwrap();

		let mut decision = representative.async_access("post", "edit").await.unwrap();
		assert!(decision.is_guard_decision());
		assert!(!decision.conclusion());
		assert!(!decision.could(None).await.unwrap());
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn async_access_on_missing_policy_resolves_by_default() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counted = calls.clone();

		let mut gate = gate_with_policies();
		gate.policy_mut("post").unwrap().async_guard(move |_, _| {
			counted.fetch_add(1, Ordering::SeqCst);
			Box::pin(async { Ok(Verdict::allow()) })
		});
		let representative = gate.build_async(1).await.unwrap();

		let mut decision = representative.async_access("comment", "view").await.unwrap();
		assert!(!decision.has_policy());
		assert!(!decision.is_guard_decision());
		assert!(!decision.could(None).await.unwrap());
		assert!(decision.allow_default().could(None).await.unwrap());
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn policy_dependencies_are_carried_into_decisions() {
		let mut gate = gate_with_policies();
		gate.policy_mut("user")
			.unwrap()
			.guard(|_, deps| {
				deps.provide("key", "value");
				Ok(Verdict::Undecided)
			})
			.async_guard(|_, deps| {
				Box::pin(async move {
					deps.provide("asyncKey", "asyncValue");
					Ok(Verdict::Undecided)
				})
			});
		let mut base = Dependencies::new();
		base.provide("global", 1_u8);
		let representative = Representative::new(&gate, 1, Verdict::Undecided, base);

		let sync_decision = representative.access("user", "view").unwrap();
		assert!(!sync_decision.conclusion());
		assert_eq!(sync_decision.dependencies().keys(), vec!["global", "key"]);

		let async_decision = representative.async_access("user", "view").await.unwrap();
		assert!(!async_decision.conclusion());
		assert_eq!(async_decision.dependencies().keys(), vec!["asyncKey", "global", "key"]);
	}

	#[test]
	fn global_lazy_guards_run_before_policy_lazy_guards() {
		let mut gate = gate_with_policies();
		gate.lazy_guard(|_, _, _| Ok(Verdict::deny()));
		gate.policy_mut("post").unwrap().lazy_guard(|_, _, _| Ok(Verdict::allow()));
		let representative = Representative::new(&gate, 1, Verdict::Undecided, Dependencies::new());

		let mut decision = representative.access("post", "edit").unwrap();
		assert!(!decision.can(None).unwrap());
	}

	#[tokio::test]
	async fn lazy_and_async_lazy_guards_are_combined() {
		let mut gate = gate_with_policies();
		gate.lazy_guard(|_, _, _| Ok(Verdict::Undecided))
			.async_lazy_guard(|_, _, _| Box::pin(async { Ok(Verdict::allow()) }));
		gate.policy_mut("user")
			.unwrap()
			.lazy_guard(|_, _, _| Ok(Verdict::deny()))
			.async_lazy_guard(|_, _, _| Box::pin(async { Ok(Verdict::deny()) }));
		let representative = Representative::new(&gate, 1, Verdict::Undecided, Dependencies::new());

		let mut sync_decision = representative.access("user", "delete").unwrap();
		assert!(!sync_decision.can(None).unwrap());

		let mut async_decision = representative.async_access("user", "delete").await.unwrap();
		assert!(!async_decision.could(None).await.unwrap());
	}

	#[test]
	fn undefined_guards_default_to_deny() {
		let gate = gate_with_policies();
		let representative = Representative::new(&gate, 1, Verdict::Undecided, Dependencies::new());

		let mut decision = representative.access("user", "update").unwrap();
		assert!(!decision.conclusion());
		assert!(!decision.can(None).unwrap());
	}

	#[tokio::test]
	async fn global_and_policy_lazy_dependencies_are_combined() {
		let mut gate = gate_with_policies();
		gate.lazy_guard(|_, _, deps| {
			deps.provide("globalKey", "globalValue");
			Ok(Verdict::Undecided)
		});
		gate.policy_mut("user").unwrap().lazy_guard(|_, _, deps| {
			deps.provide("policyKey", "policyValue");
			Ok(Verdict::allow())
		});
		let representative = Representative::new(&gate, 1, Verdict::Undecided, Dependencies::new());

		let mut decision = representative.async_access("user", "view").await.unwrap();
		assert!(decision.can(None).unwrap());
		assert_eq!(decision.dependencies().keys(), vec!["globalKey", "policyKey"]);
	}

	#[test]
	fn restriction_is_resolved_from_policy_action() {
		let mut gate = gate_with_policies();
		gate.policy_mut("post")
			.unwrap()
			.define("update", |_, user, post, _| Ok(post == Some(user)));
		let representative = Representative::new(&gate, 4, Verdict::Undecided, Dependencies::new());

		let mut decision = representative.access("post", "update").unwrap();
		assert!(decision.has_action());
		assert!(decision.can(Some(&4)).unwrap());
		assert!(!decision.can(Some(&5)).unwrap());
	}

	#[test]
	fn gate_config_sets_initial_default() {
		let mut gate: TestGate = Gate::with_config(GateConfig::allow_by_default());
		gate.add_policy(Policy::new("post"));
		let representative = gate.build(1).unwrap();

		let mut missing = representative.access("comment", "view").unwrap();
		assert!(missing.passed_default());
		assert!(missing.can(None).unwrap());

		let mut denied = representative.access("post", "view").unwrap();
		denied.deny_default();
		assert!(!denied.can(None).unwrap());
	}

	#[test]
	fn representatives_do_not_share_decisions() {
		let gate = gate_with_policies();
		let representative = gate.build(1).unwrap();

		let mut first = representative.access("post", "view").unwrap();
		let mut second = representative.access("post", "view").unwrap();
		first.allow_default();

		assert!(first.can(None).unwrap());
		assert!(!second.can(None).unwrap());
	}
}
