// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Guard chain evaluation.
//!
//! A chain is evaluated in registration order. The first guard that returns
//! [`Verdict::Decided`] stops the chain and its verdict becomes the chain's
//! verdict. Dependencies provided by that guard and by every guard before it
//! are kept; guards after it never run. If no guard decides, the chain is
//! [`Verdict::Undecided`].
//!
//! The asynchronous variant awaits one guard at a time. Guards are never run
//! concurrently, so ordering and dependency accumulation match the
//! synchronous path exactly.

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::dependencies::Dependencies;
use crate::error::{GateError, Result};
use crate::guard::{AsyncGuard, AsyncLazyGuard, ChainKind, Guard, GuardResult, LazyGuard};
use crate::verdict::Verdict;

/// Verdict of a guard chain together with the dependencies it provided.
#[derive(Debug, Clone, Default)]
pub struct GuardDecision {
	pub verdict: Verdict,
	pub dependencies: Dependencies,
}

impl GuardDecision {
	pub fn is_decided(&self) -> bool {
		self.verdict.is_decided()
	}
}

/// A synchronous link in a guard chain.
///
/// Entity-free guards ignore the entity, which lets every chain kind share
/// one evaluation loop.
pub trait ChainLink<P, E> {
	fn invoke(&self, principal: &P, entity: Option<&E>, deps: &mut Dependencies) -> GuardResult;
}

/// An asynchronous link in a guard chain.
#[async_trait]
pub trait AsyncChainLink<P: Sync, E: Sync>: Send + Sync {
	async fn invoke(
		&self,
		principal: &P,
		entity: Option<&E>,
		deps: &mut Dependencies,
	) -> GuardResult;
}

impl<P, E> ChainLink<P, E> for Guard<P> {
	fn invoke(&self, principal: &P, _entity: Option<&E>, deps: &mut Dependencies) -> GuardResult {
		self.check(principal, deps)
	}
}

impl<P, E> ChainLink<P, E> for LazyGuard<P, E> {
	fn invoke(&self, principal: &P, entity: Option<&E>, deps: &mut Dependencies) -> GuardResult {
		self.check(principal, entity, deps)
	}
}

#[async_trait]
impl<P: Sync, E: Sync> AsyncChainLink<P, E> for AsyncGuard<P> {
	async fn invoke(
		&self,
		principal: &P,
		_entity: Option<&E>,
		deps: &mut Dependencies,
	) -> GuardResult {
		self.check(principal, deps).await
	}
}

#[async_trait]
impl<P: Sync, E: Sync> AsyncChainLink<P, E> for AsyncLazyGuard<P, E> {
	async fn invoke(
		&self,
		principal: &P,
		entity: Option<&E>,
		deps: &mut Dependencies,
	) -> GuardResult {
		self.check(principal, entity, deps).await
	}
}

/// Evaluates a synchronous chain.
pub fn evaluate_guards<P, E, G>(
	kind: ChainKind,
	guards: &[G],
	principal: &P,
	entity: Option<&E>,
) -> Result<GuardDecision>
where
	G: ChainLink<P, E>,
{
	let mut dependencies = Dependencies::new();

	for (position, guard) in guards.iter().enumerate() {
		let verdict = guard
			.invoke(principal, entity, &mut dependencies)
			.map_err(|source| GateError::Guard {
				kind,
				position,
				source,
			})?;
		trace!(%kind, position, %verdict, "guard evaluated");

		if verdict.is_decided() {
			return Ok(finish(kind, guards.len(), verdict, dependencies));
		}
	}

	Ok(finish(kind, guards.len(), Verdict::Undecided, dependencies))
}

/// Evaluates an asynchronous chain, awaiting each guard before the next.
pub async fn evaluate_async_guards<P, E, G>(
	kind: ChainKind,
	guards: &[G],
	principal: &P,
	entity: Option<&E>,
) -> Result<GuardDecision>
where
	P: Sync,
	E: Sync,
	G: AsyncChainLink<P, E>,
{
	let mut dependencies = Dependencies::new();

	for (position, guard) in guards.iter().enumerate() {
		let verdict = guard
			.invoke(principal, entity, &mut dependencies)
			.await
			.map_err(|source| GateError::Guard {
				kind,
				position,
				source,
			})?;
		trace!(%kind, position, %verdict, "guard evaluated");

		if verdict.is_decided() {
			return Ok(finish(kind, guards.len(), verdict, dependencies));
		}
	}

	Ok(finish(kind, guards.len(), Verdict::Undecided, dependencies))
}

fn finish(
	kind: ChainKind,
	len: usize,
	verdict: Verdict,
	dependencies: Dependencies,
) -> GuardDecision {
	if len > 0 {
		debug!(
			%kind,
			guards = len,
			%verdict,
			provided = dependencies.len(),
			"guard chain evaluated"
		);
	}
	GuardDecision {
		verdict,
		dependencies,
	}
}
