// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Guard containers.
//!
//! Both [`Gate`](crate::Gate) and [`Policy`](crate::Policy) own a
//! [`GuardRegistry`] with four append-only chains. Registration goes through
//! the [`GuardContainer`] trait so the two share one API.

use futures::future::BoxFuture;

use crate::dependencies::Dependencies;
use crate::error::Result;
use crate::evaluator::{self, GuardDecision};
use crate::guard::{AsyncGuard, AsyncLazyGuard, ChainKind, Guard, GuardResult, LazyGuard};

/// The four guard chains of a gate or policy, in registration order.
pub struct GuardRegistry<P, E> {
	guards: Vec<Guard<P>>,
	lazy_guards: Vec<LazyGuard<P, E>>,
	async_guards: Vec<AsyncGuard<P>>,
	async_lazy_guards: Vec<AsyncLazyGuard<P, E>>,
}

impl<P, E> GuardRegistry<P, E> {
	pub fn new() -> Self {
		Self {
			guards: Vec::new(),
			lazy_guards: Vec::new(),
			async_guards: Vec::new(),
			async_lazy_guards: Vec::new(),
		}
	}

	pub fn push_guard(&mut self, guard: Guard<P>) {
		self.guards.push(guard);
	}

	pub fn push_lazy_guard(&mut self, guard: LazyGuard<P, E>) {
		self.lazy_guards.push(guard);
	}

	pub fn push_async_guard(&mut self, guard: AsyncGuard<P>) {
		self.async_guards.push(guard);
	}

	pub fn push_async_lazy_guard(&mut self, guard: AsyncLazyGuard<P, E>) {
		self.async_lazy_guards.push(guard);
	}

	pub fn guards(&self) -> &[Guard<P>] {
		&self.guards
	}

	pub fn lazy_guards(&self) -> &[LazyGuard<P, E>] {
		&self.lazy_guards
	}

	pub fn async_guards(&self) -> &[AsyncGuard<P>] {
		&self.async_guards
	}

	pub fn async_lazy_guards(&self) -> &[AsyncLazyGuard<P, E>] {
		&self.async_lazy_guards
	}

	/// Runs the entity-free synchronous chain.
	pub(crate) fn evaluate_guards(&self, principal: &P) -> Result<GuardDecision> {
		evaluator::evaluate_guards::<P, E, _>(ChainKind::Guard, &self.guards, principal, None)
	}

	/// Runs the entity-free asynchronous chain.
	pub(crate) async fn evaluate_async_guards(&self, principal: &P) -> Result<GuardDecision>
	where
		P: Sync,
		E: Sync,
	{
		evaluator::evaluate_async_guards::<P, E, _>(
			ChainKind::AsyncGuard,
			&self.async_guards,
			principal,
			None,
		)
		.await
	}
}

impl<P, E> Default for GuardRegistry<P, E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P, E> std::fmt::Debug for GuardRegistry<P, E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GuardRegistry")
			.field("guards", &self.guards.len())
			.field("lazy_guards", &self.lazy_guards.len())
			.field("async_guards", &self.async_guards.len())
			.field("async_lazy_guards", &self.async_lazy_guards.len())
			.finish()
	}
}

/// Anything that owns a [`GuardRegistry`].
///
/// Registration is append-only and evaluation order is registration order.
pub trait GuardContainer<P, E> {
	fn registry(&self) -> &GuardRegistry<P, E>;

	fn registry_mut(&mut self) -> &mut GuardRegistry<P, E>;

	/// Registers an entity-free guard, evaluated once per representative (on
	/// a gate) or once per access (on a policy).
	fn guard<F>(&mut self, check: F) -> &mut Self
	where
		F: Fn(&P, &mut Dependencies) -> GuardResult + Send + Sync + 'static,
		Self: Sized,
	{
		self.registry_mut().push_guard(Guard::new(check));
		self
	}

	/// Registers a guard evaluated with the entity when the decision resolves.
	fn lazy_guard<F>(&mut self, check: F) -> &mut Self
	where
		F: Fn(&P, Option<&E>, &mut Dependencies) -> GuardResult + Send + Sync + 'static,
		Self: Sized,
	{
		self.registry_mut().push_lazy_guard(LazyGuard::new(check));
		self
	}

	fn async_guard<F>(&mut self, check: F) -> &mut Self
	where
		F: for<'a> Fn(&'a P, &'a mut Dependencies) -> BoxFuture<'a, GuardResult>
			+ Send
			+ Sync
			+ 'static,
		Self: Sized,
	{
		self.registry_mut().push_async_guard(AsyncGuard::new(check));
		self
	}

	fn async_lazy_guard<F>(&mut self, check: F) -> &mut Self
	where
		F: for<'a> Fn(&'a P, Option<&'a E>, &'a mut Dependencies) -> BoxFuture<'a, GuardResult>
			+ Send
			+ Sync
			+ 'static,
		Self: Sized,
	{
		self.registry_mut().push_async_lazy_guard(AsyncLazyGuard::new(check));
		self
	}

	fn lazy_guards(&self) -> &[LazyGuard<P, E>] {
		self.registry().lazy_guards()
	}

	fn async_lazy_guards(&self) -> &[AsyncLazyGuard<P, E>] {
		self.registry().async_lazy_guards()
	}
}
