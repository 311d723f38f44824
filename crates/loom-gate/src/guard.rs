// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Guard function types.
//!
//! There are four kinds of guard, differing along two axes:
//!
//! | kind               | sees the entity | async |
//! |--------------------|-----------------|-------|
//! | [`Guard`]          | no              | no    |
//! | [`LazyGuard`]      | yes             | no    |
//! | [`AsyncGuard`]     | no              | yes   |
//! | [`AsyncLazyGuard`] | yes             | yes   |
//!
//! Every guard receives a `&mut Dependencies` provider and answers with a
//! [`Verdict`]. Guards are cheap to clone; the closure is shared.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::dependencies::Dependencies;
use crate::error::BoxError;
use crate::verdict::Verdict;

/// What a host guard returns.
pub type GuardResult = std::result::Result<Verdict, BoxError>;

type GuardFn<P> = dyn Fn(&P, &mut Dependencies) -> GuardResult + Send + Sync;
type LazyGuardFn<P, E> = dyn Fn(&P, Option<&E>, &mut Dependencies) -> GuardResult + Send + Sync;
type AsyncGuardFn<P> =
	dyn for<'a> Fn(&'a P, &'a mut Dependencies) -> BoxFuture<'a, GuardResult> + Send + Sync;
type AsyncLazyGuardFn<P, E> = dyn for<'a> Fn(
		&'a P,
		Option<&'a E>,
		&'a mut Dependencies,
	) -> BoxFuture<'a, GuardResult>
	+ Send
	+ Sync;

/// The chain a guard was registered on. Used in errors and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainKind {
	Guard,
	LazyGuard,
	AsyncGuard,
	AsyncLazyGuard,
}

impl ChainKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ChainKind::Guard => "guard",
			ChainKind::LazyGuard => "lazy guard",
			ChainKind::AsyncGuard => "async guard",
			ChainKind::AsyncLazyGuard => "async lazy guard",
		}
	}
}

impl fmt::Display for ChainKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Entity-independent synchronous guard.
pub struct Guard<P> {
	check: Arc<GuardFn<P>>,
}

impl<P> Guard<P> {
	pub fn new<F>(check: F) -> Self
	where
		F: Fn(&P, &mut Dependencies) -> GuardResult + Send + Sync + 'static,
	{
		Self {
			check: Arc::new(check),
		}
	}

	pub fn check(&self, principal: &P, deps: &mut Dependencies) -> GuardResult {
		(self.check)(principal, deps)
	}
}

/// Synchronous guard evaluated with the candidate entity.
pub struct LazyGuard<P, E> {
	check: Arc<LazyGuardFn<P, E>>,
}

impl<P, E> LazyGuard<P, E> {
	pub fn new<F>(check: F) -> Self
	where
		F: Fn(&P, Option<&E>, &mut Dependencies) -> GuardResult + Send + Sync + 'static,
	{
		Self {
			check: Arc::new(check),
		}
	}

	pub fn check(&self, principal: &P, entity: Option<&E>, deps: &mut Dependencies) -> GuardResult {
		(self.check)(principal, entity, deps)
	}
}

/// Entity-independent asynchronous guard, for rules that need I/O.
pub struct AsyncGuard<P> {
	check: Arc<AsyncGuardFn<P>>,
}

impl<P> AsyncGuard<P> {
	pub fn new<F>(check: F) -> Self
	where
		F: for<'a> Fn(&'a P, &'a mut Dependencies) -> BoxFuture<'a, GuardResult>
			+ Send
			+ Sync
			+ 'static,
	{
		Self {
			check: Arc::new(check),
		}
	}

	pub fn check<'a>(
		&self,
		principal: &'a P,
		deps: &'a mut Dependencies,
	) -> BoxFuture<'a, GuardResult> {
		(self.check)(principal, deps)
	}
}

/// Asynchronous guard evaluated with the candidate entity.
pub struct AsyncLazyGuard<P, E> {
	check: Arc<AsyncLazyGuardFn<P, E>>,
}

impl<P, E> AsyncLazyGuard<P, E> {
	pub fn new<F>(check: F) -> Self
	where
		F: for<'a> Fn(&'a P, Option<&'a E>, &'a mut Dependencies) -> BoxFuture<'a, GuardResult>
			+ Send
			+ Sync
			+ 'static,
	{
		Self {
			check: Arc::new(check),
		}
	}

	pub fn check<'a>(
		&self,
		principal: &'a P,
		entity: Option<&'a E>,
		deps: &'a mut Dependencies,
	) -> BoxFuture<'a, GuardResult> {
		(self.check)(principal, entity, deps)
	}
}

// Manual impls: deriving would require `P: Clone` / `P: Debug`.

impl<P> Clone for Guard<P> {
	fn clone(&self) -> Self {
		Self {
			check: Arc::clone(&self.check),
		}
	}
}

impl<P, E> Clone for LazyGuard<P, E> {
	fn clone(&self) -> Self {
		Self {
			check: Arc::clone(&self.check),
		}
	}
}

impl<P> Clone for AsyncGuard<P> {
	fn clone(&self) -> Self {
		Self {
			check: Arc::clone(&self.check),
		}
	}
}

impl<P, E> Clone for AsyncLazyGuard<P, E> {
	fn clone(&self) -> Self {
		Self {
			check: Arc::clone(&self.check),
		}
	}
}

impl<P> fmt::Debug for Guard<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Guard")
	}
}

impl<P, E> fmt::Debug for LazyGuard<P, E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("LazyGuard")
	}
}

impl<P> fmt::Debug for AsyncGuard<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("AsyncGuard")
	}
}

impl<P, E> fmt::Debug for AsyncLazyGuard<P, E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("AsyncLazyGuard")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn guard_forwards_principal_and_provider() {
		let guard = Guard::new(|n: &i32, deps: &mut Dependencies| {
			deps.provide("seen", *n);
			Ok(Verdict::from(*n > 0))
		});

		let mut deps = Dependencies::new();
		assert_eq!(guard.check(&5, &mut deps).unwrap(), Verdict::allow());
		assert_eq!(deps.get::<i32>("seen"), Some(&5));
	}

	#[test]
	fn lazy_guard_sees_missing_entity() {
		let guard = LazyGuard::new(|_: &i32, entity: Option<&String>, _: &mut Dependencies| {
			Ok(entity.map(|e| !e.is_empty()).into())
		});

		let mut deps = Dependencies::new();
		assert_eq!(guard.check(&1, None, &mut deps).unwrap(), Verdict::Undecided);
		assert_eq!(
			guard.check(&1, Some(&"x".to_string()), &mut deps).unwrap(),
			Verdict::allow()
		);
	}

	#[tokio::test]
	async fn async_guard_resolves() {
		let guard = AsyncGuard::new(|n: &i32, deps: &mut Dependencies| {
			Box::pin(async move {
				deps.provide("double", *n * 2);
				Ok(Verdict::Undecided)
			})
		});

		let mut deps = Dependencies::new();
		assert_eq!(guard.check(&4, &mut deps).await.unwrap(), Verdict::Undecided);
		assert_eq!(deps.get::<i32>("double"), Some(&8));
	}

	#[tokio::test]
	async fn async_lazy_guard_clone_shares_closure() {
		let guard = AsyncLazyGuard::new(|p: &i32, e: Option<&i32>, _: &mut Dependencies| {
			Box::pin(async move { Ok(Verdict::from(e == Some(p))) })
		});
		let cloned = guard.clone();

		let mut deps = Dependencies::new();
		assert_eq!(cloned.check(&1, Some(&1), &mut deps).await.unwrap(), Verdict::allow());
		assert_eq!(guard.check(&1, Some(&2), &mut deps).await.unwrap(), Verdict::deny());
	}

	#[test]
	fn chain_kind_display() {
		assert_eq!(ChainKind::AsyncLazyGuard.to_string(), "async lazy guard");
		assert_eq!(format!("{:?}", Guard::<i32>::new(|_, _| Ok(Verdict::Undecided))), "Guard");
	}
}
