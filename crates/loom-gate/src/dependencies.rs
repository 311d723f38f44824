// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dependency injection between guards and restrictions.
//!
//! Guards receive a `&mut Dependencies` and may [`provide`](Dependencies::provide)
//! values under string keys. The values accumulated during one resolution are
//! handed to the restriction through [`RestrictionContext::inject`], so an
//! expensive lookup done by a guard is not repeated by the restriction.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Value = Arc<dyn Any + Send + Sync>;

/// Key-value accumulator scoped to one representative or decision.
///
/// Later writes under the same key replace earlier ones. Keys are never
/// removed while a decision is being resolved.
#[derive(Clone, Default)]
pub struct Dependencies {
	values: HashMap<String, Value>,
}

impl Dependencies {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `value` under `key`, replacing any previous value.
	pub fn provide<T>(&mut self, key: impl Into<String>, value: T)
	where
		T: Any + Send + Sync,
	{
		self.values.insert(key.into(), Arc::new(value));
	}

	/// Returns the value under `key` if it exists and has type `T`.
	pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
		self.values.get(key).and_then(|value| value.downcast_ref::<T>())
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Returns the keys in sorted order.
	pub fn keys(&self) -> Vec<&str> {
		let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
		keys.sort_unstable();
		keys
	}

	/// Layers `other` on top of `self`; keys present in both take `other`'s value.
	pub fn merge(&mut self, other: Dependencies) {
		self.values.extend(other.values);
	}

	/// Returns a copy of `self` with `other` layered on top.
	pub(crate) fn merged(&self, other: Dependencies) -> Dependencies {
		let mut merged = self.clone();
		merged.merge(other);
		merged
	}
}

impl fmt::Debug for Dependencies {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Dependencies")
			.field("keys", &self.keys())
			.finish()
	}
}

/// Read-only view over a decision's dependencies, passed to restrictions.
#[derive(Clone, Copy)]
pub struct RestrictionContext<'d> {
	dependencies: &'d Dependencies,
}

impl<'d> RestrictionContext<'d> {
	pub(crate) fn new(dependencies: &'d Dependencies) -> Self {
		Self { dependencies }
	}

	/// Returns the dependency provided under `name`, if any guard provided
	/// one with type `T`.
	pub fn inject<T: Any>(&self, name: &str) -> Option<&'d T> {
		self.dependencies.get(name)
	}

	pub fn dependencies(&self) -> &'d Dependencies {
		self.dependencies
	}
}

impl fmt::Debug for RestrictionContext<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RestrictionContext")
			.field("dependencies", self.dependencies)
			.finish()
	}
}
