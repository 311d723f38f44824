// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Per-action authorization decisions built from guard chains and policies.
//!
//! A [`Gate`] holds named [`Policy`] values and global guards. Binding a
//! principal yields a [`Representative`]; asking it for an action yields a
//! [`Decision`] that resolves to allow or deny.
//!
//! Resolution runs in a fixed order. Every step may short-circuit with a
//! definite [`Verdict`]:
//!
//! 1. Global guards, evaluated once when the representative is built.
//! 2. Policy guards, evaluated per access when the global verdict is undecided.
//! 3. Lazy guards (global, then policy), evaluated with the entity on `can`/`could`.
//! 4. Async lazy guards (global, then policy), on `could` only.
//! 5. The action's [`Restriction`], or the default-allow/default-deny flag.
//!
//! Guards may [`provide`](Dependencies::provide) values that the restriction
//! can later [`inject`](RestrictionContext::inject), so an expensive lookup
//! happens at most once per decision.
//!
//! # Example
//!
//! ```
//! use loom_gate::{Gate, GuardContainer, Policy, Verdict};
//!
//! struct User {
//! 	id: u64,
//! 	admin: bool,
//! 	banned: bool,
//! }
//!
//! struct Post {
//! 	author_id: u64,
//! }
//!
//! let mut posts = Policy::new("post");
//! posts.define("update", |_, user: &User, post: Option<&Post>, _| {
//! 	Ok(user.admin || post.is_some_and(|p| p.author_id == user.id))
//! });
//!
//! let mut gate: Gate<User, Post> = Gate::new();
//! gate.add_policy(posts);
//! gate.guard(|user, _| Ok(if user.banned { Verdict::deny() } else { Verdict::Undecided }));
//!
//! let author = gate.build(User { id: 1, admin: false, banned: false })?;
//! let mut update = author.access("post", "update")?;
//! assert!(update.can(Some(&Post { author_id: 1 }))?);
//! assert!(!update.can(Some(&Post { author_id: 2 }))?);
//! # Ok::<(), loom_gate::GateError>(())
//! ```

pub mod config;
pub mod decision;
pub mod dependencies;
pub mod error;
pub mod evaluator;
pub mod gate;
pub mod guard;
pub mod policy;
pub mod registry;
pub mod representative;
pub mod verdict;

pub use config::GateConfig;
pub use decision::Decision;
pub use dependencies::{Dependencies, RestrictionContext};
pub use error::{BoxError, GateError, Result};
pub use evaluator::{
	evaluate_async_guards, evaluate_guards, AsyncChainLink, ChainLink, GuardDecision,
};
pub use gate::Gate;
pub use guard::{AsyncGuard, AsyncLazyGuard, ChainKind, Guard, GuardResult, LazyGuard};
pub use policy::{Policy, Restriction};
pub use registry::{GuardContainer, GuardRegistry};
pub use representative::Representative;
pub use verdict::Verdict;
