// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable contexts, the thread-local ambient slot, and scoped activation.
//!
//! This module is the heart of the crate.  It provides:
//!
//! - [`Context`]: an immutable, persistent key-value container, cheap to
//!   clone and share
//! - [`Scope`]: the handle returned by [`Context::make_current`], which
//!   restores the prior ambient context when released
//! - wrapping adapters ([`Context::wrap`] and friends) that carry a context
//!   across a hand-off to deferred work
//! - [`WithContext`] and [`FutureExt`]: the async flavor of wrapping, which
//!   re-activates the captured context around every poll
//!
//! # Ambient vs. explicit
//!
//! The one rule to internalize: *holding* a [`Context`] and that context
//! *being current* are independent.  [`Context::get`] always works on a held
//! value; [`Context::current`] only reflects contexts with an active,
//! unreleased scope on the calling thread.
//!
//! ```rust
//! use ambit::{Context, Key};
//!
//! let k: Key<&'static str> = Key::new("example");
//! let cx = Context::current().with(&k, "value");
//!
//! // Explicit: always resolvable.
//! assert_eq!(cx.get(&k), Some(&"value"));
//! // Ambient: unaffected until activated.
//! assert_eq!(Context::current().get(&k), None);
//!
//! let scope = cx.make_current();
//! assert_eq!(Context::current().get(&k), Some(&"value"));
//! drop(scope);
//! assert_eq!(Context::current().get(&k), None);
//! ```
//!
//! # Nesting
//!
//! Scopes nest strictly LIFO.  Activating `c1`, then `c2`, then releasing
//! `c2`, then `c1` restores exactly the pre-`c1` ambient value, to any depth.
//! Releasing out of order is a caller bug; it is detected and logged rather
//! than silently corrupting later work on the thread (see [`Scope`]).

mod context_impl;
mod scope;
mod with_context;
mod wrap;


pub use context_impl::Context;
pub use scope::Scope;
pub use with_context::{FutureExt, WithContext};
