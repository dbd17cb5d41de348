// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# ambit

ambit is a small ambient-context library for tracing instrumentation.

# Development status

ambit is experimental and the API may change.

# The problem

Tracing instrumentation needs to associate values (a user id, a request id, a
trace parent) with "whatever work is going on right now", without threading an
extra parameter through every function signature in between.  The standard
answer is an *ambient context*: an immutable key-value container that can be
installed into a per-thread slot for the duration of a scope, and read back
implicitly from anywhere inside that scope.

This sounds simple but has two failure modes that bite in practice:

* Conflating "I hold a reference to a context" with "that context is current".
  Holding a [`Context`](context::Context) value lets you call
  [`get`](context::Context::get) on it directly, but does **not** affect what
  [`Context::current`](context::Context::current) returns.  Only an active,
  unreleased [`make_current`](context::Context::make_current) scope does.
* Losing the context across a hand-off to deferred work.  A closure submitted
  to a thread pool, or a future polled by an executor, runs on a thread whose
  ambient slot knows nothing about the submitter.  The fix is to capture the
  context *by value* at wrap time and re-activate it around each invocation;
  see [`Context::wrap`](context::Context::wrap) and
  [`FutureExt::with_context`](context::FutureExt::with_context).

ambit provides exactly this primitive, nothing more: no spans, no samplers, no
exporters.  Crates that need those should build them *on top of* the context.

# Quick tour

```rust
use ambit::{Context, Key};

let user_id: Key<String> = Key::new("user-id");

// Holding a context is not the same as it being current.
let cx = Context::current().with(&user_id, "u1".to_string());
assert_eq!(cx.get(&user_id).map(String::as_str), Some("u1"));
assert_eq!(Context::current().get(&user_id), None);

// Activation installs it into the thread's ambient slot, scoped.
{
    let _scope = cx.make_current();
    assert_eq!(Context::current().get(&user_id).map(String::as_str), Some("u1"));
}
assert_eq!(Context::current().get(&user_id), None);
```

# Crossing process boundaries

Values in a context can be carried to another process through any string
key-value carrier (typically request headers) via the
[`propagation`] module.  The carrier shape is abstracted behind
[`Injector`](propagation::Injector) and [`Extractor`](propagation::Extractor),
so the core never sees a concrete HTTP type.

# Multithreading

[`Context`](context::Context) values are immutable and cheap to clone
(`Arc`-based); share them freely across threads.  The ambient slot is strictly
thread-local: activating a context on one thread never affects another, and a
[`Scope`](context::Scope) must be released on the thread that created it.
*/

pub mod context;
mod key;
pub mod propagation;

pub use context::{Context, FutureExt, Scope, WithContext};
pub use key::Key;
