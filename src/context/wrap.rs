// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wrapping adapters that carry a context into deferred work.
//!
//! All adapters share one shape: capture the receiver context by value at
//! wrap time, and on invocation activate it, run the wrapped closure, and
//! restore.  Restoration is unconditional because it rides on
//! [`Scope`](crate::Scope)'s drop.
//! The context is *not* re-read from the ambient slot at invocation time;
//! whatever was wrapped is what runs current, no matter which thread invokes
//! the result or how much later.

use super::context_impl::Context;

impl Context {
    /// Runs `f` with this context current, restoring afterward.
    ///
    /// The immediate (non-deferred) flavor of wrapping; sugar for activating
    /// a scope around a block.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ambit::{Context, Key};
    ///
    /// let k: Key<&'static str> = Key::new("phase");
    /// let cx = Context::current_with(&k, "flush");
    ///
    /// let seen = cx.in_scope(|| Context::current().get(&k).copied());
    /// assert_eq!(seen, Some("flush"));
    /// assert_eq!(Context::current().get(&k), None);
    /// ```
    pub fn in_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _scope = self.make_current();
        f()
    }

    /// Wraps a zero-argument closure so that invoking it activates this
    /// context for the duration of the call.
    ///
    /// The context is captured by value now; the returned closure may be sent
    /// to another thread and invoked arbitrarily later.  If the wrapped
    /// closure panics, the invoking thread's ambient slot is still restored
    /// before the panic continues, and the panic itself is not caught or
    /// altered.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ambit::{Context, Key};
    ///
    /// let k: Key<String> = Key::new("user-id");
    /// let cx = Context::current_with(&k, "u1".to_string());
    ///
    /// let task = cx.wrap({
    ///     let k = k.clone();
    ///     move || Context::current().get(&k).cloned()
    /// });
    ///
    /// // Typically `task` crosses to a worker thread here.
    /// let observed = std::thread::spawn(task).join().unwrap();
    /// assert_eq!(observed.as_deref(), Some("u1"));
    /// ```
    pub fn wrap<F, R>(&self, f: F) -> impl FnOnce() -> R + use<F, R>
    where
        F: FnOnce() -> R,
    {
        let context = self.clone();
        move || {
            let _scope = context.make_current();
            f()
        }
    }

    /// Like [`wrap`](Context::wrap), for one-argument closures.
    ///
    /// Covers the consumer/function shapes: the argument and return type pass
    /// through untouched.
    ///
    /// ```rust
    /// use ambit::{Context, Key};
    ///
    /// let k: Key<u32> = Key::new("base");
    /// let cx = Context::current_with(&k, 100);
    ///
    /// let add_base = cx.wrap_fn(|n: u32| n + Context::current().get(&k).unwrap());
    /// assert_eq!(add_base(7), 107);
    /// ```
    pub fn wrap_fn<F, A, R>(&self, f: F) -> impl FnOnce(A) -> R + use<F, A, R>
    where
        F: FnOnce(A) -> R,
    {
        let context = self.clone();
        move |a| {
            let _scope = context.make_current();
            f(a)
        }
    }

    /// Like [`wrap`](Context::wrap), for two-argument closures.
    pub fn wrap_fn2<F, A, B, R>(&self, f: F) -> impl FnOnce(A, B) -> R + use<F, A, B, R>
    where
        F: FnOnce(A, B) -> R,
    {
        let context = self.clone();
        move |a, b| {
            let _scope = context.make_current();
            f(a, b)
        }
    }
}
