// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoped activation handles.

use std::marker::PhantomData;

use super::context_impl::{Context, swap_current};

/// A handle that restores the ambient slot when released.
///
/// Returned by [`Context::make_current`].  A `Scope` owns exactly one
/// responsibility: putting the thread's ambient slot back to whatever it held
/// immediately before activation.  Restoration happens on [`release`](Scope::release)
/// or, failing that, on drop, so the common pattern is simply to bind the
/// scope to a local and let it fall out of scope:
///
/// ```rust
/// use ambit::{Context, Key};
///
/// let k: Key<&'static str> = Key::new("stage");
/// let cx = Context::current_with(&k, "ingest");
/// {
///     let _scope = cx.make_current();
///     // ambient work here sees "ingest"
/// } // restored
/// assert_eq!(Context::current().get(&k), None);
/// ```
///
/// Drop-based release also runs during unwinding, so a panic inside the
/// protected work cannot leak the activated context into later work on the
/// thread.
///
/// # Misuse
///
/// Calling [`release`](Scope::release) twice is a safe no-op; the second call
/// logs a warning since it almost certainly indicates a bug.  Releasing
/// overlapping scopes out of order is also logged: the scope still restores
/// the prior value it captured, making the damage visible and bounded rather
/// than silently corrupting the slot for the rest of the thread's life.
///
/// A `Scope` is `!Send`: it must restore the same thread's slot it was
/// created on.
pub struct Scope {
    /// The displaced context; taken exactly once at restoration.
    prior: Option<Context>,
    /// Id of the context we installed, to detect out-of-order release.
    installed: u64,
    _not_send: PhantomData<*const ()>,
}

impl Scope {
    pub(crate) fn new(prior: Context, installed: u64) -> Self {
        Scope {
            prior: Some(prior),
            installed,
            _not_send: PhantomData,
        }
    }

    /// Restores the ambient slot to the context saved at activation.
    ///
    /// Prefer letting the scope drop; `release` exists for callers that want
    /// to deactivate before the end of a block.  Calling it a second time is
    /// a no-op that logs a warning.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ambit::{Context, Key};
    ///
    /// let k: Key<u8> = Key::new("step");
    /// let cx = Context::current_with(&k, 1);
    ///
    /// let mut scope = cx.make_current();
    /// assert_eq!(Context::current().get(&k), Some(&1));
    /// scope.release();
    /// assert_eq!(Context::current().get(&k), None);
    /// // still alive, but inert: dropping it later changes nothing
    /// ```
    pub fn release(&mut self) {
        if !self.restore() {
            log::warn!("ambient context scope released more than once; ignoring");
        }
    }

    /// Performs the restoration once; subsequent calls return false.
    fn restore(&mut self) -> bool {
        let Some(prior) = self.prior.take() else {
            return false;
        };
        let displaced = swap_current(prior);
        if displaced.context_id() != self.installed {
            // Overlapping scopes released out of order.  We still restore the
            // captured prior value so the slot ends up where this activation
            // found it.
            log::warn!(
                "ambient context scopes released out of order (installed context {}, slot held context {})",
                self.installed,
                displaced.context_id()
            );
        }
        true
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        // Silent when release() already ran; warning there covers the misuse.
        self.restore();
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("installed", &self.installed)
            .field("released", &self.prior.is_none())
            .finish()
    }
}
