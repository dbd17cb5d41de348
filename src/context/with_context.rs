// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async context preservation.

use std::future::Future;
use std::pin::Pin;
use std::task::Poll;

use super::context_impl::Context;

/// A [`Future`] wrapper that keeps a captured context current across polls.
///
/// Executors generally do not preserve thread-local state between polls: a
/// future may be polled from different worker threads, none of which know
/// about the context that was ambient where the future was created.
/// `WithContext` fixes this by activating its captured context around every
/// poll and restoring the polling thread's prior ambient value afterward.
///
/// Constructed via [`FutureExt::with_context`] or
/// [`FutureExt::with_current_context`].
///
/// # Examples
///
/// ```rust
/// use ambit::{Context, FutureExt, Key};
///
/// # async fn example() {
/// let k: Key<&'static str> = Key::new("job");
/// let cx = Context::current_with(&k, "reindex");
/// let fut = async {
///     assert_eq!(Context::current().get(&k), Some(&"reindex"));
/// };
/// fut.with_context(cx).await;
/// # }
/// ```
pub struct WithContext<F> {
    context: Context,
    inner: F,
}

impl<F> WithContext<F> {
    pub(crate) fn new(context: Context, inner: F) -> Self {
        WithContext { context, inner }
    }
}

impl<F> Future for WithContext<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        let (context, fut) = unsafe {
            //safety: inner is never moved out of the pinned reference
            let this = self.get_unchecked_mut();
            (this.context.clone(), Pin::new_unchecked(&mut this.inner))
        };
        // Scope drop restores the polling thread's prior context, whether the
        // poll returns, panics, or the future is never polled again.
        let _scope = context.make_current();
        fut.poll(cx)
    }
}

/// Extension trait attaching a context to any [`Future`].
pub trait FutureExt: Sized {
    /// Wraps this future so `context` is current during every poll.
    ///
    /// The polling thread's own ambient value is saved and restored around
    /// each poll; dropping or abandoning the future leaks nothing into the
    /// executor's threads.
    fn with_context(self, context: Context) -> WithContext<Self>;

    /// Wraps this future with whatever context is current *now*.
    ///
    /// This is the async analogue of submitting a wrapped closure to an
    /// executor: capture at hand-off time, not at poll time.
    ///
    /// ```rust
    /// use ambit::{Context, FutureExt, Key};
    ///
    /// # async fn example() {
    /// let k: Key<u8> = Key::new("attempt");
    /// let _scope = Context::current_with(&k, 2).make_current();
    /// // Captures {attempt: 2} even if the executor polls elsewhere.
    /// let fut = async { Context::current().get(&k).copied() }.with_current_context();
    /// assert_eq!(fut.await, Some(2));
    /// # }
    /// ```
    fn with_current_context(self) -> WithContext<Self> {
        self.with_context(Context::current())
    }
}

impl<F: Future> FutureExt for F {
    fn with_context(self, context: Context) -> WithContext<Self> {
        WithContext::new(context, self)
    }
}
