// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core Context implementation.

use std::any::Any;
use std::cell::{Cell, OnceCell};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use super::scope::Scope;
use crate::key::Key;

/// Root context id; the per-context counter starts above it.
const ROOT_ID: u64 = 0;

static CONTEXT_ID: AtomicU64 = AtomicU64::new(ROOT_ID + 1);

/// The shared empty context every derived context descends from.
static ROOT: LazyLock<Context> = LazyLock::new(|| Context {
    inner: Arc::new(ContextInner {
        parent: None,
        entry: None,
        context_id: ROOT_ID,
    }),
});

/// One stored key-value pair.  Values are type-erased; [`Context::get`]
/// recovers the static type recorded by the `Key<T>` used to store them.
pub(crate) struct Entry {
    pub(crate) key: u64,
    pub(crate) value: Arc<dyn Any + Send + Sync>,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Internal context data.
///
/// A context is one node in a persistent parent-pointer chain; `with` pushes
/// a node, lookup walks toward the root and the first hit wins, which makes
/// shadowing structural rather than destructive.
#[derive(Debug)]
pub(crate) struct ContextInner {
    pub(crate) parent: Option<Context>,
    pub(crate) entry: Option<Entry>,
    pub(crate) context_id: u64,
}

/// An immutable, heterogeneous key-value container for ambient data.
///
/// A `Context` maps [`Key<T>`](crate::Key) slots to values of type `T`.  It
/// is never mutated: [`with`](Context::with) returns a *new* context and the
/// receiver (and every context previously derived from it) is untouched.
/// Contexts are cheap to clone (`Arc`-based) and thread-safe.
///
/// # Ambient slot
///
/// Each thread owns one mutable slot holding the currently *active* context,
/// read via [`Context::current`] and written only through
/// [`make_current`](Context::make_current)/[`Scope`] pairs.  The slot defaults
/// to [`Context::root`] on threads that never activated anything.
///
/// # Examples
///
/// ```rust
/// use ambit::{Context, Key};
///
/// let k: Key<u32> = Key::new("retries");
///
/// let base = Context::root().with(&k, 3);
/// let shadowed = base.with(&k, 5);
///
/// // Derivation shadows; it never rewrites history.
/// assert_eq!(base.get(&k), Some(&3));
/// assert_eq!(shadowed.get(&k), Some(&5));
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    pub(crate) inner: Arc<ContextInner>,
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Context {}

impl Hash for Context {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::root()
    }
}

thread_local! {
    static CURRENT: OnceCell<Cell<Context>> = const { OnceCell::new() };
}

/// Lazily initializes and returns the thread-local ambient cell.
fn get_or_init_current(once: &OnceCell<Cell<Context>>) -> &Cell<Context> {
    once.get_or_init(|| Cell::new(Context::root()))
}

/// Swaps the calling thread's ambient slot, returning the displaced context.
///
/// This is the only mutation path for the slot; `make_current` and `Scope`
/// restoration both go through it.
pub(crate) fn swap_current(context: Context) -> Context {
    CURRENT.with(|once| get_or_init_current(once).replace(context))
}

impl Context {
    /// Returns the empty root context.
    ///
    /// The root has no entries and is the ultimate ancestor of every derived
    /// context.  It is a process-wide singleton, so comparisons against it
    /// are meaningful:
    ///
    /// ```rust
    /// use ambit::Context;
    ///
    /// assert_eq!(Context::root(), Context::root());
    /// assert_eq!(Context::default(), Context::root());
    /// ```
    #[inline]
    pub fn root() -> Context {
        ROOT.clone()
    }

    /// Returns the context currently active on this thread.
    ///
    /// If the thread never activated a context, this is [`Context::root`].
    /// No side effects; safe to call from any thread at any time, O(1).
    ///
    /// Note that this reads the *ambient slot*, not any context value you
    /// happen to hold; see the [module docs](crate::context) for the
    /// distinction.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ambit::Context;
    ///
    /// // A fresh thread starts at root.
    /// assert_eq!(Context::current(), Context::root());
    /// ```
    #[inline]
    pub fn current() -> Context {
        CURRENT.with(|once| {
            let c = get_or_init_current(once);
            //safety: we never hand out a mutable reference to the cell's contents
            unsafe { &*c.as_ptr() }.clone()
        })
    }

    /// Returns a new context: this one plus `key` mapped to `value`.
    ///
    /// The receiver is not modified.  If `key` was already present anywhere
    /// in the chain, the new entry shadows it for lookups through the
    /// returned context; contexts still referencing the old chain resolve
    /// the old value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ambit::{Context, Key};
    ///
    /// let k: Key<String> = Key::new("tenant");
    /// let cx = Context::root().with(&k, "acme".to_string());
    ///
    /// assert_eq!(cx.get(&k).map(String::as_str), Some("acme"));
    /// assert_eq!(Context::root().get(&k), None);
    /// ```
    pub fn with<T: Any + Send + Sync>(&self, key: &Key<T>, value: T) -> Context {
        Context {
            inner: Arc::new(ContextInner {
                parent: Some(self.clone()),
                entry: Some(Entry {
                    key: key.id(),
                    value: Arc::new(value),
                }),
                context_id: CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            }),
        }
    }

    /// Shorthand for `Context::current().with(key, value)`.
    ///
    /// Instrumentation that derives from whatever is ambient uses this
    /// constantly:
    ///
    /// ```rust
    /// use ambit::{Context, Key};
    ///
    /// let k: Key<&'static str> = Key::new("request-id");
    /// let cx = Context::current_with(&k, "req-789");
    /// assert_eq!(cx.get(&k), Some(&"req-789"));
    /// ```
    pub fn current_with<T: Any + Send + Sync>(key: &Key<T>, value: T) -> Context {
        Context::current().with(key, value)
    }

    /// Resolves `key` against this context's own entries.
    ///
    /// An absent key yields `None`, never an error.  This reads the receiver
    /// only; it neither consults nor affects the ambient slot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ambit::{Context, Key};
    ///
    /// let k: Key<u64> = Key::new("deadline-ms");
    /// assert_eq!(Context::root().get(&k), None);
    /// assert_eq!(Context::root().with(&k, 250).get(&k), Some(&250));
    /// ```
    pub fn get<T: Any + Send + Sync>(&self, key: &Key<T>) -> Option<&T> {
        let mut node = self;
        loop {
            if let Some(entry) = &node.inner.entry {
                if entry.key == key.id() {
                    return entry.value.downcast_ref::<T>();
                }
            }
            match &node.inner.parent {
                Some(parent) => node = parent,
                None => return None,
            }
        }
    }

    /// Installs this context into the thread's ambient slot.
    ///
    /// The returned [`Scope`] captures whatever the slot held immediately
    /// before, and restores it when released (explicitly or on drop).  Scopes
    /// nest to any depth and must release LIFO.
    ///
    /// Dropping the scope is the normal release path and runs on every exit,
    /// including panics:
    ///
    /// ```rust
    /// use ambit::{Context, Key};
    ///
    /// let k: Key<i32> = Key::new("depth");
    /// let before = Context::current();
    ///
    /// let c1 = Context::current_with(&k, 1);
    /// let c2 = c1.with(&k, 2);
    /// {
    ///     let _s1 = c1.make_current();
    ///     {
    ///         let _s2 = c2.make_current();
    ///         assert_eq!(Context::current(), c2);
    ///     }
    ///     assert_eq!(Context::current(), c1);
    /// }
    /// assert_eq!(Context::current(), before);
    /// ```
    #[must_use = "dropping the scope immediately deactivates the context again"]
    pub fn make_current(&self) -> Scope {
        let prior = swap_current(self.clone());
        Scope::new(prior, self.inner.context_id)
    }

    /// The unique id of this context node; used by [`Scope`] to detect
    /// out-of-order release.
    #[inline]
    pub(crate) fn context_id(&self) -> u64 {
        self.inner.context_id
    }
}
