// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed, identity-keyed slot identifiers.

use std::borrow::Cow;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static KEY_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
struct KeyInner {
    id: u64,
    name: Cow<'static, str>,
}

/// An opaque, process-unique identifier for a typed context slot.
///
/// A `Key<T>` names a slot in a [`Context`](crate::Context) that holds values
/// of type `T`.  Keys compare by *identity*, not by name: two keys created
/// with the same name are distinct slots, and a value stored under one is
/// invisible through the other.  The name exists purely for humans reading
/// debug output.
///
/// Keys are cheap to clone and may be freely shared across threads; typical
/// usage creates them once and hands clones to everything that reads or
/// writes the slot.
///
/// # Examples
///
/// ```rust
/// use ambit::{Context, Key};
///
/// let a: Key<String> = Key::new("user-id");
/// let b: Key<String> = Key::new("user-id");
/// assert_ne!(a, b); // same name, different slots
///
/// let cx = Context::root().with(&a, "u1".to_string());
/// assert_eq!(cx.get(&a).map(String::as_str), Some("u1"));
/// assert_eq!(cx.get(&b), None);
/// ```
pub struct Key<T> {
    inner: Arc<KeyInner>,
    // fn(T) -> T keeps the slot type without demanding T: Send/Sync of the
    // key itself, and without pretending the key owns a T.
    _slot: PhantomData<fn(T) -> T>,
}

impl<T> Key<T> {
    /// Creates a new key with a debugging name.
    ///
    /// Every call returns a distinct key, even for identical names.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ambit::Key;
    ///
    /// let request_id: Key<u64> = Key::new("request-id");
    /// assert_eq!(request_id.name(), "request-id");
    /// ```
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Key {
            inner: Arc::new(KeyInner {
                id: KEY_ID.fetch_add(1, Ordering::Relaxed),
                name: name.into(),
            }),
            _slot: PhantomData,
        }
    }

    /// Returns the debugging name this key was created with.
    ///
    /// Names carry no identity; see the type-level docs.
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The process-unique id contexts store entries under.
    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        Key {
            inner: self.inner.clone(),
            _slot: PhantomData,
        }
    }
}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T> Eq for Key<T> {}

impl<T> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl<T> Debug for Key<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.inner.name)
            .field("id", &self.inner.id)
            .finish()
    }
}

impl<T> Display for Key<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.inner.name, self.inner.id)
    }
}

#[cfg(test)]
mod tests {
    use super::Key;

    #[test]
    fn same_name_distinct_identity() {
        let a: Key<u32> = Key::new("shared-name");
        let b: Key<u32> = Key::new("shared-name");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn key_display_includes_name() {
        let k: Key<String> = Key::new("tenant");
        assert!(format!("{k}").starts_with("tenant#"));
    }
}
