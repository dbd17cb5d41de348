// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carrying context entries across process boundaries.
//!
//! In-process, a [`Context`](crate::Context) travels by reference or by
//! scoped activation.  Across a process boundary it must be flattened into
//! whatever string key-value carrier the transport offers, usually request
//! headers.  This module defines the two halves of that hand-off:
//!
//! - [`Injector`]/[`Extractor`]: pluggable access to the concrete carrier, so
//!   the core never depends on an HTTP (or any transport) type
//! - [`Propagator`]: the inject/extract pair itself, with
//!   [`FieldPropagator`] as a concrete whitelist-of-fields implementation
//!
//! Propagation never hard-fails an inbound request: a missing or malformed
//! carrier field simply leaves that key absent in the extracted context.
//!
//! # Examples
//!
//! ```rust
//! use std::collections::HashMap;
//! use ambit::{Context, Key};
//! use ambit::propagation::{FieldPropagator, Propagator};
//!
//! let user_id: Key<String> = Key::new("user-id");
//! let propagator = FieldPropagator::new().with_field("x-user-id", user_id.clone());
//!
//! // Sender: flatten into outbound headers.
//! let cx = Context::root().with(&user_id, "u1".to_string());
//! let mut headers: HashMap<String, String> = HashMap::new();
//! propagator.inject_context(&cx, &mut headers);
//! assert_eq!(headers.get("x-user-id").map(String::as_str), Some("u1"));
//!
//! // Receiver: rebuild a context from inbound headers.
//! let inbound = propagator.extract(&headers);
//! assert_eq!(inbound.get(&user_id).map(String::as_str), Some("u1"));
//! ```

use std::collections::HashMap;

use crate::context::Context;
use crate::key::Key;

/// Write access to an outbound carrier.
///
/// Implemented by anything that can store string key-value pairs on the way
/// out: header maps, metadata tables.  Setting a field must not fail; an
/// implementation that cannot store a field drops it.
pub trait Injector {
    /// Stores `value` under `key` in the carrier, replacing any prior value.
    fn set(&mut self, key: &str, value: String);
}

/// Read access to an inbound carrier.
pub trait Extractor {
    /// Fetches the value for `key`, if the carrier has one.
    fn get(&self, key: &str) -> Option<&str>;

    /// All field names present in the carrier.
    fn keys(&self) -> Vec<&str>;
}

impl Injector for HashMap<String, String> {
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_owned(), value);
    }
}

impl Extractor for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        HashMap::keys(self).map(String::as_str).collect()
    }
}

/// The inject/extract pair that moves context entries through a carrier.
///
/// A propagator knows *which* entries cross the boundary and under what field
/// names; the [`Injector`]/[`Extractor`] arguments know *where* they land.
/// The `inject`/`extract` conveniences operate on the calling thread's
/// current context, which is what instrumentation glue nearly always wants.
pub trait Propagator {
    /// Serializes the whitelisted entries of `context` into the carrier.
    ///
    /// Entries absent from `context` write nothing.
    fn inject_context(&self, context: &Context, injector: &mut dyn Injector);

    /// Reads the whitelisted fields out of the carrier, returning `base`
    /// extended with every field that was present and well-formed.
    ///
    /// A malformed field degrades to "absent" for that key only; extraction
    /// itself never fails.
    fn extract_with_context(&self, base: &Context, extractor: &dyn Extractor) -> Context;

    /// The carrier field names this propagator reads and writes.
    fn fields(&self) -> Vec<&str>;

    /// Injects from [`Context::current`].
    fn inject(&self, injector: &mut dyn Injector) {
        self.inject_context(&Context::current(), injector);
    }

    /// Extracts on top of the root context.
    fn extract(&self, extractor: &dyn Extractor) -> Context {
        self.extract_with_context(&Context::root(), extractor)
    }
}

/// A propagator for an explicit whitelist of string-valued fields.
///
/// Each registered field pairs a carrier field name with the [`Key<String>`]
/// it round-trips.  Keys not registered here never cross the boundary; the
/// wire format is the value itself, unencoded, which is all plain
/// header-style carriers need.
///
/// # Examples
///
/// ```rust
/// use ambit::Key;
/// use ambit::propagation::{FieldPropagator, Propagator};
///
/// let user_id: Key<String> = Key::new("user-id");
/// let request_id: Key<String> = Key::new("request-id");
///
/// let propagator = FieldPropagator::new()
///     .with_field("x-user-id", user_id)
///     .with_field("x-request-id", request_id);
/// assert_eq!(propagator.fields(), vec!["x-user-id", "x-request-id"]);
/// ```
#[derive(Default)]
pub struct FieldPropagator {
    fields: Vec<(String, Key<String>)>,
}

impl FieldPropagator {
    /// Creates a propagator with an empty whitelist.
    pub fn new() -> Self {
        FieldPropagator { fields: Vec::new() }
    }

    /// Registers a carrier field and the key it carries.
    pub fn with_field(mut self, name: impl Into<String>, key: Key<String>) -> Self {
        self.fields.push((name.into(), key));
        self
    }
}

/// Header-style carriers tolerate printable ASCII only; empty or
/// non-printable values are treated as malformed on extraction.
fn well_formed(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| (0x20..=0x7e).contains(&b))
}

impl Propagator for FieldPropagator {
    fn inject_context(&self, context: &Context, injector: &mut dyn Injector) {
        for (name, key) in &self.fields {
            if let Some(value) = context.get(key) {
                injector.set(name, value.clone());
            }
        }
    }

    fn extract_with_context(&self, base: &Context, extractor: &dyn Extractor) -> Context {
        let mut context = base.clone();
        for (name, key) in &self.fields {
            match extractor.get(name) {
                Some(raw) if well_formed(raw) => {
                    context = context.with(key, raw.to_owned());
                }
                Some(_) => {
                    // Recovered locally: the key is simply absent downstream.
                    log::debug!("discarding malformed carrier field {name:?}");
                }
                None => {}
            }
        }
        context
    }

    fn fields(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_field_propagator() -> (FieldPropagator, Key<String>, Key<String>) {
        let user_id: Key<String> = Key::new("user-id");
        let request_id: Key<String> = Key::new("request-id");
        let propagator = FieldPropagator::new()
            .with_field("x-user-id", user_id.clone())
            .with_field("x-request-id", request_id.clone());
        (propagator, user_id, request_id)
    }

    #[test]
    fn test_round_trip_two_fields() {
        let (propagator, user_id, request_id) = two_field_propagator();
        let cx = Context::root()
            .with(&user_id, "user-456".to_string())
            .with(&request_id, "req-789".to_string());

        let mut carrier: HashMap<String, String> = HashMap::new();
        propagator.inject_context(&cx, &mut carrier);
        assert_eq!(carrier.len(), 2);

        let extracted = propagator.extract(&carrier);
        assert_eq!(extracted.get(&user_id).map(String::as_str), Some("user-456"));
        assert_eq!(extracted.get(&request_id).map(String::as_str), Some("req-789"));
    }

    #[test]
    fn test_missing_field_extracts_absent() {
        let (propagator, user_id, request_id) = two_field_propagator();
        let mut carrier: HashMap<String, String> = HashMap::new();
        carrier.set("x-user-id", "user-456".to_string());

        let extracted = propagator.extract(&carrier);
        assert_eq!(extracted.get(&user_id).map(String::as_str), Some("user-456"));
        assert_eq!(extracted.get(&request_id), None);
    }

    #[test]
    fn test_absent_entries_inject_nothing() {
        let (propagator, user_id, _request_id) = two_field_propagator();
        let cx = Context::root().with(&user_id, "only-this".to_string());

        let mut carrier: HashMap<String, String> = HashMap::new();
        propagator.inject_context(&cx, &mut carrier);
        assert_eq!(carrier.len(), 1);
        assert_eq!(Extractor::get(&carrier, "x-request-id"), None);
    }

    #[test]
    fn test_malformed_field_degrades_to_absent() {
        let (propagator, user_id, request_id) = two_field_propagator();
        let mut carrier: HashMap<String, String> = HashMap::new();
        carrier.set("x-user-id", "ok".to_string());
        carrier.set("x-request-id", "bro\u{0000}ken".to_string());

        let extracted = propagator.extract(&carrier);
        assert_eq!(extracted.get(&user_id).map(String::as_str), Some("ok"));
        assert_eq!(extracted.get(&request_id), None);
    }

    #[test]
    fn test_extract_with_context_layers_on_base() {
        let (propagator, user_id, _request_id) = two_field_propagator();
        let tenant: Key<String> = Key::new("tenant");
        let base = Context::root().with(&tenant, "acme".to_string());

        let mut carrier: HashMap<String, String> = HashMap::new();
        carrier.set("x-user-id", "u1".to_string());

        let extracted = propagator.extract_with_context(&base, &carrier);
        assert_eq!(extracted.get(&tenant).map(String::as_str), Some("acme"));
        assert_eq!(extracted.get(&user_id).map(String::as_str), Some("u1"));
    }

    #[test]
    fn test_inject_reads_current() {
        let (propagator, user_id, _request_id) = two_field_propagator();
        let cx = Context::root().with(&user_id, "ambient-user".to_string());

        let mut carrier: HashMap<String, String> = HashMap::new();
        {
            let _scope = cx.make_current();
            propagator.inject(&mut carrier);
        }
        assert_eq!(
            Extractor::get(&carrier, "x-user-id"),
            Some("ambient-user")
        );
    }
}
