//! Entity instances as plain detached values.

use serde_json::{Map, Value};

/// An in-memory entity instance: property name -> JSON value.
///
/// Instances are value-like and caller-owned. The persistence engine never
/// retains a reference after an operation completes and keeps no identity
/// map, so two reads of the same row yield distinct instances.
/// Relationship properties are materialized into the same map, as a nested
/// object for to-one links or an array for to-many links.
pub type Instance = Map<String, Value>;

/// Truthiness test for identifier and key values: null, `false`, zero, and
/// the empty string count as absent.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Build an instance from a JSON object literal. Panics on non-objects;
/// intended for tests and fixtures.
pub fn instance_from(value: Value) -> Instance {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}
