//! Handler argument binding.
//!
//! Given the parts a router extracted from an incoming request, builds
//! the argument list for one handler invocation according to the route's
//! declared parameter bindings. Unbound parameters resolve to JSON null.

use std::collections::HashMap;

use serde_json::Value;

use crate::routing::{ParamBinding, RouteSpec};

/// The pieces of a request a router hands over for binding.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    pub body: Value,
    pub query: HashMap<String, String>,
    /// Captured path segments as (name, value), in capture order
    pub path_params: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
}

impl RequestParts {
    pub fn new() -> Self {
        Self {
            body: Value::Null,
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Build the argument list for one invocation of a route's handler.
pub fn bind_arguments(route: &RouteSpec, request: &RequestParts) -> Vec<Value> {
    route
        .params
        .iter()
        .map(|binding| bind_one(binding, request))
        .collect()
}

fn bind_one(binding: &ParamBinding, request: &RequestParts) -> Value {
    match binding {
        ParamBinding::Body => request.body.clone(),
        ParamBinding::Query(name) => request
            .query
            .get(name)
            .map(|value| Value::String(value.clone()))
            .unwrap_or(Value::Null),
        // A declared name that matches no captured segment falls back to
        // the first captured segment, a leniency for single-variable
        // routes.
        ParamBinding::Path(name) => request
            .path_params
            .iter()
            .find(|(captured, _)| captured == name)
            .or_else(|| request.path_params.first())
            .map(|(_, value)| Value::String(value.clone()))
            .unwrap_or(Value::Null),
        ParamBinding::Header(name) => request
            .headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| Value::String(value.clone()))
            .unwrap_or(Value::Null),
    }
}
