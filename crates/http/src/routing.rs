//! Route metadata: what an external router needs to register one route
//! per declared mapping on a handler-bearing bean.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// How one handler parameter is bound from an incoming request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamBinding {
    /// The full request body
    Body,
    /// A single named query-string value
    Query(String),
    /// A single named URL-path segment
    Path(String),
    /// A single named header value, matched case-insensitively
    Header(String),
}

/// One declared mapping: method, path template, handler member name, and
/// the binding kind of each handler parameter in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub method: HttpMethod,
    pub path: String,
    pub handler: String,
    pub params: Vec<ParamBinding>,
}

impl RouteSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            handler: handler.into(),
            params: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path, handler)
    }

    pub fn post(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path, handler)
    }

    pub fn put(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path, handler)
    }

    pub fn patch(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path, handler)
    }

    pub fn delete(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path, handler)
    }

    /// Append the binding for the next handler parameter.
    pub fn with_param(mut self, binding: ParamBinding) -> Self {
        self.params.push(binding);
        self
    }
}

/// Registry of route metadata keyed by bean name, read by the external
/// router at startup.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: RwLock<HashMap<String, Vec<RouteSpec>>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare one route on a handler-bearing bean.
    pub fn register(&self, bean: &str, route: RouteSpec) {
        debug!(bean = %bean, path = %route.path, method = route.method.as_str(), "registering route");
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(bean.to_string())
            .or_default()
            .push(route);
    }

    /// Routes declared on one bean, in declaration order; empty for
    /// beans without mappings.
    pub fn routes_for(&self, bean: &str) -> Vec<RouteSpec> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(bean)
            .cloned()
            .unwrap_or_default()
    }

    /// Every declared route with its owning bean name.
    pub fn all(&self) -> Vec<(String, RouteSpec)> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flat_map(|(bean, routes)| {
                routes.iter().map(move |route| (bean.clone(), route.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_accumulate_per_bean_in_declaration_order() {
        let registry = RouteRegistry::new();
        registry.register(
            "ItemController",
            RouteSpec::get("/items", "index"),
        );
        registry.register(
            "ItemController",
            RouteSpec::post("/items", "create").with_param(ParamBinding::Body),
        );

        let routes = registry.routes_for("ItemController");
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].handler, "index");
        assert_eq!(routes[1].method, HttpMethod::Post);
        assert_eq!(routes[1].params, vec![ParamBinding::Body]);

        assert!(registry.routes_for("Unknown").is_empty());
    }
}
