//! Dependency injection container.
//!
//! Beans implement [`Injectable`] and register with a [`ServiceContainer`];
//! resolution is lazy, memoized, and singleton-scoped. Constructor-style
//! dependencies resolve best-effort through the [`Injector`] view, while
//! imperative lookups through the container fail hard.

pub mod container;
pub mod definition;
pub mod injectable;

pub use container::ServiceContainer;
pub use definition::{BeanDefinition, DependencyKey};
pub use injectable::{short_type_name, Injectable, Injector};
