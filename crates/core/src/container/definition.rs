//! Bean definitions and dependency keys.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::container::injectable::Injector;

/// Identifies one declared dependency of a bean.
///
/// Beans declare what their constructor consumes as a list of keys; the
/// container uses the list for validation diagnostics, while actual
/// resolution happens through [`Injector`] at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyKey {
    /// Keyed lookup by the capability tag of a registered concrete type.
    Type(TypeId, &'static str),
    /// Lookup by explicit bean name (qualifier).
    Named(String),
    /// Supplied from the container's bound data source, not the bean maps.
    DataSource,
    /// Read from the flat configuration store by key.
    Config(String),
}

impl DependencyKey {
    /// Capability tag for a concrete type.
    pub fn of<T: 'static>() -> Self {
        DependencyKey::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    pub fn named(name: impl Into<String>) -> Self {
        DependencyKey::Named(name.into())
    }

    pub fn config(key: impl Into<String>) -> Self {
        DependencyKey::Config(key.into())
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKey::Type(_, name) => write!(f, "type {}", name),
            DependencyKey::Named(name) => write!(f, "bean '{}'", name),
            DependencyKey::DataSource => write!(f, "data source"),
            DependencyKey::Config(key) => write!(f, "config '{}'", key),
        }
    }
}

/// Factory that builds a bean instance against a live container view.
pub(crate) type Constructor =
    Arc<dyn Fn(&Injector<'_>) -> Arc<dyn Any + Send + Sync> + Send + Sync>;

/// A registered bean: its identity, declared dependencies, and how to
/// build one. Definitions without a constructor describe beans whose
/// singleton was supplied externally at registration time.
pub struct BeanDefinition {
    pub name: String,
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub dependencies: Vec<DependencyKey>,
    pub(crate) constructor: Option<Constructor>,
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("dependencies", &self.dependencies)
            .field(
                "constructor",
                &self.constructor.as_ref().map(|_| "<constructor>"),
            )
            .finish()
    }
}
