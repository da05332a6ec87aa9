pub mod config;
pub mod container;
pub mod errors;

// Re-export key types for convenience
pub use config::ConfigMap;
pub use container::{BeanDefinition, DependencyKey, Injectable, Injector, ServiceContainer};
pub use errors::{CoreError, CoreResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framework information
pub const FRAMEWORK_NAME: &str = "lariat";

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}
