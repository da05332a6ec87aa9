//! The [`Injectable`] trait and the [`Injector`] resolution view.

use std::sync::Arc;

use crate::container::container::ServiceContainer;
use crate::container::definition::DependencyKey;

/// Derive the short bean name for a type: the last path segment of its
/// full type name, e.g. `app::services::UserService` -> `UserService`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// A container-managed type.
///
/// Construction is split in two phases, both best-effort: `construct`
/// resolves constructor-style dependencies (an unresolvable dependency
/// yields `None` and the bean decides whether to tolerate it), then
/// `inject` runs a field-injection pass on the built value. Neither phase
/// can fail the container; a bean holding a `None` dependency surfaces the
/// problem at first use.
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Bean name this type registers under. Override to declare an
    /// explicit name; the override always beats the derived default.
    fn bean_name() -> &'static str {
        short_type_name::<Self>()
    }

    /// Declared dependencies, consumed by [`ServiceContainer::validate`]
    /// for diagnostics. Resolution itself does not read this list.
    fn dependencies() -> Vec<DependencyKey> {
        Vec::new()
    }

    /// Build an instance, resolving each dependency through the injector.
    fn construct(injector: &Injector<'_>) -> Self;

    /// Post-construction field injection pass.
    fn inject(&mut self, injector: &Injector<'_>) {
        let _ = injector;
    }
}

/// Borrowed resolution view handed to beans while they are being built.
///
/// Every lookup on this type is best-effort: failures come back as `None`,
/// never as errors. The imperative container surface
/// ([`ServiceContainer::get_bean`]) is the one that fails hard.
pub struct Injector<'c> {
    container: &'c ServiceContainer,
}

impl<'c> Injector<'c> {
    pub(crate) fn new(container: &'c ServiceContainer) -> Self {
        Self { container }
    }

    /// Resolve a dependency by type tag.
    ///
    /// The bound data source is checked first: a dependency whose type
    /// matches it is served from container state without a bean lookup.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        if let Some(source) = self.container.data_source::<T>() {
            return Some(source);
        }
        self.container.opt_bean::<T>()
    }

    /// Resolve a dependency by explicit bean name.
    pub fn resolve_named<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.container.opt_bean_named::<T>(name)
    }

    /// Field-style resolution: an explicit qualifier takes priority over
    /// the declared field type.
    pub fn resolve_field<T: Send + Sync + 'static>(&self, qualifier: Option<&str>) -> Option<Arc<T>> {
        match qualifier {
            Some(name) => self.resolve_named::<T>(name),
            None => self.resolve::<T>(),
        }
    }

    /// Look up a configuration value by flat key. Absent keys are a valid
    /// outcome; the bean keeps its post-construction default.
    pub fn config_value(&self, key: &str) -> Option<String> {
        self.container.config_value(key)
    }

    /// The container-held data-access resource, if one is bound.
    pub fn data_source<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.container.data_source::<T>()
    }
}
