//! The service container: bean definitions, singleton cache, configuration
//! store, and the bound data-access resource.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, warn};

use crate::config::ConfigMap;
use crate::container::definition::{BeanDefinition, Constructor, DependencyKey};
use crate::container::injectable::{short_type_name, Injectable, Injector};
use crate::errors::{CoreError, CoreResult};

/// Process-wide bean registry with lazy, memoized, singleton-scoped
/// resolution.
///
/// The container is an explicit context object: construct one at process
/// start and pass it by reference to whatever needs it. Tests get a fresh
/// container (or call [`clear`](Self::clear)) instead of fighting over a
/// global.
///
/// Resolution has two surfaces with different failure contracts:
/// - [`get_bean`](Self::get_bean) / [`get_bean_named`](Self::get_bean_named)
///   are imperative lookups that fail hard with
///   [`CoreError::BeanNotFound`].
/// - The [`Injector`] view handed to beans under construction is
///   best-effort: unresolvable dependencies degrade to `None` and the
///   failure is deferred to first use.
pub struct ServiceContainer {
    definitions: RwLock<HashMap<String, BeanDefinition>>,
    type_index: RwLock<HashMap<TypeId, String>>,
    aliases: RwLock<HashMap<String, String>>,
    singletons: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    config: RwLock<HashMap<String, String>>,
    data_source: RwLock<Option<(TypeId, Arc<dyn Any + Send + Sync>)>>,
    constructing: Mutex<HashSet<String>>,
}

fn lock_error(resource: &str) -> CoreError {
    CoreError::LockError {
        resource: resource.to_string(),
    }
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(HashMap::new()),
            type_index: RwLock::new(HashMap::new()),
            aliases: RwLock::new(HashMap::new()),
            singletons: RwLock::new(HashMap::new()),
            config: RwLock::new(HashMap::new()),
            data_source: RwLock::new(None),
            constructing: Mutex::new(HashSet::new()),
        }
    }

    /// Register an [`Injectable`] type under its bean name.
    ///
    /// Re-registering under the same name replaces the definition but
    /// leaves an already-materialized singleton untouched.
    pub fn register<T: Injectable>(&self) -> CoreResult<()> {
        let name = T::bean_name().to_string();
        let constructor: Constructor = Arc::new(|injector: &Injector<'_>| {
            let mut bean = T::construct(injector);
            bean.inject(injector);
            Arc::new(bean) as Arc<dyn Any + Send + Sync>
        });
        let definition = BeanDefinition {
            name: name.clone(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            dependencies: T::dependencies(),
            constructor: Some(constructor),
        };

        self.definitions
            .write()
            .map_err(|_| lock_error("definitions"))?
            .insert(name.clone(), definition);
        self.type_index
            .write()
            .map_err(|_| lock_error("type_index"))?
            .insert(TypeId::of::<T>(), name.clone());

        debug!(bean = %name, "registered bean definition");
        Ok(())
    }

    /// Register a pre-built instance under the type's derived bean name.
    ///
    /// Used for beans whose construction needs externally-supplied
    /// arguments. The supplied instance seeds the singleton cache
    /// directly, replacing any previous singleton under that name.
    pub fn register_instance<T: Send + Sync + 'static>(&self, instance: T) -> CoreResult<()> {
        self.register_instance_named(short_type_name::<T>(), instance)
    }

    /// Register a pre-built instance under an explicit bean name.
    pub fn register_instance_named<T: Send + Sync + 'static>(
        &self,
        name: &str,
        instance: T,
    ) -> CoreResult<()> {
        let definition = BeanDefinition {
            name: name.to_string(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            dependencies: Vec::new(),
            constructor: None,
        };

        self.definitions
            .write()
            .map_err(|_| lock_error("definitions"))?
            .insert(name.to_string(), definition);
        self.type_index
            .write()
            .map_err(|_| lock_error("type_index"))?
            .insert(TypeId::of::<T>(), name.to_string());
        self.singletons
            .write()
            .map_err(|_| lock_error("singletons"))?
            .insert(name.to_string(), Arc::new(instance));

        debug!(bean = %name, "registered bean instance");
        Ok(())
    }

    /// Register an explicit capability alias: lookups under `tag` resolve
    /// to the bean registered under `bean`.
    pub fn alias(&self, tag: &str, bean: &str) -> CoreResult<()> {
        self.aliases
            .write()
            .map_err(|_| lock_error("aliases"))?
            .insert(tag.to_string(), bean.to_string());
        Ok(())
    }

    /// Imperative typed lookup. Fails hard when no bean is registered
    /// under the type's capability tag.
    pub fn get_bean<T: Send + Sync + 'static>(&self) -> CoreResult<Arc<T>> {
        let name = self
            .type_index
            .read()
            .map_err(|_| lock_error("type_index"))?
            .get(&TypeId::of::<T>())
            .cloned()
            .ok_or_else(|| CoreError::BeanNotFound {
                bean: std::any::type_name::<T>().to_string(),
            })?;
        let instance = self.get_bean_named(&name)?;
        instance.downcast::<T>().map_err(|_| {
            CoreError::configuration(format!(
                "bean '{}' is not of type {}",
                name,
                std::any::type_name::<T>()
            ))
        })
    }

    /// Imperative named lookup. Constructs and caches the singleton on
    /// first access; subsequent calls return the identical instance.
    pub fn get_bean_named(&self, name: &str) -> CoreResult<Arc<dyn Any + Send + Sync>> {
        let resolved = self.resolve_alias(name)?;

        if let Some(existing) = self
            .singletons
            .read()
            .map_err(|_| lock_error("singletons"))?
            .get(&resolved)
            .cloned()
        {
            return Ok(existing);
        }

        let constructor = {
            let definitions = self
                .definitions
                .read()
                .map_err(|_| lock_error("definitions"))?;
            definitions
                .get(&resolved)
                .and_then(|definition| definition.constructor.clone())
                .ok_or_else(|| CoreError::BeanNotFound {
                    bean: name.to_string(),
                })?
        };

        // Guard against construct() resolving back into itself.
        {
            let mut constructing = self
                .constructing
                .lock()
                .map_err(|_| lock_error("constructing"))?;
            if !constructing.insert(resolved.clone()) {
                return Err(CoreError::CircularDependency { bean: resolved });
            }
        }

        debug!(bean = %resolved, "constructing bean");
        let injector = Injector::new(self);
        let instance = constructor(&injector);

        if let Ok(mut constructing) = self.constructing.lock() {
            constructing.remove(&resolved);
        }

        let mut singletons = self
            .singletons
            .write()
            .map_err(|_| lock_error("singletons"))?;
        let cached = singletons
            .entry(resolved)
            .or_insert(instance)
            .clone();
        Ok(cached)
    }

    /// Best-effort typed lookup: `None` instead of an error.
    pub fn try_get_bean<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let name = self
            .type_index
            .read()
            .ok()?
            .get(&TypeId::of::<T>())
            .cloned()?;
        self.try_get_bean_named::<T>(&name)
    }

    /// Best-effort named lookup: `None` instead of an error.
    pub fn try_get_bean_named<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.get_bean_named(name).ok()?.downcast::<T>().ok()
    }

    pub(crate) fn opt_bean<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.try_get_bean::<T>()
    }

    pub(crate) fn opt_bean_named<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.try_get_bean_named::<T>(name)
    }

    /// Bind the process's data-access resource handle. Dependencies whose
    /// declared type matches it are served from this slot, bypassing the
    /// bean maps.
    pub fn bind_data_source<T: Send + Sync + 'static>(&self, source: T) -> CoreResult<()> {
        *self
            .data_source
            .write()
            .map_err(|_| lock_error("data_source"))? = Some((TypeId::of::<T>(), Arc::new(source)));
        Ok(())
    }

    /// The bound data-access resource, if any, when its type matches.
    pub fn data_source<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let slot = self.data_source.read().ok()?;
        let (type_id, source) = slot.as_ref()?;
        if *type_id != TypeId::of::<T>() {
            return None;
        }
        source.clone().downcast::<T>().ok()
    }

    /// Set a single configuration entry.
    pub fn set_config(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut config) = self.config.write() {
            config.insert(key.into(), value.into());
        }
    }

    /// Overlay a loaded configuration map onto the store.
    pub fn apply_config(&self, map: &ConfigMap) {
        if let Ok(mut config) = self.config.write() {
            for (key, value) in map.entries() {
                config.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Look up a configuration value by flat key.
    pub fn config_value(&self, key: &str) -> Option<String> {
        self.config.read().ok()?.get(key).cloned()
    }

    /// Walk every declared dependency list and report the ones that would
    /// not resolve today. Purely diagnostic: best-effort construction
    /// semantics are unchanged.
    pub fn validate(&self) -> Vec<String> {
        let mut unresolved = Vec::new();
        let definitions = match self.definitions.read() {
            Ok(definitions) => definitions,
            Err(_) => return unresolved,
        };
        for definition in definitions.values() {
            for dependency in &definition.dependencies {
                if !self.dependency_resolvable(&definitions, dependency) {
                    let message =
                        format!("bean '{}' depends on unresolved {}", definition.name, dependency);
                    warn!("{}", message);
                    unresolved.push(message);
                }
            }
        }
        unresolved
    }

    fn dependency_resolvable(
        &self,
        definitions: &HashMap<String, BeanDefinition>,
        dependency: &DependencyKey,
    ) -> bool {
        match dependency {
            DependencyKey::Type(type_id, _) => {
                let in_index = self
                    .type_index
                    .read()
                    .map(|index| index.contains_key(type_id))
                    .unwrap_or(false);
                let is_source = self
                    .data_source
                    .read()
                    .ok()
                    .and_then(|slot| slot.as_ref().map(|(id, _)| *id == *type_id))
                    .unwrap_or(false);
                in_index || is_source
            }
            DependencyKey::Named(name) => {
                definitions.contains_key(name)
                    || self
                        .aliases
                        .read()
                        .map(|aliases| aliases.contains_key(name))
                        .unwrap_or(false)
            }
            DependencyKey::DataSource => self
                .data_source
                .read()
                .map(|slot| slot.is_some())
                .unwrap_or(false),
            DependencyKey::Config(key) => self
                .config
                .read()
                .map(|config| config.contains_key(key))
                .unwrap_or(false),
        }
    }

    /// Whether a bean is registered under the given name.
    pub fn contains_bean(&self, name: &str) -> bool {
        self.definitions
            .read()
            .map(|definitions| definitions.contains_key(name))
            .unwrap_or(false)
    }

    /// Number of registered bean definitions.
    pub fn bean_count(&self) -> usize {
        self.definitions
            .read()
            .map(|definitions| definitions.len())
            .unwrap_or(0)
    }

    /// Reset definitions, singletons, and configuration, for test
    /// isolation. The bound data source is left in place.
    pub fn clear(&self) {
        if let Ok(mut definitions) = self.definitions.write() {
            definitions.clear();
        }
        if let Ok(mut type_index) = self.type_index.write() {
            type_index.clear();
        }
        if let Ok(mut aliases) = self.aliases.write() {
            aliases.clear();
        }
        if let Ok(mut singletons) = self.singletons.write() {
            singletons.clear();
        }
        if let Ok(mut config) = self.config.write() {
            config.clear();
        }
    }

    /// An injector view over this container, for resolving outside of
    /// bean construction.
    pub fn injector(&self) -> Injector<'_> {
        Injector::new(self)
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("beans", &self.bean_count())
            .field(
                "singletons",
                &self
                    .singletons
                    .read()
                    .map(|singletons| singletons.len())
                    .unwrap_or(0),
            )
            .finish()
    }
}

impl ServiceContainer {
    fn resolve_alias(&self, name: &str) -> CoreResult<String> {
        let definitions = self
            .definitions
            .read()
            .map_err(|_| lock_error("definitions"))?;
        if definitions.contains_key(name) {
            return Ok(name.to_string());
        }
        drop(definitions);
        let aliases = self.aliases.read().map_err(|_| lock_error("aliases"))?;
        Ok(aliases.get(name).cloned().unwrap_or_else(|| name.to_string()))
    }
}
