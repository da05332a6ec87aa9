//! Container wiring for the ORM.

use std::sync::Arc;

use lariat_core::{CoreResult, ServiceContainer};

use crate::backends::DatabaseHandle;
use crate::manager::EntityManager;
use crate::metadata::MetadataRegistry;

/// Wire the ORM into a service container.
///
/// The database handle is bound as the container's data source, so any
/// bean declaring a [`DatabaseHandle`] dependency receives it from
/// container state rather than a bean lookup, and the entity manager is
/// registered as a pre-built singleton bean for repository-style beans to
/// resolve.
pub fn install(
    container: &ServiceContainer,
    db: DatabaseHandle,
    metadata: Arc<MetadataRegistry>,
) -> CoreResult<()> {
    container.bind_data_source::<DatabaseHandle>(db.clone())?;
    container.register_instance(EntityManager::new(db, metadata))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDatabase;
    use lariat_core::{DependencyKey, Injectable, Injector};

    struct ItemRepository {
        manager: Option<Arc<EntityManager>>,
        db: Option<Arc<DatabaseHandle>>,
    }

    impl Injectable for ItemRepository {
        fn dependencies() -> Vec<DependencyKey> {
            vec![
                DependencyKey::of::<EntityManager>(),
                DependencyKey::DataSource,
            ]
        }

        fn construct(injector: &Injector<'_>) -> Self {
            ItemRepository {
                manager: injector.resolve::<EntityManager>(),
                db: injector.resolve::<DatabaseHandle>(),
            }
        }
    }

    #[test]
    fn install_exposes_manager_bean_and_data_source() {
        let container = ServiceContainer::new();
        let db: DatabaseHandle = Arc::new(MockDatabase::new());
        let metadata = Arc::new(MetadataRegistry::new());

        install(&container, db, metadata).unwrap();
        container.register::<ItemRepository>().unwrap();

        let repository = container.get_bean::<ItemRepository>().unwrap();
        assert!(repository.manager.is_some());
        assert!(repository.db.is_some());
        assert!(container.validate().is_empty());
    }
}
