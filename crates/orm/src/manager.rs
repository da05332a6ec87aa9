//! The entity manager: insert-or-update persistence, lookups, and eager
//! relationship population.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::backends::DatabaseHandle;
use crate::error::{OrmError, OrmResult};
use crate::hydration::{hydrate, hydrate_all};
use crate::instance::{truthy, Instance};
use crate::metadata::{EntityDescriptor, GenerationStrategy, IdentifierDescriptor, MetadataRegistry};
use crate::query::QueryBuilder;
use crate::relationships::{Fetch, RelationshipResolver};

/// Translates entity instances to and from rows and decides between
/// insert and update on persist.
///
/// Holds no per-instance state: every operation reads the full descriptor
/// from the metadata registry, runs its statements, and lets go of the
/// instances it touched.
pub struct EntityManager {
    db: DatabaseHandle,
    metadata: Arc<MetadataRegistry>,
}

impl EntityManager {
    pub fn new(db: DatabaseHandle, metadata: Arc<MetadataRegistry>) -> Self {
        Self { db, metadata }
    }

    pub fn metadata(&self) -> &Arc<MetadataRegistry> {
        &self.metadata
    }

    pub fn database(&self) -> &DatabaseHandle {
        &self.db
    }

    /// A relationship resolver sharing this manager's handles.
    pub fn resolver(&self) -> RelationshipResolver {
        RelationshipResolver::new(self.db.clone(), self.metadata.clone())
    }

    /// A query builder bound to the given entity.
    pub fn query(&self, entity: &str) -> OrmResult<QueryBuilder> {
        Ok(QueryBuilder::new(self.descriptor(entity)?, self.db.clone()))
    }

    /// Persist an instance: update when it carries a truthy identifier
    /// under a non-`Auto` strategy, insert otherwise.
    ///
    /// After an `Auto`-strategy insert the generated identifier is written
    /// back onto the passed instance. Only declared columns participate in
    /// the statement; relationship-only properties never do.
    pub async fn persist(&self, entity: &str, instance: &mut Instance) -> OrmResult<()> {
        let descriptor = self.descriptor(entity)?;
        let identifier = Self::identifier_of(&descriptor)?;

        let id_value = instance
            .get(&identifier.property)
            .cloned()
            .unwrap_or(Value::Null);
        if truthy(&id_value) && identifier.strategy != GenerationStrategy::Auto {
            self.update_row(&descriptor, &identifier, instance, id_value).await
        } else {
            self.insert_row(&descriptor, &identifier, instance).await
        }
    }

    /// Single-row lookup by identifier. `Ok(None)` when no row matches.
    pub async fn find(&self, entity: &str, id: Value) -> OrmResult<Option<Instance>> {
        let descriptor = self.descriptor(entity)?;
        let identifier = Self::identifier_of(&descriptor)?;
        let id_column = Self::identifier_column(&descriptor, &identifier);

        let sql = format!(
            "SELECT * FROM {} WHERE {} = ? LIMIT 1",
            descriptor.table, id_column
        );
        let rows = self.db.fetch_all(&sql, &[id]).await?;
        Ok(rows.first().map(|row| hydrate(&descriptor, row)))
    }

    /// Full-table scan, followed by eager population of every to-one
    /// relationship marked eager: one lookup per row per eager link.
    /// Lazy and to-many relationships are left for on-demand resolution.
    pub async fn find_all(&self, entity: &str) -> OrmResult<Vec<Instance>> {
        let descriptor = self.descriptor(entity)?;
        let sql = format!("SELECT * FROM {}", descriptor.table);
        let rows = self.db.fetch_all(&sql, &[]).await?;
        let mut instances = hydrate_all(&descriptor, &rows);

        let resolver = self.resolver();
        for instance in &mut instances {
            for (property, link) in &descriptor.many_to_one {
                if link.fetch != Fetch::Eager {
                    continue;
                }
                let target = self.descriptor(&link.target)?;
                let related = resolver.many_to_one(instance, property, link, &target).await?;
                instance.insert(
                    property.clone(),
                    related.map(Value::Object).unwrap_or(Value::Null),
                );
            }
            for (property, link) in &descriptor.one_to_one {
                if !link.is_owning() || link.fetch != Fetch::Eager {
                    continue;
                }
                let target = self.descriptor(&link.target)?;
                let related = resolver
                    .one_to_one(&descriptor, instance, property, link, &target)
                    .await?;
                instance.insert(
                    property.clone(),
                    related.map(Value::Object).unwrap_or(Value::Null),
                );
            }
        }
        Ok(instances)
    }

    /// Delete by identifier.
    pub async fn remove(&self, entity: &str, instance: &Instance) -> OrmResult<()> {
        let descriptor = self.descriptor(entity)?;
        let identifier = Self::identifier_of(&descriptor)?;

        let id_value = instance
            .get(&identifier.property)
            .cloned()
            .unwrap_or(Value::Null);
        if !truthy(&id_value) {
            return Err(OrmError::MissingIdentifier);
        }

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            descriptor.table,
            Self::identifier_column(&descriptor, &identifier)
        );
        self.db.execute(&sql, &[id_value]).await?;
        Ok(())
    }

    async fn insert_row(
        &self,
        descriptor: &EntityDescriptor,
        identifier: &IdentifierDescriptor,
        instance: &mut Instance,
    ) -> OrmResult<()> {
        if identifier.strategy == GenerationStrategy::Uuid {
            let current = instance
                .get(&identifier.property)
                .cloned()
                .unwrap_or(Value::Null);
            if !truthy(&current) {
                instance.insert(
                    identifier.property.clone(),
                    Value::String(uuid::Uuid::new_v4().to_string()),
                );
            }
        }

        let mut columns = Vec::new();
        let mut params = Vec::new();
        for column in &descriptor.columns {
            let value = match instance.get(&column.property) {
                Some(value) => value.clone(),
                None => continue,
            };
            if column.property == identifier.property && !truthy(&value) {
                continue;
            }
            columns.push(column.name.clone());
            params.push(value);
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", descriptor.table)
        } else {
            let placeholders = vec!["?"; columns.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                descriptor.table,
                columns.join(", "),
                placeholders
            )
        };

        debug!(entity = %descriptor.entity, "inserting row");
        let result = self.db.execute(&sql, &params).await?;

        if identifier.strategy == GenerationStrategy::Auto {
            let current = instance
                .get(&identifier.property)
                .cloned()
                .unwrap_or(Value::Null);
            if !truthy(&current) {
                if let Some(generated) = result.last_insert_id {
                    instance.insert(identifier.property.clone(), generated);
                }
            }
        }
        Ok(())
    }

    async fn update_row(
        &self,
        descriptor: &EntityDescriptor,
        identifier: &IdentifierDescriptor,
        instance: &Instance,
        id_value: Value,
    ) -> OrmResult<()> {
        let mut sets = Vec::new();
        let mut params = Vec::new();
        for column in &descriptor.columns {
            if column.property == identifier.property {
                continue;
            }
            sets.push(format!("{} = ?", column.name));
            params.push(instance.get(&column.property).cloned().unwrap_or(Value::Null));
        }
        if sets.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            descriptor.table,
            sets.join(", "),
            Self::identifier_column(descriptor, identifier)
        );
        params.push(id_value);

        debug!(entity = %descriptor.entity, "updating row");
        self.db.execute(&sql, &params).await?;
        Ok(())
    }

    fn descriptor(&self, entity: &str) -> OrmResult<EntityDescriptor> {
        self.metadata.descriptor(entity).ok_or_else(|| {
            OrmError::Configuration(format!("'{}' is not a registered entity", entity))
        })
    }

    fn identifier_of(descriptor: &EntityDescriptor) -> OrmResult<IdentifierDescriptor> {
        descriptor.identifier.clone().ok_or_else(|| {
            OrmError::Configuration(format!(
                "entity '{}' declares no identifier property",
                descriptor.entity
            ))
        })
    }

    fn identifier_column(
        descriptor: &EntityDescriptor,
        identifier: &IdentifierDescriptor,
    ) -> String {
        descriptor
            .column(&identifier.property)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| identifier.property.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::ExecResult;
    use crate::instance::instance_from;
    use crate::metadata::ColumnDescriptor;
    use crate::relationships::ToOneLink;
    use crate::testing::{row, MockDatabase};
    use serde_json::json;

    fn registry() -> Arc<MetadataRegistry> {
        let registry = MetadataRegistry::new();
        registry.register(
            EntityDescriptor::new("Item")
                .with_identifier("id", GenerationStrategy::Auto)
                .with_column(ColumnDescriptor::new("name"))
                .with_column(ColumnDescriptor::new("owner_id"))
                .with_many_to_one("owner", ToOneLink::to("Owner")),
        );
        registry.register(
            EntityDescriptor::new("Owner")
                .with_identifier("id", GenerationStrategy::Auto)
                .with_column(ColumnDescriptor::new("name")),
        );
        registry.register(
            EntityDescriptor::new("Badge")
                .with_identifier("serial", GenerationStrategy::Identity)
                .with_column(ColumnDescriptor::new("serial"))
                .with_column(ColumnDescriptor::new("label")),
        );
        registry.register(
            EntityDescriptor::new("Token")
                .with_identifier("id", GenerationStrategy::Uuid)
                .with_column(ColumnDescriptor::new("purpose")),
        );
        Arc::new(registry)
    }

    fn manager(db: &Arc<MockDatabase>) -> EntityManager {
        EntityManager::new(db.clone(), registry())
    }

    #[tokio::test]
    async fn falsy_identifier_inserts_and_backfills() {
        let db = Arc::new(MockDatabase::new());
        db.push_exec(ExecResult {
            rows_affected: 1,
            last_insert_id: Some(json!(42)),
        });
        let manager = manager(&db);

        let mut item = instance_from(json!({"name": "widget"}));
        manager.persist("Item", &mut item).await.unwrap();

        let statements = db.statements();
        assert_eq!(statements[0].0, "INSERT INTO item (name) VALUES (?)");
        assert_eq!(statements[0].1, vec![json!("widget")]);
        assert_eq!(item.get("id"), Some(&json!(42)));
    }

    #[tokio::test]
    async fn truthy_identifier_with_non_auto_strategy_updates() {
        let db = Arc::new(MockDatabase::new());
        db.push_exec(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        });
        let manager = manager(&db);

        let mut badge = instance_from(json!({"serial": 7, "label": "gold"}));
        manager.persist("Badge", &mut badge).await.unwrap();

        let statements = db.statements();
        // Full column-set SET excluding the identifier, keyed on it.
        assert_eq!(statements[0].0, "UPDATE badge SET label = ? WHERE serial = ?");
        assert_eq!(statements[0].1, vec![json!("gold"), json!(7)]);
    }

    #[tokio::test]
    async fn truthy_identifier_with_auto_strategy_still_inserts() {
        let db = Arc::new(MockDatabase::new());
        db.push_exec(ExecResult {
            rows_affected: 1,
            last_insert_id: Some(json!(3)),
        });
        let manager = manager(&db);

        let mut item = instance_from(json!({"id": 3, "name": "widget"}));
        manager.persist("Item", &mut item).await.unwrap();

        assert!(db.statements()[0].0.starts_with("INSERT INTO item"));
        assert_eq!(item.get("id"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn uuid_strategy_generates_a_client_side_key() {
        let db = Arc::new(MockDatabase::new());
        db.push_exec(ExecResult::default());
        let manager = manager(&db);

        let mut token = instance_from(json!({"purpose": "session"}));
        manager.persist("Token", &mut token).await.unwrap();

        let id = token.get("id").and_then(Value::as_str).unwrap();
        assert_eq!(id.len(), 36);
        let statements = db.statements();
        assert_eq!(statements[0].0, "INSERT INTO token (id, purpose) VALUES (?, ?)");
    }

    #[tokio::test]
    async fn unregistered_entity_is_a_configuration_error() {
        let db = Arc::new(MockDatabase::new());
        let manager = manager(&db);

        let mut ghost = instance_from(json!({"name": "x"}));
        let result = manager.persist("Ghost", &mut ghost).await;
        assert!(matches!(result, Err(OrmError::Configuration(_))));
        assert_eq!(db.statement_count(), 0);
    }

    #[tokio::test]
    async fn find_maps_the_single_row_or_returns_none() {
        let db = Arc::new(MockDatabase::new());
        db.push_rows(vec![row(&[("id", json!(1)), ("name", json!("widget"))])]);
        db.push_rows(vec![]);
        let manager = manager(&db);

        let found = manager.find("Item", json!(1)).await.unwrap().unwrap();
        assert_eq!(found.get("name"), Some(&json!("widget")));

        let missing = manager.find("Item", json!(999)).await.unwrap();
        assert!(missing.is_none());

        assert_eq!(
            db.statements()[0].0,
            "SELECT * FROM item WHERE id = ? LIMIT 1"
        );
    }

    #[tokio::test]
    async fn find_all_populates_eager_to_one_links_per_row() {
        let db = Arc::new(MockDatabase::new());
        // The scan, then one owner lookup per row.
        db.push_rows(vec![
            row(&[("id", json!(1)), ("name", json!("a")), ("owner_id", json!(5))]),
            row(&[("id", json!(2)), ("name", json!("b")), ("owner_id", json!(null))]),
        ]);
        db.push_rows(vec![row(&[("id", json!(5)), ("name", json!("ada"))])]);
        let manager = manager(&db);

        let items = manager.find_all("Item").await.unwrap();
        assert_eq!(items.len(), 2);

        let owner = items[0].get("owner").unwrap();
        assert_eq!(owner.get("name"), Some(&json!("ada")));
        // Null foreign key: populated as null, and no lookup was issued.
        assert_eq!(items[1].get("owner"), Some(&json!(null)));
        assert_eq!(db.statement_count(), 2);
    }

    #[tokio::test]
    async fn remove_requires_an_identifier_value() {
        let db = Arc::new(MockDatabase::new());
        let manager = manager(&db);

        let unsaved = instance_from(json!({"name": "widget"}));
        let result = manager.remove("Item", &unsaved).await;
        assert!(matches!(result, Err(OrmError::MissingIdentifier)));

        db.push_exec(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        });
        let saved = instance_from(json!({"id": 4, "name": "widget"}));
        manager.remove("Item", &saved).await.unwrap();
        assert_eq!(db.statements()[0].0, "DELETE FROM item WHERE id = ?");
        assert_eq!(db.statements()[0].1, vec![json!(4)]);
    }
}
