//! Relationship resolution: one join strategy per relationship kind.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::backends::DatabaseHandle;
use crate::error::{OrmError, OrmResult};
use crate::hydration::{hydrate, hydrate_all};
use crate::instance::{truthy, Instance};
use crate::metadata::{EntityDescriptor, MetadataRegistry};
use crate::relationships::types::{ManyToManyLink, OneToManyLink, OneToOneLink, ToOneLink};

/// Materializes related instances for a declared relationship on an owner
/// instance. Stateless apart from its handles; construct freely.
pub struct RelationshipResolver {
    db: DatabaseHandle,
    metadata: Arc<MetadataRegistry>,
}

impl RelationshipResolver {
    pub fn new(db: DatabaseHandle, metadata: Arc<MetadataRegistry>) -> Self {
        Self { db, metadata }
    }

    /// Resolve a many-to-one association.
    ///
    /// Reads the owner's foreign-key property (the explicit join column,
    /// or `<property>_id` by convention) and looks up the single target
    /// row it references. An absent foreign-key value is a valid optional
    /// association: the result is `None` and no query is issued.
    pub async fn many_to_one(
        &self,
        owner: &Instance,
        property: &str,
        link: &ToOneLink,
        target: &EntityDescriptor,
    ) -> OrmResult<Option<Instance>> {
        self.to_one_lookup(
            owner,
            property,
            link.join_column.as_deref(),
            &link.referenced_column,
            target,
        )
        .await
    }

    /// Resolve a one-to-one association.
    ///
    /// The owning side (no `mapped_by`) behaves exactly like many-to-one.
    /// The inverse side reuses the one-to-many path and takes the first
    /// row; multiple matches violate the 1:1 shape and are tolerated with
    /// a warning rather than rejected.
    pub async fn one_to_one(
        &self,
        owner_descriptor: &EntityDescriptor,
        owner: &Instance,
        property: &str,
        link: &OneToOneLink,
        target: &EntityDescriptor,
    ) -> OrmResult<Option<Instance>> {
        match &link.mapped_by {
            None => {
                self.to_one_lookup(
                    owner,
                    property,
                    link.join_column.as_deref(),
                    &link.referenced_column,
                    target,
                )
                .await
            }
            Some(mapped_by) => {
                let inverse = OneToManyLink {
                    target: link.target.clone(),
                    mapped_by: Some(mapped_by.clone()),
                    fetch: link.fetch,
                    cascade: Vec::new(),
                };
                let mut matches = self
                    .one_to_many(owner_descriptor, owner, property, &inverse, target)
                    .await?;
                if matches.len() > 1 {
                    warn!(
                        entity = %owner_descriptor.entity,
                        property = %property,
                        matches = matches.len(),
                        "one-to-one inverse resolved multiple rows; taking the first"
                    );
                }
                Ok(if matches.is_empty() {
                    None
                } else {
                    Some(matches.remove(0))
                })
            }
        }
    }

    /// Resolve a one-to-many association.
    ///
    /// Requires `mapped_by`; the foreign-key column on the target is taken
    /// from the target's column metadata for that property, falling back
    /// to the `<owner entity>_id` convention. Resolving against an owner
    /// with no identifier value is a sequencing mistake (unpersisted
    /// instance), not an empty result.
    pub async fn one_to_many(
        &self,
        owner_descriptor: &EntityDescriptor,
        owner: &Instance,
        property: &str,
        link: &OneToManyLink,
        target: &EntityDescriptor,
    ) -> OrmResult<Vec<Instance>> {
        let mapped_by = link.mapped_by.as_deref().ok_or_else(|| {
            OrmError::Configuration(format!(
                "one-to-many '{}' on entity '{}' declares no mappedBy and cannot be resolved",
                property, owner_descriptor.entity
            ))
        })?;
        let owner_id = self.owner_identifier(owner_descriptor, owner)?;

        let fk_column = target
            .column(mapped_by)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("{}_id", owner_descriptor.entity.to_lowercase()));

        let sql = format!("SELECT * FROM {} WHERE {} = ?", target.table, fk_column);
        let rows = self.db.fetch_all(&sql, &[owner_id]).await?;
        Ok(hydrate_all(target, &rows))
    }

    /// Resolve a many-to-many association through its bridge table with a
    /// single joined query.
    pub async fn many_to_many(
        &self,
        owner_descriptor: &EntityDescriptor,
        owner: &Instance,
        property: &str,
        link: &ManyToManyLink,
        target: &EntityDescriptor,
    ) -> OrmResult<Vec<Instance>> {
        let owner_id = self.owner_identifier(owner_descriptor, owner)?;

        let owner_name = owner_descriptor.entity.to_lowercase();
        let bridge = link
            .join_table
            .clone()
            .unwrap_or_else(|| format!("{}_{}", owner_name, property));
        let owning_column = link
            .join_column
            .clone()
            .unwrap_or_else(|| format!("{}_id", owner_name));
        let inverse_column = link
            .inverse_join_column
            .clone()
            .unwrap_or_else(|| format!("{}_id", target.entity.to_lowercase()));
        let referenced = target
            .identifier_column_name()
            .unwrap_or_else(|| "id".to_string());

        let sql = format!(
            "SELECT {t}.* FROM {t} INNER JOIN {b} ON {b}.{inverse} = {t}.{referenced} WHERE {b}.{owning} = ?",
            t = target.table,
            b = bridge,
            inverse = inverse_column,
            referenced = referenced,
            owning = owning_column,
        );
        let rows = self.db.fetch_all(&sql, &[owner_id]).await?;
        Ok(hydrate_all(target, &rows))
    }

    /// Resolve the named relationship on an owner instance, whatever its
    /// kind, as a JSON value: an object or null for to-one kinds, an
    /// array for to-many kinds.
    pub async fn resolve(&self, entity: &str, owner: &Instance, property: &str) -> OrmResult<Value> {
        let descriptor = self.entity_descriptor(entity)?;

        if let Some(link) = descriptor.many_to_one.get(property) {
            let target = self.entity_descriptor(&link.target)?;
            let related = self.many_to_one(owner, property, link, &target).await?;
            return Ok(related.map(Value::Object).unwrap_or(Value::Null));
        }
        if let Some(link) = descriptor.one_to_one.get(property) {
            let target = self.entity_descriptor(&link.target)?;
            let related = self
                .one_to_one(&descriptor, owner, property, link, &target)
                .await?;
            return Ok(related.map(Value::Object).unwrap_or(Value::Null));
        }
        if let Some(link) = descriptor.one_to_many.get(property) {
            let target = self.entity_descriptor(&link.target)?;
            let related = self
                .one_to_many(&descriptor, owner, property, link, &target)
                .await?;
            return Ok(Value::Array(related.into_iter().map(Value::Object).collect()));
        }
        if let Some(link) = descriptor.many_to_many.get(property) {
            let target = self.entity_descriptor(&link.target)?;
            let related = self
                .many_to_many(&descriptor, owner, property, link, &target)
                .await?;
            return Ok(Value::Array(related.into_iter().map(Value::Object).collect()));
        }

        Err(OrmError::Relationship(format!(
            "no relationship '{}' declared on entity '{}'",
            property, entity
        )))
    }

    async fn to_one_lookup(
        &self,
        owner: &Instance,
        property: &str,
        join_column: Option<&str>,
        referenced_column: &str,
        target: &EntityDescriptor,
    ) -> OrmResult<Option<Instance>> {
        let fk_property = join_column
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_id", property));

        let fk_value = owner.get(&fk_property).cloned().unwrap_or(Value::Null);
        if fk_value.is_null() {
            return Ok(None);
        }

        let sql = format!(
            "SELECT * FROM {} WHERE {} = ? LIMIT 1",
            target.table, referenced_column
        );
        let rows = self.db.fetch_all(&sql, &[fk_value]).await?;
        Ok(rows.first().map(|row| hydrate(target, row)))
    }

    fn owner_identifier(
        &self,
        owner_descriptor: &EntityDescriptor,
        owner: &Instance,
    ) -> OrmResult<Value> {
        let identifier = owner_descriptor.identifier.as_ref().ok_or_else(|| {
            OrmError::Configuration(format!(
                "entity '{}' declares no identifier property",
                owner_descriptor.entity
            ))
        })?;
        let value = owner
            .get(&identifier.property)
            .cloned()
            .unwrap_or(Value::Null);
        if !truthy(&value) {
            return Err(OrmError::MissingIdentifier);
        }
        Ok(value)
    }

    fn entity_descriptor(&self, entity: &str) -> OrmResult<EntityDescriptor> {
        self.metadata.descriptor(entity).ok_or_else(|| {
            OrmError::Configuration(format!("'{}' is not a registered entity", entity))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnDescriptor, GenerationStrategy};
    use crate::testing::{row, MockDatabase};
    use serde_json::json;

    fn registry() -> Arc<MetadataRegistry> {
        let registry = MetadataRegistry::new();
        registry.register(
            EntityDescriptor::new("Owner")
                .with_identifier("id", GenerationStrategy::Auto)
                .with_column(ColumnDescriptor::new("name"))
                .with_one_to_many("items", OneToManyLink::to("Item").with_mapped_by("ownerId")),
        );
        registry.register(
            EntityDescriptor::new("Item")
                .with_identifier("id", GenerationStrategy::Auto)
                .with_column(ColumnDescriptor::new("ownerId").with_name("owner_id"))
                .with_column(ColumnDescriptor::new("name"))
                .with_many_to_one("owner", ToOneLink::to("Owner")),
        );
        Arc::new(registry)
    }

    fn resolver(db: &Arc<MockDatabase>) -> RelationshipResolver {
        RelationshipResolver::new(db.clone(), registry())
    }

    #[tokio::test]
    async fn many_to_one_uses_convention_foreign_key() {
        let db = Arc::new(MockDatabase::new());
        db.push_rows(vec![row(&[("id", json!(5)), ("name", json!("ada"))])]);
        let resolver = resolver(&db);
        let target = resolver.entity_descriptor("Owner").unwrap();

        let owner_instance = crate::instance::instance_from(json!({"owner_id": 5}));
        let related = resolver
            .many_to_one(&owner_instance, "owner", &ToOneLink::to("Owner"), &target)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(related.get("name"), Some(&json!("ada")));
        let statements = db.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].0, "SELECT * FROM owner WHERE id = ? LIMIT 1");
        assert_eq!(statements[0].1, vec![json!(5)]);
    }

    #[tokio::test]
    async fn explicit_join_column_overrides_convention() {
        let db = Arc::new(MockDatabase::new());
        db.push_rows(vec![row(&[("id", json!(9))])]);
        let resolver = resolver(&db);
        let target = resolver.entity_descriptor("Owner").unwrap();

        let link = ToOneLink::to("Owner").with_join_column("boss_ref");
        let instance = crate::instance::instance_from(json!({"boss_ref": 9, "owner_id": 1}));
        resolver
            .many_to_one(&instance, "owner", &link, &target)
            .await
            .unwrap();

        assert_eq!(db.statements()[0].1, vec![json!(9)]);
    }

    #[tokio::test]
    async fn absent_foreign_key_issues_no_query() {
        let db = Arc::new(MockDatabase::new());
        let resolver = resolver(&db);
        let target = resolver.entity_descriptor("Owner").unwrap();

        let instance = crate::instance::instance_from(json!({"owner_id": null}));
        let related = resolver
            .many_to_one(&instance, "owner", &ToOneLink::to("Owner"), &target)
            .await
            .unwrap();

        assert!(related.is_none());
        assert_eq!(db.statement_count(), 0);
    }

    #[tokio::test]
    async fn one_to_many_filters_on_mapped_by_column() {
        let db = Arc::new(MockDatabase::new());
        db.push_rows(vec![
            row(&[("id", json!(1)), ("owner_id", json!(3))]),
            row(&[("id", json!(2)), ("owner_id", json!(3))]),
        ]);
        let resolver = resolver(&db);
        let owner_descriptor = resolver.entity_descriptor("Owner").unwrap();
        let target = resolver.entity_descriptor("Item").unwrap();

        let owner = crate::instance::instance_from(json!({"id": 3}));
        let link = OneToManyLink::to("Item").with_mapped_by("ownerId");
        let items = resolver
            .one_to_many(&owner_descriptor, &owner, "items", &link, &target)
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        // The mappedBy property maps through Item's column metadata.
        assert_eq!(
            db.statements()[0].0,
            "SELECT * FROM item WHERE owner_id = ?"
        );
        assert_eq!(db.statements()[0].1, vec![json!(3)]);
        // Hydration renames the physical column back to the property.
        assert_eq!(items[0].get("ownerId"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn one_to_many_without_mapped_by_is_a_configuration_error() {
        let db = Arc::new(MockDatabase::new());
        let resolver = resolver(&db);
        let owner_descriptor = resolver.entity_descriptor("Owner").unwrap();
        let target = resolver.entity_descriptor("Item").unwrap();

        let owner = crate::instance::instance_from(json!({"id": 3}));
        let result = resolver
            .one_to_many(&owner_descriptor, &owner, "items", &OneToManyLink::to("Item"), &target)
            .await;

        assert!(matches!(result, Err(OrmError::Configuration(_))));
        assert_eq!(db.statement_count(), 0);
    }

    #[tokio::test]
    async fn one_to_many_on_unidentified_owner_fails_fast() {
        let db = Arc::new(MockDatabase::new());
        let resolver = resolver(&db);
        let owner_descriptor = resolver.entity_descriptor("Owner").unwrap();
        let target = resolver.entity_descriptor("Item").unwrap();

        let unpersisted = crate::instance::instance_from(json!({"name": "no id yet"}));
        let link = OneToManyLink::to("Item").with_mapped_by("ownerId");
        let result = resolver
            .one_to_many(&owner_descriptor, &unpersisted, "items", &link, &target)
            .await;

        assert!(matches!(result, Err(OrmError::MissingIdentifier)));
        assert_eq!(db.statement_count(), 0);
    }

    #[tokio::test]
    async fn many_to_many_joins_through_the_bridge() {
        let db = Arc::new(MockDatabase::new());
        db.push_rows(vec![
            row(&[("id", json!(10)), ("name", json!("admin"))]),
            row(&[("id", json!(11)), ("name", json!("editor"))]),
        ]);
        let registry = registry();
        registry.register(
            EntityDescriptor::new("Role")
                .with_identifier("id", GenerationStrategy::Auto)
                .with_column(ColumnDescriptor::new("name")),
        );
        let resolver = RelationshipResolver::new(db.clone(), registry);
        let owner_descriptor = resolver.entity_descriptor("Owner").unwrap();
        let target = resolver.entity_descriptor("Role").unwrap();

        let owner = crate::instance::instance_from(json!({"id": 3}));
        let link = ManyToManyLink::to("Role");
        let roles = resolver
            .many_to_many(&owner_descriptor, &owner, "roles", &link, &target)
            .await
            .unwrap();

        assert_eq!(roles.len(), 2);
        assert_eq!(
            db.statements()[0].0,
            "SELECT role.* FROM role INNER JOIN owner_roles ON owner_roles.role_id = role.id WHERE owner_roles.owner_id = ?"
        );
        assert_eq!(db.statements()[0].1, vec![json!(3)]);
    }

    #[tokio::test]
    async fn inverse_one_to_one_takes_the_first_of_multiple_rows() {
        let db = Arc::new(MockDatabase::new());
        db.push_rows(vec![
            row(&[("id", json!(21)), ("owner_id", json!(3))]),
            row(&[("id", json!(22)), ("owner_id", json!(3))]),
        ]);
        let resolver = resolver(&db);
        let owner_descriptor = resolver.entity_descriptor("Owner").unwrap();
        let target = resolver.entity_descriptor("Item").unwrap();

        let owner = crate::instance::instance_from(json!({"id": 3}));
        let link = OneToOneLink::to("Item").with_mapped_by("ownerId");
        let related = resolver
            .one_to_one(&owner_descriptor, &owner, "badge", &link, &target)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(related.get("id"), Some(&json!(21)));
    }
}
