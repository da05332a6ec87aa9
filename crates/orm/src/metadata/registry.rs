//! The metadata registry: the process's single source of entity metadata.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::metadata::column::ColumnDescriptor;
use crate::metadata::entity::{EntityDescriptor, GenerationStrategy, IdentifierDescriptor};
use crate::relationships::{Relationship, RelationshipKind};

/// Keyed store mapping entity name -> [`EntityDescriptor`], populated by
/// explicit registration calls at startup.
///
/// An explicit context object rather than a global: construct one, wrap it
/// in an `Arc`, and hand it to the components that read it. Registration
/// is additive and idempotent at the property level, and declarations may
/// arrive in any order; consumers always perform a full descriptor read
/// before acting, never a partial one.
///
/// Read operations return absent/empty results for unknown entities. The
/// distinction between "not an entity" (a hard configuration error) and
/// "no metadata of this kind" (valid) is drawn by the caller.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entities: RwLock<HashMap<String, EntityDescriptor>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, merging per property into any existing
    /// declaration for the same entity.
    pub fn register(&self, descriptor: EntityDescriptor) {
        let mut entities = self
            .entities
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        debug!(entity = %descriptor.entity, "registering entity metadata");
        match entities.get_mut(&descriptor.entity) {
            Some(existing) => existing.merge(descriptor),
            None => {
                entities.insert(descriptor.entity.clone(), descriptor);
            }
        }
    }

    /// Declare a single column, creating a skeleton descriptor when the
    /// entity is not yet known.
    pub fn register_column(&self, entity: &str, column: ColumnDescriptor) {
        self.register(EntityDescriptor::new(entity).with_column(column));
    }

    /// Mark an entity's identifier property.
    pub fn register_identifier(&self, entity: &str, property: &str, strategy: GenerationStrategy) {
        self.register(EntityDescriptor::new(entity).with_identifier(property, strategy));
    }

    /// Declare a single relationship.
    pub fn register_relationship(&self, entity: &str, property: &str, relationship: Relationship) {
        let skeleton = EntityDescriptor::new(entity);
        let skeleton = match relationship {
            Relationship::ManyToOne(link) => skeleton.with_many_to_one(property, link),
            Relationship::OneToOne(link) => skeleton.with_one_to_one(property, link),
            Relationship::OneToMany(link) => skeleton.with_one_to_many(property, link),
            Relationship::ManyToMany(link) => skeleton.with_many_to_many(property, link),
        };
        self.register(skeleton);
    }

    /// Full descriptor read for an entity; `None` when the class was never
    /// declared as an entity.
    pub fn descriptor(&self, entity: &str) -> Option<EntityDescriptor> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity)
            .cloned()
    }

    /// Columns of an entity in declaration order; empty for unknown
    /// entities.
    pub fn columns(&self, entity: &str) -> Vec<ColumnDescriptor> {
        self.descriptor(entity)
            .map(|d| d.columns)
            .unwrap_or_default()
    }

    /// Identifier of an entity, if one is declared.
    pub fn identifier(&self, entity: &str) -> Option<IdentifierDescriptor> {
        self.descriptor(entity).and_then(|d| d.identifier)
    }

    /// Relationships of one kind; empty both for unknown entities and for
    /// entities without relationships of that kind.
    pub fn relationships(&self, entity: &str, kind: RelationshipKind) -> Vec<(String, Relationship)> {
        self.descriptor(entity)
            .map(|d| {
                d.relationships()
                    .into_iter()
                    .filter(|(_, r)| r.kind() == kind)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_entity(&self, entity: &str) -> bool {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(entity)
    }

    pub fn entity_names(&self) -> Vec<String> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
