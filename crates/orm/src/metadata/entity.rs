//! Entity descriptors: the full persistable shape of one declared class.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::metadata::column::ColumnDescriptor;
use crate::relationships::{ManyToManyLink, OneToManyLink, OneToOneLink, Relationship, ToOneLink};

/// Policy governing how identifier values are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationStrategy {
    /// Database-generated key, written back onto the instance after insert
    Auto,
    Identity,
    Sequence,
    /// Client-generated v4 UUID
    Uuid,
}

/// The designated primary-key property of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierDescriptor {
    pub property: String,
    pub strategy: GenerationStrategy,
}

/// Describes one persistable entity: logical name, physical table, columns
/// in declaration order, identifier, and the four relationship maps.
///
/// Descriptors merge additively and idempotently at the property level:
/// re-declaring a property's column replaces that descriptor only, leaving
/// siblings untouched, and declarations may arrive in any order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Logical entity name
    pub entity: String,
    /// Physical table name, defaults to the lower-cased entity name
    pub table: String,
    /// Identifier property, at most one per entity
    pub identifier: Option<IdentifierDescriptor>,
    /// Columns in declaration order
    pub columns: Vec<ColumnDescriptor>,
    pub many_to_one: HashMap<String, ToOneLink>,
    pub one_to_one: HashMap<String, OneToOneLink>,
    pub one_to_many: HashMap<String, OneToManyLink>,
    pub many_to_many: HashMap<String, ManyToManyLink>,
}

impl EntityDescriptor {
    pub fn new(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self {
            table: entity.to_lowercase(),
            entity,
            identifier: None,
            columns: Vec::new(),
            many_to_one: HashMap::new(),
            one_to_one: HashMap::new(),
            one_to_many: HashMap::new(),
            many_to_many: HashMap::new(),
        }
    }

    /// Override the physical table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Mark the identifier property.
    ///
    /// If the property has no column declared yet, a column of the
    /// strategy's natural type is added; an existing column declaration is
    /// left as-is, so identifier and column marking may happen in either
    /// order.
    pub fn with_identifier(mut self, property: impl Into<String>, strategy: GenerationStrategy) -> Self {
        let property = property.into();
        if self.column(&property).is_none() {
            let column_type = match strategy {
                GenerationStrategy::Uuid => crate::metadata::ColumnType::Uuid,
                _ => crate::metadata::ColumnType::Integer,
            };
            self = self.with_column(ColumnDescriptor::new(property.clone()).with_type(column_type));
        }
        self.identifier = Some(IdentifierDescriptor { property, strategy });
        self
    }

    /// Declare or re-declare a column. A column for the same property is
    /// replaced in place, preserving declaration order; a new property is
    /// appended.
    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        match self.columns.iter_mut().find(|c| c.property == column.property) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        self
    }

    pub fn with_many_to_one(mut self, property: impl Into<String>, link: ToOneLink) -> Self {
        self.many_to_one.insert(property.into(), link);
        self
    }

    pub fn with_one_to_one(mut self, property: impl Into<String>, link: OneToOneLink) -> Self {
        self.one_to_one.insert(property.into(), link);
        self
    }

    pub fn with_one_to_many(mut self, property: impl Into<String>, link: OneToManyLink) -> Self {
        self.one_to_many.insert(property.into(), link);
        self
    }

    pub fn with_many_to_many(mut self, property: impl Into<String>, link: ManyToManyLink) -> Self {
        self.many_to_many.insert(property.into(), link);
        self
    }

    /// The column declared for a property, if any.
    pub fn column(&self, property: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.property == property)
    }

    /// The column with a given physical name, if any.
    pub fn column_by_name(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The column backing the identifier property.
    pub fn identifier_column(&self) -> Option<&ColumnDescriptor> {
        self.identifier
            .as_ref()
            .and_then(|id| self.column(&id.property))
    }

    /// Physical column name of the identifier, falling back to the
    /// property name when no column is declared for it.
    pub fn identifier_column_name(&self) -> Option<String> {
        self.identifier.as_ref().map(|id| {
            self.column(&id.property)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| id.property.clone())
        })
    }

    /// All declared relationships, tagged with their kind.
    pub fn relationships(&self) -> Vec<(String, Relationship)> {
        let mut all = Vec::new();
        for (property, link) in &self.many_to_one {
            all.push((property.clone(), Relationship::ManyToOne(link.clone())));
        }
        for (property, link) in &self.one_to_one {
            all.push((property.clone(), Relationship::OneToOne(link.clone())));
        }
        for (property, link) in &self.one_to_many {
            all.push((property.clone(), Relationship::OneToMany(link.clone())));
        }
        for (property, link) in &self.many_to_many {
            all.push((property.clone(), Relationship::ManyToMany(link.clone())));
        }
        all
    }

    /// Merge another declaration for the same entity into this one.
    ///
    /// Column and relationship maps merge per property (the incoming
    /// declaration wins for a re-declared property); an explicitly set
    /// table name or identifier wins over the existing one.
    pub fn merge(&mut self, other: EntityDescriptor) {
        if other.table != other.entity.to_lowercase() {
            self.table = other.table;
        }
        if other.identifier.is_some() {
            self.identifier = other.identifier;
        }
        for column in other.columns {
            match self.columns.iter_mut().find(|c| c.property == column.property) {
                Some(existing) => *existing = column,
                None => self.columns.push(column),
            }
        }
        self.many_to_one.extend(other.many_to_one);
        self.one_to_one.extend(other.one_to_one);
        self.one_to_many.extend(other.one_to_many);
        self.many_to_many.extend(other.many_to_many);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ColumnType;

    #[test]
    fn table_defaults_to_lowercased_entity() {
        let descriptor = EntityDescriptor::new("UserAccount");
        assert_eq!(descriptor.table, "useraccount");

        let explicit = EntityDescriptor::new("UserAccount").with_table("accounts");
        assert_eq!(explicit.table, "accounts");
    }

    #[test]
    fn identifier_marking_order_is_irrelevant() {
        let id_first = EntityDescriptor::new("Item")
            .with_identifier("id", GenerationStrategy::Auto)
            .with_column(ColumnDescriptor::new("id").with_type(ColumnType::BigInt));
        let column_first = EntityDescriptor::new("Item")
            .with_column(ColumnDescriptor::new("id").with_type(ColumnType::BigInt))
            .with_identifier("id", GenerationStrategy::Auto);

        assert_eq!(id_first.identifier, column_first.identifier);
        assert_eq!(
            column_first.column("id").unwrap().column_type,
            ColumnType::BigInt
        );
    }

    #[test]
    fn redeclaring_a_column_replaces_only_that_property() {
        let descriptor = EntityDescriptor::new("Item")
            .with_column(ColumnDescriptor::new("name").with_length(64))
            .with_column(ColumnDescriptor::new("price").with_type(ColumnType::Real))
            .with_column(ColumnDescriptor::new("name").with_length(255));

        assert_eq!(descriptor.columns.len(), 2);
        assert_eq!(descriptor.columns[0].property, "name");
        assert_eq!(descriptor.columns[0].length, Some(255));
        assert_eq!(descriptor.columns[1].property, "price");
    }

    #[test]
    fn merge_is_additive_per_property() {
        let mut base = EntityDescriptor::new("Item")
            .with_column(ColumnDescriptor::new("name").with_length(64));
        let addition = EntityDescriptor::new("Item")
            .with_identifier("id", GenerationStrategy::Auto)
            .with_column(ColumnDescriptor::new("name").with_length(128));

        base.merge(addition);
        assert!(base.identifier.is_some());
        assert_eq!(base.column("name").unwrap().length, Some(128));
        assert!(base.column("id").is_some());
    }
}
