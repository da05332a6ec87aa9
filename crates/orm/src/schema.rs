//! DDL generation from entity metadata.
//!
//! Renders `CREATE TABLE` statements from the metadata registry's read
//! operations: one table per entity, one column per column descriptor,
//! one implied foreign-key column per owning to-one link, and one bridge
//! table per many-to-many link. SQLite-flavored; dialect portability is
//! out of scope.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{OrmError, OrmResult};
use crate::metadata::{
    ColumnDescriptor, ColumnType, EntityDescriptor, GenerationStrategy, IdentifierDescriptor,
    MetadataRegistry,
};

pub struct SchemaGenerator<'a> {
    metadata: &'a MetadataRegistry,
}

impl<'a> SchemaGenerator<'a> {
    pub fn new(metadata: &'a MetadataRegistry) -> Self {
        Self { metadata }
    }

    /// `CREATE TABLE` statement for one entity.
    pub fn create_table_sql(&self, entity: &str) -> OrmResult<String> {
        let descriptor = self.descriptor(entity)?;
        let mut definitions = Vec::new();

        for column in &descriptor.columns {
            definitions.push(column_sql(column, descriptor.identifier.as_ref()));
        }

        // Foreign-key columns implied by owning to-one links that were not
        // declared as columns themselves.
        for (property, link) in &descriptor.many_to_one {
            let fk = link
                .join_column
                .clone()
                .unwrap_or_else(|| format!("{}_id", property));
            if descriptor.column_by_name(&fk).is_none() {
                definitions.push(format!("{} INTEGER", fk));
            }
        }
        for (property, link) in &descriptor.one_to_one {
            if !link.is_owning() {
                continue;
            }
            let fk = link
                .join_column
                .clone()
                .unwrap_or_else(|| format!("{}_id", property));
            if descriptor.column_by_name(&fk).is_none() {
                definitions.push(format!("{} INTEGER", fk));
            }
        }

        Ok(format!(
            "CREATE TABLE {} ({})",
            descriptor.table,
            definitions.join(", ")
        ))
    }

    /// Bridge-table statements for every many-to-many link on an entity.
    pub fn join_table_sql(&self, entity: &str) -> OrmResult<Vec<String>> {
        let descriptor = self.descriptor(entity)?;
        let owner_name = descriptor.entity.to_lowercase();
        let mut statements = Vec::new();

        for (property, link) in &descriptor.many_to_many {
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
                .unwrap_or_else(|| format!("{}_id", link.target.to_lowercase()));

            let owning_type = identifier_type(&descriptor);
            let inverse_type = self
                .metadata
                .descriptor(&link.target)
                .map(|t| identifier_type(&t))
                .unwrap_or_else(|| "INTEGER".to_string());

            statements.push(format!(
                "CREATE TABLE {} ({} {} NOT NULL, {} {} NOT NULL, PRIMARY KEY ({}, {}))",
                bridge,
                owning_column,
                owning_type,
                inverse_column,
                inverse_type,
                owning_column,
                inverse_column,
            ));
        }
        Ok(statements)
    }

    /// Every table statement for the registry's entities, bridge tables
    /// deduplicated across owning sides.
    pub fn create_all_sql(&self) -> OrmResult<Vec<String>> {
        let mut names = self.metadata.entity_names();
        names.sort();

        let mut statements = Vec::new();
        for entity in &names {
            statements.push(self.create_table_sql(entity)?);
        }

        let mut seen_bridges = HashSet::new();
        for entity in &names {
            for statement in self.join_table_sql(entity)? {
                let bridge = statement
                    .split_whitespace()
                    .nth(2)
                    .unwrap_or_default()
                    .to_string();
                if seen_bridges.insert(bridge) {
                    statements.push(statement);
                }
            }
        }
        Ok(statements)
    }

    fn descriptor(&self, entity: &str) -> OrmResult<EntityDescriptor> {
        self.metadata.descriptor(entity).ok_or_else(|| {
            OrmError::Configuration(format!("'{}' is not a registered entity", entity))
        })
    }
}

fn column_sql(column: &ColumnDescriptor, identifier: Option<&IdentifierDescriptor>) -> String {
    if let Some(identifier) = identifier {
        if identifier.property == column.property {
            return match identifier.strategy {
                GenerationStrategy::Auto
                | GenerationStrategy::Identity
                | GenerationStrategy::Sequence => {
                    format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", column.name)
                }
                GenerationStrategy::Uuid => {
                    format!("{} {} PRIMARY KEY", column.name, type_sql(column))
                }
            };
        }
    }

    let mut sql = format!("{} {}", column.name, type_sql(column));
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        sql.push_str(&format!(" DEFAULT {}", literal(default)));
    }
    sql
}

fn type_sql(column: &ColumnDescriptor) -> String {
    match column.column_type {
        ColumnType::Integer => "INTEGER".to_string(),
        ColumnType::BigInt => "BIGINT".to_string(),
        ColumnType::Real => match (column.precision, column.scale) {
            (Some(precision), Some(scale)) => format!("DECIMAL({}, {})", precision, scale),
            _ => "REAL".to_string(),
        },
        ColumnType::Boolean => "BOOLEAN".to_string(),
        ColumnType::Varchar => format!("VARCHAR({})", column.length.unwrap_or(255)),
        ColumnType::Text => "TEXT".to_string(),
        ColumnType::Uuid => "VARCHAR(36)".to_string(),
        ColumnType::Timestamp => "TIMESTAMP".to_string(),
        ColumnType::Json => "TEXT".to_string(),
        ColumnType::Blob => "BLOB".to_string(),
    }
}

/// Bridge-column type matching an entity's identifier column.
fn identifier_type(descriptor: &EntityDescriptor) -> String {
    descriptor
        .identifier_column()
        .map(type_sql)
        .unwrap_or_else(|| "INTEGER".to_string())
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}
