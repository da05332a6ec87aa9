//! Row-to-instance mapping.

use std::collections::HashMap;

use crate::backends::Row;
use crate::instance::Instance;
use crate::metadata::EntityDescriptor;

/// Map one result row onto a fresh detached instance.
///
/// A reverse map from physical column name to property name is built from
/// the entity's column descriptors; columns outside the declared metadata
/// (computed columns from custom queries, for example) fall back to the
/// raw column name as the property name. No proxies are created; the
/// result is a plain value.
pub fn hydrate(descriptor: &EntityDescriptor, row: &Row) -> Instance {
    let reverse: HashMap<&str, &str> = descriptor
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.property.as_str()))
        .collect();

    let mut instance = Instance::new();
    for (column, value) in row {
        let property = reverse.get(column.as_str()).copied().unwrap_or(column.as_str());
        instance.insert(property.to_string(), value.clone());
    }
    instance
}

pub fn hydrate_all(descriptor: &EntityDescriptor, rows: &[Row]) -> Vec<Instance> {
    rows.iter().map(|row| hydrate(descriptor, row)).collect()
}
