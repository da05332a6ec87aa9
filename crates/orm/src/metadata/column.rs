//! Column descriptors: the physical mapping of one entity property.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    BigInt,
    Real,
    Boolean,
    Varchar,
    Text,
    Uuid,
    Timestamp,
    Json,
    Blob,
}

/// Maps one entity property onto a physical column.
///
/// The physical `name` defaults to the property name; `nullable` defaults
/// to true unless explicitly cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Property name on the entity this column maps
    pub property: String,
    /// Physical column name
    pub name: String,
    /// Storage type
    pub column_type: ColumnType,
    /// Whether NULL values are accepted
    pub nullable: bool,
    /// Whether a UNIQUE constraint applies
    pub unique: bool,
    /// Length for character types
    pub length: Option<u32>,
    /// Precision for numeric types
    pub precision: Option<u32>,
    /// Scale for numeric types
    pub scale: Option<u32>,
    /// Default value rendered into DDL
    pub default: Option<Value>,
}

impl ColumnDescriptor {
    /// Create a descriptor for a property, physical name defaulting to the
    /// property name.
    pub fn new(property: impl Into<String>) -> Self {
        let property = property.into();
        Self {
            name: property.clone(),
            property,
            column_type: ColumnType::Varchar,
            nullable: true,
            unique: false,
            length: None,
            precision: None,
            scale: None,
            default: None,
        }
    }

    /// Override the physical column name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_defaults_to_property() {
        let column = ColumnDescriptor::new("createdAt");
        assert_eq!(column.property, "createdAt");
        assert_eq!(column.name, "createdAt");
        assert!(column.nullable);
        assert!(!column.unique);
    }

    #[test]
    fn builder_overrides() {
        let column = ColumnDescriptor::new("email")
            .with_name("email_address")
            .with_type(ColumnType::Varchar)
            .with_length(320)
            .not_null()
            .unique()
            .with_default(json!("nobody@example.com"));

        assert_eq!(column.name, "email_address");
        assert_eq!(column.length, Some(320));
        assert!(!column.nullable);
        assert!(column.unique);
        assert_eq!(column.default, Some(json!("nobody@example.com")));
    }
}
