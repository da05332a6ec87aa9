pub mod backends;
pub mod error;
pub mod hydration;
pub mod instance;
pub mod manager;
pub mod metadata;
pub mod query;
pub mod relationships;
pub mod schema;
pub mod testing;
pub mod wiring;

// Re-export key types for convenience
pub use backends::{Database, DatabaseHandle, ExecResult, Row, SqliteDatabase};
pub use error::{OrmError, OrmResult};
pub use instance::{instance_from, truthy, Instance};
pub use manager::EntityManager;
pub use metadata::{
    ColumnDescriptor, ColumnType, EntityDescriptor, GenerationStrategy, IdentifierDescriptor,
    MetadataRegistry,
};
pub use query::{OrderDirection, QueryBuilder};
pub use relationships::{
    CascadeOp, Fetch, ManyToManyLink, OneToManyLink, OneToOneLink, Relationship,
    RelationshipKind, RelationshipResolver, ToOneLink,
};
pub use schema::SchemaGenerator;
