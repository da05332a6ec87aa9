//! Relationship descriptors and resolution.

pub mod resolver;
pub mod types;

pub use resolver::RelationshipResolver;
pub use types::{
    CascadeOp, Fetch, ManyToManyLink, OneToManyLink, OneToOneLink, Relationship,
    RelationshipKind, ToOneLink,
};
