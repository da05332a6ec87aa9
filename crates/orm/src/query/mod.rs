//! Query building.

pub mod builder;

pub use builder::{OrderDirection, QueryBuilder};
