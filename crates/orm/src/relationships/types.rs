//! Relationship descriptors.
//!
//! A closed sum type over the four relationship kinds; each variant
//! carries exactly its own linkage fields. Explicitly declared names
//! always win over convention-derived ones, which are computed from the
//! lower-cased entity name plus `_id` / `_<property>` suffixes.

use serde::{Deserialize, Serialize};

/// Whether a relationship is populated automatically on load or only on
/// explicit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fetch {
    Eager,
    Lazy,
}

/// Cascade operations declared on a relationship. Stored as metadata for
/// schema and tooling consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CascadeOp {
    Persist,
    Remove,
}

/// The four relationship kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    ManyToOne,
    OneToMany,
    ManyToMany,
    OneToOne,
}

/// Owning to-one linkage: the owner's row holds the foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToOneLink {
    /// Target entity name
    pub target: String,
    /// Explicit foreign-key column on the owner; `<property>_id` when unset
    pub join_column: Option<String>,
    /// Referenced column on the target table
    pub referenced_column: String,
    pub fetch: Fetch,
    pub cascade: Vec<CascadeOp>,
}

impl ToOneLink {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            join_column: None,
            referenced_column: "id".to_string(),
            fetch: Fetch::Eager,
            cascade: Vec::new(),
        }
    }

    pub fn with_join_column(mut self, column: impl Into<String>) -> Self {
        self.join_column = Some(column.into());
        self
    }

    pub fn with_referenced_column(mut self, column: impl Into<String>) -> Self {
        self.referenced_column = column.into();
        self
    }

    pub fn lazy(mut self) -> Self {
        self.fetch = Fetch::Lazy;
        self
    }

    pub fn with_cascade(mut self, cascade: Vec<CascadeOp>) -> Self {
        self.cascade = cascade;
        self
    }
}

/// One-to-one linkage. The owning side declares (or defaults) a join
/// column; the inverse side points back through `mapped_by`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneToOneLink {
    pub target: String,
    /// Inverse-side property name on the target
    pub mapped_by: Option<String>,
    /// Owning-side foreign-key column; `<property>_id` when unset
    pub join_column: Option<String>,
    pub referenced_column: String,
    pub fetch: Fetch,
    pub cascade: Vec<CascadeOp>,
}

impl OneToOneLink {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            mapped_by: None,
            join_column: None,
            referenced_column: "id".to_string(),
            fetch: Fetch::Eager,
            cascade: Vec::new(),
        }
    }

    pub fn with_mapped_by(mut self, property: impl Into<String>) -> Self {
        self.mapped_by = Some(property.into());
        self
    }

    pub fn with_join_column(mut self, column: impl Into<String>) -> Self {
        self.join_column = Some(column.into());
        self
    }

    pub fn with_referenced_column(mut self, column: impl Into<String>) -> Self {
        self.referenced_column = column.into();
        self
    }

    pub fn lazy(mut self) -> Self {
        self.fetch = Fetch::Lazy;
        self
    }

    pub fn with_cascade(mut self, cascade: Vec<CascadeOp>) -> Self {
        self.cascade = cascade;
        self
    }

    /// The side holding the physical foreign key.
    pub fn is_owning(&self) -> bool {
        self.mapped_by.is_none()
    }
}

/// Inverse to-many linkage: the target's rows point back at the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneToManyLink {
    pub target: String,
    /// Owning-side property on the target; required for resolution
    pub mapped_by: Option<String>,
    pub fetch: Fetch,
    pub cascade: Vec<CascadeOp>,
}

impl OneToManyLink {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            mapped_by: None,
            fetch: Fetch::Lazy,
            cascade: Vec::new(),
        }
    }

    pub fn with_mapped_by(mut self, property: impl Into<String>) -> Self {
        self.mapped_by = Some(property.into());
        self
    }

    pub fn eager(mut self) -> Self {
        self.fetch = Fetch::Eager;
        self
    }

    pub fn with_cascade(mut self, cascade: Vec<CascadeOp>) -> Self {
        self.cascade = cascade;
        self
    }
}

/// Many-to-many linkage through a bridge table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManyToManyLink {
    pub target: String,
    /// Bridge table name; `<owner>_<property>` when unset
    pub join_table: Option<String>,
    /// Owning-side bridge column; `<owner>_id` when unset
    pub join_column: Option<String>,
    /// Inverse-side bridge column; `<target>_id` when unset
    pub inverse_join_column: Option<String>,
    pub fetch: Fetch,
    pub cascade: Vec<CascadeOp>,
}

impl ManyToManyLink {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            join_table: None,
            join_column: None,
            inverse_join_column: None,
            fetch: Fetch::Lazy,
            cascade: Vec::new(),
        }
    }

    pub fn with_join_table(mut self, table: impl Into<String>) -> Self {
        self.join_table = Some(table.into());
        self
    }

    pub fn with_join_column(mut self, column: impl Into<String>) -> Self {
        self.join_column = Some(column.into());
        self
    }

    pub fn with_inverse_join_column(mut self, column: impl Into<String>) -> Self {
        self.inverse_join_column = Some(column.into());
        self
    }

    pub fn eager(mut self) -> Self {
        self.fetch = Fetch::Eager;
        self
    }

    pub fn with_cascade(mut self, cascade: Vec<CascadeOp>) -> Self {
        self.cascade = cascade;
        self
    }
}

/// A declared relationship of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Relationship {
    ManyToOne(ToOneLink),
    OneToOne(OneToOneLink),
    OneToMany(OneToManyLink),
    ManyToMany(ManyToManyLink),
}

impl Relationship {
    pub fn kind(&self) -> RelationshipKind {
        match self {
            Relationship::ManyToOne(_) => RelationshipKind::ManyToOne,
            Relationship::OneToOne(_) => RelationshipKind::OneToOne,
            Relationship::OneToMany(_) => RelationshipKind::OneToMany,
            Relationship::ManyToMany(_) => RelationshipKind::ManyToMany,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Relationship::ManyToOne(link) => &link.target,
            Relationship::OneToOne(link) => &link.target,
            Relationship::OneToMany(link) => &link.target,
            Relationship::ManyToMany(link) => &link.target,
        }
    }

    pub fn fetch(&self) -> Fetch {
        match self {
            Relationship::ManyToOne(link) => link.fetch,
            Relationship::OneToOne(link) => link.fetch,
            Relationship::OneToMany(link) => link.fetch,
            Relationship::ManyToMany(link) => link.fetch,
        }
    }

    /// Whether resolution yields a collection rather than a single
    /// instance.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Relationship::OneToMany(_) | Relationship::ManyToMany(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_defaults_follow_cardinality() {
        assert_eq!(ToOneLink::to("User").fetch, Fetch::Eager);
        assert_eq!(OneToOneLink::to("Profile").fetch, Fetch::Eager);
        assert_eq!(OneToManyLink::to("Post").fetch, Fetch::Lazy);
        assert_eq!(ManyToManyLink::to("Role").fetch, Fetch::Lazy);
    }

    #[test]
    fn one_to_one_owning_side_detection() {
        assert!(OneToOneLink::to("Profile").is_owning());
        assert!(!OneToOneLink::to("Profile").with_mapped_by("user").is_owning());
    }

    #[test]
    fn collection_kinds() {
        assert!(Relationship::OneToMany(OneToManyLink::to("Post")).is_collection());
        assert!(Relationship::ManyToMany(ManyToManyLink::to("Role")).is_collection());
        assert!(!Relationship::ManyToOne(ToOneLink::to("User")).is_collection());
    }
}
