//! Module: schema
//! Responsibility: externally-supplied entity shape and association metadata.
//! Does not own: filter classification or engine row access.
//! Boundary: the rewrite and relation passes consult shapes, never an ORM.

use std::collections::{BTreeMap, BTreeSet};

/// Default primary-key column for shapes and association targets.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

///
/// AssociationKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssociationKind {
    /// Root references one target row.
    ToOne,
    /// Target rows reference the root; many may be attached.
    ToMany,
}

///
/// Association
///
/// Descriptor for one named association of an entity. Carries everything
/// the rewrite and relation passes need, so no ORM introspection happens
/// at rewrite time.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Association {
    pub kind: AssociationKind,
    /// Engine-resolvable target entity name or path.
    pub target: String,
    /// Primary-key column on target rows.
    pub primary_key: String,
    /// Unique lookup column used by upsert matching and the to-many diff.
    pub match_field: Option<String>,
    /// Column on target rows that points back at the root.
    pub foreign_key: Option<String>,
    /// All reference columns on target rows, used by the detach liveness
    /// check. Includes `foreign_key` itself.
    pub target_references: Vec<String>,
}

impl Association {
    fn new(kind: AssociationKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            match_field: None,
            foreign_key: None,
            target_references: Vec::new(),
        }
    }

    #[must_use]
    pub fn to_one(target: impl Into<String>) -> Self {
        Self::new(AssociationKind::ToOne, target)
    }

    #[must_use]
    pub fn to_many(target: impl Into<String>) -> Self {
        Self::new(AssociationKind::ToMany, target)
    }

    #[must_use]
    pub fn with_primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    #[must_use]
    pub fn with_match_field(mut self, field: impl Into<String>) -> Self {
        self.match_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_foreign_key(mut self, field: impl Into<String>) -> Self {
        self.foreign_key = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_target_references<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_references = fields.into_iter().map(Into::into).collect();
        self
    }
}

///
/// EntityShape
///
/// Queryable surface of one entity type: its real columns and its named
/// associations. Anything a filter names beyond these is a virtual
/// property and must be handled after the fetch.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityShape {
    entity: String,
    primary_key: String,
    columns: BTreeSet<String>,
    associations: BTreeMap<String, Association>,
}

impl EntityShape {
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            columns: BTreeSet::new(),
            associations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>) -> Self {
        self.columns.insert(name.into());
        self
    }

    #[must_use]
    pub fn with_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_association(mut self, name: impl Into<String>, association: Association) -> Self {
        self.associations.insert(name.into(), association);
        self
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    #[must_use]
    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.get(name)
    }
}
