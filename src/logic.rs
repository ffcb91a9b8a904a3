use crate::row::RowRef;
use crate::scheme::{FieldDescriptor, FieldId, Scheme};
use crate::value::Value;

/// Boolean expression over the values of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Qualifier {
    /// Matches when the field holds exactly `expected`. An absent value never matches.
    Exact { field: FieldId, expected: Value },
    /// Matches when every child matches. An empty conjunction matches every row.
    And(Vec<Qualifier>),
}

impl Qualifier {
    pub fn exact(field: FieldId, expected: Value) -> Self {
        Self::Exact { field, expected }
    }

    /// Adds `qualifier` to a conjunction. Any other qualifier becomes the first
    /// child of a new conjunction.
    pub fn with(self, qualifier: Qualifier) -> Self {
        match self {
            Self::And(mut children) => {
                children.push(qualifier);
                Self::And(children)
            }
            other => Self::And(vec![other, qualifier]),
        }
    }

    pub fn matches<R: RowRef + ?Sized>(&self, row: &R) -> bool {
        match self {
            Self::Exact { field, expected } => row.get_value(*field) == Some(expected),
            Self::And(children) => children.iter().all(|q| q.matches(row)),
        }
    }

    /// Appends every field referenced by this qualifier, depth first.
    pub fn field_descriptors(&self, out: &mut Vec<FieldId>) {
        match self {
            Self::Exact { field, .. } => out.push(*field),
            Self::And(children) => {
                for child in children {
                    child.field_descriptors(out);
                }
            }
        }
    }
}

/// A filter over rows: an optional qualifier root, where no root matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    root: Option<Qualifier>,
    search_fields: Vec<FieldId>,
}

impl Predicate {
    pub fn new(root: Qualifier) -> Self {
        let mut search_fields = vec![];
        root.field_descriptors(&mut search_fields);
        search_fields.sort_unstable();
        search_fields.dedup();
        Self {
            root: Some(root),
            search_fields,
        }
    }

    /// The predicate without a root, it matches every row.
    pub const fn always_true() -> Self {
        Self {
            root: None,
            search_fields: Vec::new(),
        }
    }

    pub fn root(&self) -> Option<&Qualifier> {
        self.root.as_ref()
    }

    pub fn matches<R: RowRef + ?Sized>(&self, row: &R) -> bool {
        match &self.root {
            Some(root) => root.matches(row),
            None => true,
        }
    }

    /// Distinct ids of the fields the predicate reads, ascending.
    pub fn search_fields(&self) -> &[FieldId] {
        &self.search_fields
    }

    pub fn field_descriptors<'s>(&self, scheme: &'s Scheme) -> Vec<&'s FieldDescriptor> {
        self.search_fields
            .iter()
            .filter_map(|&id| scheme.field(id))
            .collect()
    }
}

impl From<Qualifier> for Predicate {
    fn from(root: Qualifier) -> Self {
        Self::new(root)
    }
}
