use std::sync::Arc;

use bitvec::prelude::*;

use crate::scheme::{FieldId, Scheme};
use crate::value::Value;

/// Read (and possibly write) access to the values of a row, addressed by field id.
pub trait RowRef {
    /// The value stored for `field`, `None` when absent, out of range or hidden.
    fn get_value(&self, field: FieldId) -> Option<&Value>;

    /// Overwrites the slot of `field`. Returns `false` when the write is refused.
    fn set_value(&mut self, field: FieldId, value: Value) -> bool;
}

/// A fixed-width vector of optional values, one slot per field of its scheme.
#[derive(Debug, Clone)]
pub struct Row {
    scheme: Arc<Scheme>,
    values: Vec<Option<Value>>,
}

impl Row {
    /// Creates a row with every slot absent.
    pub fn new(scheme: &Arc<Scheme>) -> Self {
        Self {
            scheme: Arc::clone(scheme),
            values: vec![None; scheme.len()],
        }
    }

    pub fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All slots in field order.
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    /// True when every key field holds a value.
    pub fn is_complete(&self) -> bool {
        self.scheme
            .key_field_ids()
            .iter()
            .all(|&id| self.values[id].is_some())
    }

    /// The key values in key-field order, `None` unless the row is complete.
    pub fn key_values(&self) -> Option<Vec<Value>> {
        self.scheme
            .key_field_ids()
            .iter()
            .map(|&id| self.values[id].clone())
            .collect()
    }

    /// Wraps the row in a read-only view of `fields`.
    pub fn project(self: &Arc<Self>, fields: &[FieldId]) -> RowSelection {
        Projection::new(&self.scheme, fields).select(Arc::clone(self))
    }
}

impl RowRef for Row {
    fn get_value(&self, field: FieldId) -> Option<&Value> {
        self.values.get(field).and_then(Option::as_ref)
    }

    /// Refuses out-of-range ids, values whose type differs from the field's,
    /// non-finite floats, and an empty text on a key field (it would persist
    /// as an absent value).
    fn set_value(&mut self, field: FieldId, value: Value) -> bool {
        let Some(descriptor) = self.scheme.field(field) else {
            return false;
        };
        if descriptor.field_type != value.field_type() {
            return false;
        }
        match &value {
            Value::Float(v) if !v.is_finite() => return false,
            Value::Text(s) if s.is_empty() && descriptor.is_key => return false,
            _ => {}
        }
        self.values[field] = Some(value);
        true
    }
}

/// The set of fields a [RowSelection] exposes, built once and shared by every
/// row of a query result.
#[derive(Debug)]
pub struct Projection {
    fields: Vec<FieldId>,
    /// `true` at the id of every selected field.
    mask: BitVec,
}

impl Projection {
    /// Ids outside of `scheme` are dropped.
    pub fn new(scheme: &Scheme, fields: &[FieldId]) -> Arc<Self> {
        let mut mask = bitvec![0; scheme.len()];
        let fields: Vec<FieldId> = fields
            .iter()
            .copied()
            .filter(|&id| id < scheme.len())
            .collect();
        for &id in &fields {
            mask.set(id, true);
        }
        Arc::new(Self { fields, mask })
    }

    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.mask.get(field).is_some_and(|bit| *bit)
    }

    pub fn select(self: &Arc<Self>, row: Arc<Row>) -> RowSelection {
        RowSelection {
            row,
            projection: Arc::clone(self),
        }
    }
}

/// Read-only view of the selected fields of a row. The row storage is shared,
/// not copied.
#[derive(Debug, Clone)]
pub struct RowSelection {
    row: Arc<Row>,
    projection: Arc<Projection>,
}

impl RowSelection {
    /// Selected field ids, in selection order.
    pub fn field_ids(&self) -> &[FieldId] {
        self.projection.fields()
    }

    /// Selected values, in selection order.
    pub fn values(&self) -> impl Iterator<Item = Option<&Value>> {
        self.projection
            .fields()
            .iter()
            .map(|&id| self.row.get_value(id))
    }

    /// The underlying row, including unselected fields.
    pub(crate) fn row(&self) -> &Row {
        &self.row
    }
}

impl RowRef for RowSelection {
    fn get_value(&self, field: FieldId) -> Option<&Value> {
        if self.projection.contains(field) {
            self.row.get_value(field)
        } else {
            None
        }
    }

    fn set_value(&mut self, _field: FieldId, _value: Value) -> bool {
        false
    }
}
