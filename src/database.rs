use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Index;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::{DatastoreError, Result};
use crate::logic::{Predicate, Qualifier};
use crate::row::{Projection, Row, RowRef, RowSelection};
use crate::scheme::{FieldDescriptor, FieldId, Scheme};
use crate::storage::DataStorage;
use crate::value::Value;

/// Outcome of a successful [Database::insert].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionResult {
    /// No stored row had the same key values, the row was appended.
    Inserted,
    /// The first stored row with the same key values was overwritten.
    Replaced,
}

/// The in-memory row store.
///
/// Row identity is "equal on every key field". Inserting a row whose key
/// values are already stored replaces the whole stored row.
///
/// A database is not synchronized: callers sharing one across threads must
/// serialize access themselves, e.g. behind a `Mutex`.
pub struct Database {
    scheme: Arc<Scheme>,
    /// Stored rows, in insertion order. Query results share them.
    rows: Vec<Arc<Row>>,
    /// Position in `rows` of every complete row, by key values.
    key_index: HashMap<Vec<Value>, usize>,
    storage: Option<Box<dyn DataStorage>>,
    /// Rows changed since the last load or persist.
    dirty: bool,
}

impl Database {
    /// Creates an empty, in-memory only database.
    pub fn new(scheme: Arc<Scheme>) -> Self {
        Self {
            scheme,
            rows: vec![],
            key_index: HashMap::new(),
            storage: None,
            dirty: false,
        }
    }

    /// Creates a database backed by `storage`, loading every stored row.
    ///
    /// # Errors
    /// Propagates any failure of [DataStorage::load].
    pub fn open<S: DataStorage + 'static>(storage: S) -> Result<Self> {
        let mut storage: Box<dyn DataStorage> = Box::new(storage);
        let mut database = Self::new(storage.scheme());
        storage.load(&mut database)?;

        database.storage = Some(storage);
        database.dirty = false;
        info!(rows = database.len(), "opened database");
        Ok(database)
    }

    pub fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Creates an empty row for this database's scheme.
    pub fn create_row(&self) -> Row {
        Row::new(&self.scheme)
    }

    /// The conjunction of [Qualifier::Exact] over every key field of `row`,
    /// using the row's current values.
    ///
    /// `None` when a key value is absent: an `Exact` never matches an absent
    /// value, so no stored row could be identified by it.
    pub fn key_predicate(&self, row: &Row) -> Option<Predicate> {
        self.scheme
            .key_field_ids()
            .iter()
            .map(|&id| row.get_value(id).map(|v| Qualifier::exact(id, v.clone())))
            .collect::<Option<Vec<_>>>()
            .map(|children| Predicate::new(Qualifier::And(children)))
    }

    /// Position of the first stored row (in insertion order) matching `predicate`.
    pub fn find(&self, predicate: &Predicate) -> Option<usize> {
        self.rows.iter().position(|row| predicate.matches(&**row))
    }

    /// Inserts `row`, or replaces the stored row that has the same key values.
    ///
    /// Rows with an absent key value never match a stored row and are always
    /// appended.
    ///
    /// # Errors
    /// Returns [DatastoreError::ForeignRow] when `row` was not created for this
    /// database's scheme (see [Database::create_row]).
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use datastore::{Database, FieldSpec, FieldType, InsertionResult, RowRef, Scheme, Value};
    ///
    /// let scheme = Scheme::new(vec![
    ///     FieldSpec::new("keyField", FieldType::Text).key(),
    ///     FieldSpec::new("valueField", FieldType::Float),
    /// ]).unwrap();
    /// let mut db = Database::new(Arc::new(scheme));
    ///
    /// let mut row = db.create_row();
    /// row.set_value(0, Value::from("K1"));
    /// row.set_value(1, Value::Float(42.0));
    /// assert_eq!(db.insert(row).unwrap(), InsertionResult::Inserted);
    ///
    /// let mut row = db.create_row();
    /// row.set_value(0, Value::from("K1"));
    /// row.set_value(1, Value::Float(84.84));
    /// assert_eq!(db.insert(row).unwrap(), InsertionResult::Replaced);
    ///
    /// let result = db.query_all();
    /// assert_eq!(result.len(), 1);
    /// assert_eq!(result[0].get_value(1), Some(&Value::Float(84.84)));
    /// ```
    pub fn insert(&mut self, row: Row) -> Result<InsertionResult> {
        if !Arc::ptr_eq(row.scheme(), &self.scheme) {
            return Err(DatastoreError::ForeignRow);
        }

        self.dirty = true;
        let Some(key) = row.key_values() else {
            self.rows.push(Arc::new(row));
            debug!(slot = self.rows.len() - 1, "inserted row with absent key value");
            return Ok(InsertionResult::Inserted);
        };

        match self.key_index.get(&key) {
            Some(&slot) => {
                self.rows[slot] = Arc::new(row);
                debug!(slot, "replaced row");
                Ok(InsertionResult::Replaced)
            }
            None => {
                let slot = self.rows.len();
                self.rows.push(Arc::new(row));
                self.key_index.insert(key, slot);
                debug!(slot, "inserted row");
                Ok(InsertionResult::Inserted)
            }
        }
    }

    /// Every stored row, every field, storage order.
    pub fn query_all(&self) -> QueryResult {
        self.query(&[], &Predicate::always_true(), &[])
    }

    /// Filters, projects and sorts the stored rows.
    ///
    /// 1. `select` defaults to every field when empty.
    /// 2. Rows are scanned in storage order, those matching `filter` are kept.
    /// 3. When `order_by` is not empty, kept rows are stably sorted ascending,
    ///    field by field. An absent value sorts before any present value.
    /// 4. Each kept row is exposed as a [RowSelection] over `select`.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use datastore::{Database, FieldSpec, FieldType, Predicate, RowRef, Scheme, Value};
    ///
    /// let scheme = Scheme::new(vec![
    ///     FieldSpec::new("keyField", FieldType::Text).key(),
    ///     FieldSpec::new("valueField", FieldType::Float),
    /// ]).unwrap();
    /// let mut db = Database::new(Arc::new(scheme));
    /// for (key, value) in [("a", 1.0), ("b", 3.0), ("c", 2.0)] {
    ///     let mut row = db.create_row();
    ///     row.set_value(0, Value::from(key));
    ///     row.set_value(1, Value::Float(value));
    ///     db.insert(row).unwrap();
    /// }
    ///
    /// let result = db.query(&[1], &Predicate::always_true(), &[1]);
    /// let values: Vec<_> = result.iter().map(|r| r.get_value(1).cloned()).collect();
    /// assert_eq!(values, vec![Some(1.0.into()), Some(2.0.into()), Some(3.0.into())]);
    /// assert_eq!(result[0].get_value(0), None);
    /// ```
    pub fn query(&self, select: &[FieldId], filter: &Predicate, order_by: &[FieldId]) -> QueryResult {
        let fields = if select.is_empty() {
            self.scheme.field_ids()
        } else {
            select.to_vec()
        };

        let mut kept: Vec<&Arc<Row>> = self
            .rows
            .iter()
            .filter(|&row| filter.matches(&**row))
            .collect();

        if !order_by.is_empty() {
            kept.sort_by(|a, b| compare_rows(a, b, order_by));
        }

        let projection = Projection::new(&self.scheme, &fields);
        let rows: Vec<RowSelection> = kept
            .into_iter()
            .map(|row| projection.select(Arc::clone(row)))
            .collect();

        debug!(
            scanned = self.rows.len(),
            returned = rows.len(),
            "query"
        );

        QueryResult {
            scheme: Arc::clone(&self.scheme),
            fields: projection.fields().to_vec(),
            rows,
        }
    }

    /// Pushes every stored row, in storage order, to the storage collaborator.
    /// An in-memory only database has nothing to persist.
    ///
    /// # Errors
    /// Propagates the first storage failure.
    pub fn persist(&mut self) -> Result<()> {
        let Some(storage) = self.storage.as_mut() else {
            return Ok(());
        };

        storage.begin_persist()?;
        for row in &self.rows {
            storage.persist_row(row)?;
        }
        storage.end_persist()?;

        self.dirty = false;
        info!(rows = self.rows.len(), "persisted database");
        Ok(())
    }

    /// Persists and releases the storage collaborator.
    ///
    /// # Errors
    /// Propagates persist failures. The storage is released either way.
    pub fn close(mut self) -> Result<()> {
        let result = self.persist();
        self.storage = None;
        result
    }

    /// Releases the storage collaborator without persisting, leaving the
    /// backing store as it was last persisted.
    pub fn discard(mut self) {
        self.storage = None;
        debug!(rows = self.rows.len(), "discarded database changes");
    }
}

/// Dropping a storage-backed database with unpersisted changes persists it.
impl Drop for Database {
    fn drop(&mut self) {
        if self.dirty && self.storage.is_some() {
            if let Err(e) = self.persist() {
                error!(error = %e, "failed to persist database on drop");
            }
        }
    }
}

// Rows of one database hold same-typed values per field, so values only
// compare within a type and `partial_cmp` does not return `None`.
fn compare_rows(a: &Row, b: &Row, order_by: &[FieldId]) -> Ordering {
    for &field in order_by {
        let ord = a
            .get_value(field)
            .partial_cmp(&b.get_value(field))
            .unwrap_or(Ordering::Equal);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Rows returned by [Database::query], read-only.
#[derive(Debug, Clone)]
pub struct QueryResult {
    scheme: Arc<Scheme>,
    fields: Vec<FieldId>,
    rows: Vec<RowSelection>,
}

impl QueryResult {
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Selected field ids, in selection order.
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    pub fn field_descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter_map(|&id| self.scheme.field(id))
    }

    pub fn get(&self, index: usize) -> Option<&RowSelection> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RowSelection> {
        self.rows.iter()
    }
}

impl Index<usize> for QueryResult {
    type Output = RowSelection;

    fn index(&self, index: usize) -> &Self::Output {
        &self.rows[index]
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a RowSelection;
    type IntoIter = std::slice::Iter<'a, RowSelection>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
