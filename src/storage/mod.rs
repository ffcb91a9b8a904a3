//! Storage collaborators: where a [Database] gets its scheme and rows at open,
//! and where it pushes them back on persist.

pub mod json;
pub mod memory;

use std::sync::Arc;

use crate::database::Database;
use crate::error::{DatastoreError, StorageError};
use crate::row::{Row, RowRef};
use crate::scheme::Scheme;

pub use json::JsonStorage;
pub use memory::MemoryStorage;

/// Contract between the engine and its backing store.
///
/// The engine calls [DataStorage::load] once when opened, then, on every
/// persist, `begin_persist`, `persist_row` once per stored row in storage
/// order, and `end_persist`.
pub trait DataStorage: Send {
    fn scheme(&self) -> Arc<Scheme>;

    /// Streams the stored rows into `database` through
    /// [Database::create_row] and [Database::insert].
    fn load(&mut self, database: &mut Database) -> Result<(), DatastoreError>;

    fn begin_persist(&mut self) -> Result<(), StorageError>;

    fn persist_row(&mut self, row: &Row) -> Result<(), StorageError>;

    fn end_persist(&mut self) -> Result<(), StorageError>;
}

/// Canonical string of every slot, absent values as empty strings.
///
/// An empty text is encoded like an absent value and loads back as absent.
/// [crate::Row] refuses empty text on key fields, so row identity survives.
pub fn encode_row(row: &Row) -> Vec<String> {
    row.values()
        .iter()
        .map(|v| v.as_ref().map(ToString::to_string).unwrap_or_default())
        .collect()
}

/// Parses positional string rows (the inverse of [encode_row]) and upserts them.
///
/// # Errors
/// Stops at the first row whose arity differs from the scheme or whose cell
/// does not parse as its field's type.
pub fn load_encoded_rows(
    database: &mut Database,
    rows: Vec<Vec<String>>,
) -> Result<usize, DatastoreError> {
    let scheme = Arc::clone(database.scheme());
    let mut loaded = 0;

    for (index, cells) in rows.into_iter().enumerate() {
        if !scheme.all_fields_present(cells.as_slice()) {
            return Err(StorageError::RowArity {
                row: index,
                expected: scheme.len(),
                found: cells.len(),
            }
            .into());
        }

        let mut row = database.create_row();
        for (field, cell) in scheme.fields().iter().zip(&cells) {
            if cell.is_empty() {
                continue;
            }
            let value = field.field_type.parse(cell)?;
            let stored = row.set_value(field.id, value);
            debug_assert!(stored, "a value parsed with its field's type is always stored");
        }
        database.insert(row)?;
        loaded += 1;
    }

    Ok(loaded)
}
