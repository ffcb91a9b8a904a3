use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{DataStorage, encode_row, load_encoded_rows};
use crate::database::Database;
use crate::error::{DatastoreError, StorageError};
use crate::row::Row;
use crate::scheme::Scheme;

#[derive(Debug, Default)]
struct State {
    rows: Vec<Vec<String>>,
    pending: Option<Vec<Vec<String>>>,
    persist_count: usize,
}

/// A storage that keeps rows as canonical strings in memory.
///
/// Clones share the same rows, so a handle kept by the caller observes what a
/// [Database] persisted into the one it was opened with.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    scheme: Arc<Scheme>,
    state: Arc<Mutex<State>>,
}

impl MemoryStorage {
    pub fn new(scheme: Arc<Scheme>) -> Self {
        Self::with_rows(scheme, vec![])
    }

    /// Storage pre-filled with `rows`, positional and in canonical string form.
    pub fn with_rows(scheme: Arc<Scheme>, rows: Vec<Vec<String>>) -> Self {
        Self {
            scheme,
            state: Arc::new(Mutex::new(State {
                rows,
                ..State::default()
            })),
        }
    }

    /// Snapshot of the rows as of the last completed persist.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.lock().rows.clone()
    }

    /// Number of completed persists.
    pub fn persist_count(&self) -> usize {
        self.lock().persist_count
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DataStorage for MemoryStorage {
    fn scheme(&self) -> Arc<Scheme> {
        Arc::clone(&self.scheme)
    }

    fn load(&mut self, database: &mut Database) -> Result<(), DatastoreError> {
        let rows = self.rows();
        let loaded = load_encoded_rows(database, rows)?;
        debug!(rows = loaded, "loaded rows from memory");
        Ok(())
    }

    fn begin_persist(&mut self) -> Result<(), StorageError> {
        self.lock().pending = Some(vec![]);
        Ok(())
    }

    fn persist_row(&mut self, row: &Row) -> Result<(), StorageError> {
        match self.lock().pending.as_mut() {
            Some(pending) => {
                pending.push(encode_row(row));
                Ok(())
            }
            None => Err(StorageError::NotPersisting),
        }
    }

    fn end_persist(&mut self) -> Result<(), StorageError> {
        let mut state = self.lock();
        let rows = state.pending.take().ok_or(StorageError::NotPersisting)?;
        state.rows = rows;
        state.persist_count += 1;
        Ok(())
    }
}
