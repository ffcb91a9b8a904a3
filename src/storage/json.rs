use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{DataStorage, encode_row, load_encoded_rows};
use crate::database::Database;
use crate::error::{DatastoreError, StorageError};
use crate::row::Row;
use crate::scheme::{FieldSpec, Scheme};

/// On-disk document: the scheme declarations and every row as positional
/// canonical strings.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatabaseFile {
    scheme: Vec<FieldSpec>,
    rows: Vec<Vec<String>>,
}

/// A database stored as a single JSON file, read entirely on open and
/// rewritten entirely on persist.
#[derive(Debug)]
pub struct JsonStorage {
    path: PathBuf,
    scheme: Arc<Scheme>,
    /// Rows read from the file, handed out once by [DataStorage::load].
    rows: Vec<Vec<String>>,
    pending: Option<Vec<Vec<String>>>,
}

impl JsonStorage {
    /// Reads an existing database file.
    ///
    /// # Errors
    /// [StorageError::Io] when the file cannot be read, [StorageError::Json]
    /// when it is not a database document, [crate::SchemeError] when its
    /// scheme is invalid.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DatastoreError> {
        let path = path.into();
        let file = File::open(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        let document: DatabaseFile =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| StorageError::Json {
                path: path.clone(),
                source,
            })?;
        let scheme = Scheme::new(document.scheme)?;

        info!(path = %path.display(), rows = document.rows.len(), "read database file");
        Ok(Self {
            path,
            scheme: Arc::new(scheme),
            rows: document.rows,
            pending: None,
        })
    }

    /// Starts a new, empty database file. Nothing is written before the first persist.
    pub fn create(scheme: Arc<Scheme>, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scheme,
            rows: vec![],
            pending: None,
        }
    }

    /// Opens `path` when it exists, otherwise creates it with the scheme
    /// declared in the JSON array at `scheme_path`.
    pub fn open_or_create(
        path: impl Into<PathBuf>,
        scheme_path: impl AsRef<Path>,
    ) -> Result<Self, DatastoreError> {
        let path = path.into();
        if path.exists() {
            return Self::open(path);
        }

        let scheme_path = scheme_path.as_ref();
        let json = fs::read_to_string(scheme_path).map_err(|source| StorageError::Io {
            path: scheme_path.to_path_buf(),
            source,
        })?;
        let scheme = Scheme::from_json(&json)?;
        info!(path = %path.display(), scheme = %scheme_path.display(), "creating database file");
        Ok(Self::create(Arc::new(scheme), path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write(&self, document: &DatabaseFile) -> Result<(), StorageError> {
        let temp = self.temp_path();
        let io_error = |source| StorageError::Io {
            path: temp.clone(),
            source,
        };

        let file = File::create(&temp).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, document).map_err(|source| StorageError::Json {
            path: temp.clone(),
            source,
        })?;
        writer.flush().map_err(io_error)?;
        drop(writer);

        fs::rename(&temp, &self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl DataStorage for JsonStorage {
    fn scheme(&self) -> Arc<Scheme> {
        Arc::clone(&self.scheme)
    }

    fn load(&mut self, database: &mut Database) -> Result<(), DatastoreError> {
        let loaded = load_encoded_rows(database, std::mem::take(&mut self.rows))?;
        debug!(path = %self.path.display(), rows = loaded, "loaded rows");
        Ok(())
    }

    fn begin_persist(&mut self) -> Result<(), StorageError> {
        self.pending = Some(vec![]);
        Ok(())
    }

    fn persist_row(&mut self, row: &Row) -> Result<(), StorageError> {
        let pending = self.pending.as_mut().ok_or(StorageError::NotPersisting)?;
        pending.push(encode_row(row));
        Ok(())
    }

    fn end_persist(&mut self) -> Result<(), StorageError> {
        let rows = self.pending.take().ok_or(StorageError::NotPersisting)?;
        let document = DatabaseFile {
            scheme: self.scheme.to_specs(),
            rows,
        };
        self.write(&document)?;
        info!(path = %self.path.display(), rows = document.rows.len(), "wrote database file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::field_type::FieldType;
    use crate::row::RowRef;
    use crate::value::Value;

    fn scheme() -> Arc<Scheme> {
        Arc::new(
            Scheme::new(vec![
                FieldSpec::new("STB", FieldType::Text).key().size(64),
                FieldSpec::new("DATE", FieldType::Date).key(),
                FieldSpec::new("REV", FieldType::Float).description("The price"),
                FieldSpec::new("VIEW_TIME", FieldType::Time),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let storage = JsonStorage::create(scheme(), &path);
        let temp = storage.temp_path();
        let mut db = Database::open(storage).unwrap();
        for (stb, date, rev) in [("stb1", "2014-04-01", "4.00"), ("stb2", "2014-04-02", "")] {
            let mut row = db.create_row();
            row.set_value(0, Value::from(stb));
            row.set_value(1, FieldType::Date.parse(date).unwrap());
            if !rev.is_empty() {
                row.set_value(2, FieldType::Float.parse(rev).unwrap());
            }
            row.set_value(3, FieldType::Time.parse("1:30").unwrap());
            db.insert(row).unwrap();
        }
        db.close().unwrap();
        assert!(path.exists());
        assert!(!temp.exists());

        let storage = JsonStorage::open(&path).unwrap();
        assert_eq!(storage.scheme().to_specs(), scheme().to_specs());
        let db = Database::open(storage).unwrap();
        let result = db.query_all();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].get_value(2), Some(&Value::Float(4.0)));
        assert_eq!(result[1].get_value(2), None);
        assert_eq!(result[1].get_value(3).map(ToString::to_string).as_deref(), Some("01:0030"));
    }

    #[test]
    fn test_file_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let mut db = Database::open(JsonStorage::create(scheme(), &path)).unwrap();
        let mut row = db.create_row();
        row.set_value(0, Value::from("stb1"));
        db.insert(row).unwrap();
        db.close().unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["scheme"][0]["name"], "STB");
        assert_eq!(json["scheme"][0]["size"], 64);
        assert_eq!(json["scheme"][0]["key"], true);
        assert_eq!(json["scheme"][2]["description"], "The price");
        assert_eq!(json["rows"], serde_json::json!([["stb1", "", "", ""]]));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        let err = JsonStorage::open(&path).unwrap_err();
        assert!(matches!(err, DatastoreError::Storage(StorageError::Io { .. })));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_open_rejects_malformed_documents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        for document in [
            "not json",
            r#"{ "scheme": [] }"#,
            r#"{ "scheme": [{ "name": "STB", "type": "text", "key": true, "colour": "red" }], "rows": [] }"#,
        ] {
            fs::write(&path, document).unwrap();
            assert!(matches!(
                JsonStorage::open(&path),
                Err(DatastoreError::Storage(StorageError::Json { .. }))
            ));
        }

        fs::write(&path, r#"{ "scheme": [{ "name": "STB", "type": "text" }], "rows": [] }"#).unwrap();
        assert!(matches!(
            JsonStorage::open(&path),
            Err(DatastoreError::Scheme(crate::SchemeError::NoKeyField))
        ));
    }

    #[test]
    fn test_open_rejects_bad_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        fs::write(
            &path,
            r#"{ "scheme": [{ "name": "STB", "type": "text", "key": true },
                            { "name": "REV", "type": "float" }],
                 "rows": [["stb1", "4.00"], ["stb2"]] }"#,
        )
        .unwrap();

        let storage = JsonStorage::open(&path).unwrap();
        assert!(matches!(
            Database::open(storage),
            Err(DatastoreError::Storage(StorageError::RowArity { row: 1, .. }))
        ));
    }

    #[test]
    fn test_open_or_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let scheme_path = dir.path().join("scheme.json");
        fs::write(
            &scheme_path,
            r#"[{ "name": "STB", "type": "text", "key": true }, { "name": "REV", "type": "float" }]"#,
        )
        .unwrap();

        let storage = JsonStorage::open_or_create(&path, &scheme_path).unwrap();
        assert_eq!(storage.scheme().len(), 2);
        assert!(!path.exists());
        let mut db = Database::open(storage).unwrap();
        let mut row = db.create_row();
        row.set_value(0, Value::from("stb1"));
        db.insert(row).unwrap();
        db.close().unwrap();

        // the scheme file is ignored once the database exists
        fs::remove_file(&scheme_path).unwrap();
        let db = Database::open(JsonStorage::open_or_create(&path, &scheme_path).unwrap()).unwrap();
        assert_eq!(db.len(), 1);
        drop(db);

        fs::remove_file(&path).unwrap();
        assert!(matches!(
            JsonStorage::open_or_create(&path, &scheme_path),
            Err(DatastoreError::Storage(StorageError::Io { .. }))
        ));
    }
}
