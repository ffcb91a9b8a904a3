use std::path::PathBuf;

/// A scheme that violates one of the construction constraints.
///
/// A [crate::Scheme] is never built when any of these occur.
#[derive(Debug, thiserror::Error)]
pub enum SchemeError {
    #[error("unmet scheme constraints: field #{index} has an empty 'name'")]
    EmptyName { index: usize },

    #[error("unmet scheme constraints: invalid 'type' {type_name:?} in field {name:?}")]
    UnknownType { name: String, type_name: String },

    #[error("unmet scheme constraints: field name {0:?} is declared more than once")]
    DuplicateName(String),

    #[error("unmet scheme constraints: at least one field must be a 'key'")]
    NoKeyField,

    #[error("invalid scheme JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string that does not parse as the declared field type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{input:?} is not a valid float")]
    Float { input: String },

    #[error("{input:?} is not a valid date, expected YYYY-MM-DD")]
    Date { input: String },

    #[error("{input:?} is not a valid time, expected HH:SSSS")]
    Time { input: String },

    #[error("{input:?} is out of range, seconds must be below 3600")]
    TimeOutOfRange { input: String },
}

/// Failures raised by a storage collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid database JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("row {row} has {found} values, the scheme declares {expected} fields")]
    RowArity {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("persist_row called outside of begin_persist/end_persist")]
    NotPersisting,
}

/// Top-level error of the datastore.
#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    #[error(transparent)]
    Scheme(#[from] SchemeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unrecognized field {0:?}")]
    UnknownField(String),

    #[error("syntax error in filter expression: {0}")]
    FilterSyntax(String),

    #[error("line {line}: {source}")]
    Import {
        line: usize,
        #[source]
        source: Box<DatastoreError>,
    },

    #[error("header {found:?} does not match the scheme fields {expected:?}")]
    HeaderMismatch { expected: String, found: String },

    #[error("row was not created for this database's scheme")]
    ForeignRow,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T, E = DatastoreError> = std::result::Result<T, E>;
