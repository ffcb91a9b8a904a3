pub mod database;
pub mod error;
pub mod expr;
pub mod field_type;
pub mod import;
pub mod logging;
pub mod logic;
pub mod row;
pub mod scheme;
pub mod storage;
pub mod value;

pub use database::{Database, InsertionResult, QueryResult};
pub use error::{DatastoreError, ParseError, Result, SchemeError, StorageError};
pub use field_type::FieldType;
pub use logic::{Predicate, Qualifier};
pub use row::{Projection, Row, RowRef, RowSelection};
pub use scheme::{FieldDescriptor, FieldId, FieldSpec, Scheme};
pub use storage::{DataStorage, JsonStorage, MemoryStorage};
pub use value::{Date, Time, Value};
