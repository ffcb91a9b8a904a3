//! Bar separated text import.
//!
//! The first non-blank line is a header naming every scheme field in order,
//! each following non-blank line is one record:
//!
//! ```text
//! STB|TITLE|PROVIDER|DATE|REV|VIEW_TIME
//! stb1|the matrix|warner bros|2014-04-01|4.00|1:30
//! ```

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::database::{Database, InsertionResult};
use crate::error::{DatastoreError, Result, StorageError};
use crate::row::RowRef;

pub const FIELD_DELIMITER: char = '|';

/// Outcome counts of a successful import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub replaced: usize,
}

/// Upserts every record read from `reader` into `database`.
///
/// `source` names the input in I/O errors. Empty cells are absent values.
///
/// # Errors
/// Stops at the first line that cannot be read, does not match the scheme
/// arity, or holds a cell that does not parse, as [DatastoreError::Import]
/// with its 1-based line number. Records before that line stay inserted.
pub fn import_records<R: BufRead>(
    database: &mut Database,
    reader: R,
    source: &Path,
) -> Result<ImportSummary> {
    let scheme = Arc::clone(database.scheme());
    let mut summary = ImportSummary::default();
    let mut header_seen = false;

    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let at_line = |e: DatastoreError| DatastoreError::Import {
            line: number,
            source: Box::new(e),
        };

        let line = line.map_err(|e| {
            at_line(
                StorageError::Io {
                    path: source.to_path_buf(),
                    source: e,
                }
                .into(),
            )
        })?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(FIELD_DELIMITER).collect();

        if !header_seen {
            if !scheme.fields_match_header(cells.as_slice()) {
                let expected: Vec<&str> = scheme.fields().iter().map(|f| f.name.as_str()).collect();
                return Err(at_line(DatastoreError::HeaderMismatch {
                    expected: expected.join("|"),
                    found: line.to_string(),
                }));
            }
            header_seen = true;
            continue;
        }

        if !scheme.all_fields_present(cells.as_slice()) {
            return Err(at_line(
                StorageError::RowArity {
                    row: number,
                    expected: scheme.len(),
                    found: cells.len(),
                }
                .into(),
            ));
        }

        let mut row = database.create_row();
        for (field, cell) in scheme.fields().iter().zip(&cells) {
            if cell.is_empty() {
                continue;
            }
            let value = field.field_type.parse(cell).map_err(|e| at_line(e.into()))?;
            let stored = row.set_value(field.id, value);
            debug_assert!(stored, "a value parsed with its field's type is always stored");
        }

        match database.insert(row).map_err(at_line)? {
            InsertionResult::Inserted => summary.inserted += 1,
            InsertionResult::Replaced => summary.replaced += 1,
        }
    }

    debug!(inserted = summary.inserted, replaced = summary.replaced, "import finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::field_type::FieldType;
    use crate::scheme::{FieldSpec, Scheme};
    use crate::value::Value;

    const INPUT: &str = "\
STB|TITLE|PROVIDER|DATE|REV|VIEW_TIME
stb1|the matrix|warner bros|2014-04-01|4.00|1:30
stb1|unbreakable|buena vista|2014-04-03|6.00|2:05
stb2|the hobbit|warner bros|2014-04-02|8.00|2:45
stb3|the matrix|warner bros|2014-04-02|4.00|1:05
stb1|the matrix|warner bros|2014-04-01|5.00|1:30
";

    fn database() -> Database {
        Database::new(Arc::new(
            Scheme::new(vec![
                FieldSpec::new("STB", FieldType::Text).key(),
                FieldSpec::new("TITLE", FieldType::Text).key(),
                FieldSpec::new("PROVIDER", FieldType::Text),
                FieldSpec::new("DATE", FieldType::Date).key(),
                FieldSpec::new("REV", FieldType::Float),
                FieldSpec::new("VIEW_TIME", FieldType::Time),
            ])
            .unwrap(),
        ))
    }

    fn import(db: &mut Database, input: &str) -> Result<ImportSummary> {
        import_records(db, Cursor::new(input), Path::new("input.txt"))
    }

    #[test]
    fn test_import() {
        let mut db = database();
        let summary = import(&mut db, INPUT).unwrap();

        assert_eq!(summary, ImportSummary { inserted: 4, replaced: 1 });
        assert_eq!(db.len(), 4);
        assert_eq!(db.query_all()[0].get_value(4), Some(&Value::Float(5.0)));
    }

    #[test]
    fn test_empty_cells_and_blank_lines() {
        let mut db = database();
        let input = "\r\nSTB|TITLE|PROVIDER|DATE|REV|VIEW_TIME\r\n\nstb1|the matrix||2014-04-01||\r\n";
        assert_eq!(import(&mut db, input).unwrap().inserted, 1);

        let result = db.query_all();
        assert_eq!(result[0].get_value(2), None);
        assert_eq!(result[0].get_value(4), None);
        assert_eq!(result[0].get_value(5), None);
    }

    #[test]
    fn test_empty_input() {
        let mut db = database();
        assert_eq!(import(&mut db, "").unwrap(), ImportSummary::default());
        assert!(db.is_empty());
    }

    #[test]
    fn test_header_must_match() {
        let mut db = database();
        match import(&mut db, "STB|PROVIDER|TITLE|DATE|REV|VIEW_TIME\n") {
            Err(DatastoreError::Import { line, source }) => {
                assert_eq!(line, 1);
                assert!(matches!(*source, DatastoreError::HeaderMismatch { .. }));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_abort_on_first_bad_line() {
        let mut db = database();
        let input = "\
STB|TITLE|PROVIDER|DATE|REV|VIEW_TIME
stb1|the matrix|warner bros|2014-04-01|4.00|1:30
stb2|the hobbit|warner bros|2014-04-02|eight|2:45
stb3|the matrix|warner bros|2014-04-02|4.00|1:05
";
        let err = import(&mut db, input).unwrap_err();
        assert!(err.to_string().starts_with("line 3: "));
        assert!(matches!(err, DatastoreError::Import { line: 3, .. }));
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_record_arity() {
        let mut db = database();
        let input = "STB|TITLE|PROVIDER|DATE|REV|VIEW_TIME\nstb1|the matrix|2014-04-01\n";
        match import(&mut db, input) {
            Err(DatastoreError::Import { line, source }) => {
                assert_eq!(line, 2);
                assert!(matches!(
                    *source,
                    DatastoreError::Storage(StorageError::RowArity { expected: 6, found: 3, .. })
                ));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_time_out_of_range() {
        let mut db = database();
        let input = "STB|TITLE|PROVIDER|DATE|REV|VIEW_TIME\nstb1|the matrix|warner|2014-04-01|4|10:9999\n";
        assert!(import(&mut db, input).is_err());
        assert!(db.is_empty());
    }
}
