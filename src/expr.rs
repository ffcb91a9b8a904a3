//! Textual arguments of the query tool: comma separated field lists and
//! `FIELD=value` filters.

use crate::error::{DatastoreError, Result};
use crate::logic::Qualifier;
use crate::scheme::{FieldId, Scheme};

/// Longest accepted field name in a filter.
pub const MAX_FIELD_NAME_LEN: usize = 64;
/// Longest accepted value in a filter.
pub const MAX_VALUE_LEN: usize = 1024;

/// Resolves a comma separated list of field names, in list order.
///
/// Blank entries are skipped, so an empty list resolves to no field.
///
/// ```
/// use datastore::{expr, Scheme};
///
/// let scheme = Scheme::from_json(r#"[
///     { "name": "STB", "type": "text", "key": true },
///     { "name": "REV", "type": "float" }
/// ]"#).unwrap();
/// assert_eq!(expr::parse_field_list(&scheme, "REV, STB").unwrap(), vec![1, 0]);
/// assert!(expr::parse_field_list(&scheme, "REV,PRICE").is_err());
/// ```
pub fn parse_field_list(scheme: &Scheme, list: &str) -> Result<Vec<FieldId>> {
    let names: Vec<&str> = list
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();
    scheme.resolve_names(names.as_slice())
}

/// Parses `FIELD=value` into an [Qualifier::Exact] on that field.
///
/// The value is everything after the first `=`, parsed with the field's type.
/// A value wrapped in double quotes is unwrapped first.
///
/// # Errors
/// [DatastoreError::FilterSyntax] when there is no `=`, or the name or value is
/// empty or too long. [DatastoreError::UnknownField] for a name the scheme does
/// not declare. [DatastoreError::Parse] when the value does not parse.
pub fn parse_filter(scheme: &Scheme, expression: &str) -> Result<Qualifier> {
    let Some((name, value)) = expression.split_once('=') else {
        return Err(DatastoreError::FilterSyntax(format!(
            "expected FIELD=value, found {expression:?}"
        )));
    };

    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_FIELD_NAME_LEN {
        return Err(DatastoreError::FilterSyntax(format!(
            "field name must be 1 to {MAX_FIELD_NAME_LEN} characters"
        )));
    }

    let value = unquote(value);
    if value.is_empty() || value.chars().count() > MAX_VALUE_LEN {
        return Err(DatastoreError::FilterSyntax(format!(
            "value must be 1 to {MAX_VALUE_LEN} characters"
        )));
    }

    let field = scheme
        .field_by_name(name)
        .ok_or_else(|| DatastoreError::UnknownField(name.to_string()))?;
    let expected = field.field_type.parse(value)?;
    Ok(Qualifier::exact(field.id, expected))
}

/// Parses every expression and joins them into one conjunction.
/// No expression gives `None`, a single one is returned as is.
pub fn parse_filters<S: AsRef<str>>(scheme: &Scheme, expressions: &[S]) -> Result<Option<Qualifier>> {
    let mut qualifiers = expressions
        .iter()
        .map(|e| parse_filter(scheme, e.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    Ok(match qualifiers.len() {
        0 => None,
        1 => qualifiers.pop(),
        _ => Some(Qualifier::And(qualifiers)),
    })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
