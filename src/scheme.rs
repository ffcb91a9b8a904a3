use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{DatastoreError, SchemeError};
use crate::field_type::FieldType;

/// Dense, zero-based position of a field in its [Scheme].
/// It doubles as the slot index of the field in a [crate::Row].
pub type FieldId = usize;

/// Field declaration as written in scheme JSON.
///
/// ```json
/// { "name": "STB", "type": "text", "size": 64, "key": true,
///   "description": "The set top box id on which the media asset was viewed" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub description: String,
}

impl FieldSpec {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            type_name: field_type.name().to_string(),
            ..Self::default()
        }
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// Validated, immutable description of one field of a [Scheme].
///
/// Two descriptors are equal when their ids are equal, identity is
/// scheme-scoped.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub name: String,
    pub description: String,
    pub field_type: FieldType,
    /// Advisory only (e.g. a maximum text length), never enforced.
    pub size: Option<usize>,
    pub is_key: bool,
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FieldDescriptor {}

/// Ordered set of field descriptors, shared read-only (through an `Arc`)
/// by the database, its rows and its qualifiers.
#[derive(Debug, Clone)]
pub struct Scheme {
    fields: Vec<FieldDescriptor>,
    key_fields: Vec<FieldId>,
}

impl Scheme {
    /// Builds a scheme, assigning ids in declaration order.
    ///
    /// # Errors
    /// Fails when a field has an empty name, an unrecognized type or a name
    /// already used by an earlier field, or when no field is a key.
    pub fn new(specs: Vec<FieldSpec>) -> Result<Self, SchemeError> {
        let mut fields = Vec::with_capacity(specs.len());
        let mut key_fields = vec![];
        let mut names = HashSet::new();

        for (id, spec) in specs.into_iter().enumerate() {
            if spec.name.is_empty() {
                return Err(SchemeError::EmptyName { index: id });
            }
            let field_type =
                FieldType::from_name(&spec.type_name).ok_or_else(|| SchemeError::UnknownType {
                    name: spec.name.clone(),
                    type_name: spec.type_name.clone(),
                })?;
            if !names.insert(spec.name.clone()) {
                return Err(SchemeError::DuplicateName(spec.name));
            }
            if spec.key {
                key_fields.push(id);
            }
            fields.push(FieldDescriptor {
                id,
                name: spec.name,
                description: spec.description,
                field_type,
                size: spec.size,
                is_key: spec.key,
            });
        }

        if key_fields.is_empty() {
            return Err(SchemeError::NoKeyField);
        }

        Ok(Self { fields, key_fields })
    }

    /// Parses a scheme from its JSON array encoding.
    ///
    /// # Example
    /// ```
    /// use datastore::Scheme;
    ///
    /// let scheme = Scheme::from_json(r#"[
    ///     { "name": "STB", "type": "text", "size": 64, "key": true },
    ///     { "name": "REV", "type": "float" }
    /// ]"#).unwrap();
    /// assert_eq!(scheme.len(), 2);
    ///
    /// assert!(Scheme::from_json(r#"[{ "name": "STB", "type": "text" }]"#).is_err());
    /// ```
    pub fn from_json(json: &str) -> Result<Self, SchemeError> {
        let specs: Vec<FieldSpec> = serde_json::from_str(json)?;
        Self::new(specs)
    }

    /// The declarations this scheme was built from, in id order.
    pub fn to_specs(&self) -> Vec<FieldSpec> {
        self.fields
            .iter()
            .map(|f| FieldSpec {
                name: f.name.clone(),
                type_name: f.field_type.name().to_string(),
                size: f.size,
                key: f.is_key,
                description: f.description.clone(),
            })
            .collect()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldDescriptor> {
        self.fields.get(id)
    }

    pub fn key_field_ids(&self) -> &[FieldId] {
        &self.key_fields
    }

    pub fn key_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.key_fields.iter().map(|&id| &self.fields[id])
    }

    pub fn field_ids(&self) -> Vec<FieldId> {
        (0..self.fields.len()).collect()
    }

    /// Number of fields. Never zero, a scheme has at least one key.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Maps field names to ids, keeping the given order.
    ///
    /// # Errors
    /// Returns [DatastoreError::UnknownField] for the first name not in the scheme.
    pub fn resolve_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<FieldId>, DatastoreError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.field_by_name(name)
                    .map(|f| f.id)
                    .ok_or_else(|| DatastoreError::UnknownField(name.to_string()))
            })
            .collect()
    }

    /// True iff `names` lists exactly the scheme's field names, in order.
    pub fn fields_match_header<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.len() == self.fields.len()
            && self
                .fields
                .iter()
                .zip(names)
                .all(|(field, name)| field.name == name.as_ref())
    }

    /// Arity check only: one item per field. Types are not compared.
    pub fn all_fields_present<T>(&self, items: &[T]) -> bool {
        items.len() == self.fields.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: &str = r#"[
        { "name": "textField", "type": "text", "size": 128, "key": true,
          "description": "This is a text field" },
        { "name": "floatField", "type": "float", "size": 32,
          "description": "This is a float field" },
        { "name": "dateField", "type": "date", "description": "This is a date field" },
        { "name": "timeField", "type": "time", "description": "This is a time field" }
    ]"#;

    #[test]
    fn test_one_field() {
        let scheme = Scheme::from_json(
            r#"[{ "name": "field1", "type": "text", "size": 128, "key": true,
                  "description": "This is a single field" }]"#,
        )
        .unwrap();

        assert_eq!(scheme.len(), 1);
        let field = &scheme.fields()[0];
        assert_eq!(field.id, 0);
        assert_eq!(field.name, "field1");
        assert_eq!(field.field_type, FieldType::Text);
        assert_eq!(field.size, Some(128));
        assert_eq!(field.description, "This is a single field");
        assert!(field.is_key);
    }

    #[test]
    fn test_all_types_and_ids() {
        let scheme = Scheme::from_json(ALL_TYPES).unwrap();
        let types: Vec<_> = scheme.fields().iter().map(|f| f.field_type).collect();
        assert_eq!(
            types,
            vec![FieldType::Text, FieldType::Float, FieldType::Date, FieldType::Time]
        );
        let ids: Vec<_> = scheme.fields().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(scheme.key_field_ids(), &[0]);
        assert_eq!(scheme.fields()[2].size, None);
    }

    #[test]
    fn test_missing_array() {
        let err = Scheme::from_json(r#"{ "name": "bad", "type": "text" }"#).unwrap_err();
        assert!(matches!(err, SchemeError::Json(_)));
    }

    #[test]
    fn test_no_key_rejected() {
        let json = r#"[
            { "name": "keyField", "type": "text", "key": false },
            { "name": "valueField", "type": "float" }
        ]"#;
        assert!(matches!(
            Scheme::from_json(json),
            Err(SchemeError::NoKeyField)
        ));
        assert!(matches!(Scheme::from_json("[]"), Err(SchemeError::NoKeyField)));
    }

    #[test]
    fn test_invalid_type_rejected() {
        let json = r#"[{ "name": "field1", "type": "invalid", "key": true }]"#;
        match Scheme::from_json(json) {
            Err(SchemeError::UnknownType { name, type_name }) => {
                assert_eq!(name, "field1");
                assert_eq!(type_name, "invalid");
            }
            other => panic!("expected UnknownType, got {other:?}"),
        }

        let missing = r#"[{ "name": "field1", "key": true }]"#;
        assert!(matches!(
            Scheme::from_json(missing),
            Err(SchemeError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let json = r#"[
            { "name": "a", "type": "text", "key": true },
            { "type": "text" }
        ]"#;
        assert!(matches!(
            Scheme::from_json(json),
            Err(SchemeError::EmptyName { index: 1 })
        ));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let specs = vec![
            FieldSpec::new("a", FieldType::Text).key(),
            FieldSpec::new("a", FieldType::Float),
        ];
        assert!(matches!(
            Scheme::new(specs),
            Err(SchemeError::DuplicateName(name)) if name == "a"
        ));
    }

    #[test]
    fn test_unexpected_member_rejected() {
        let json = r#"[{ "name": "a", "type": "text", "key": true, "unique": true }]"#;
        assert!(matches!(Scheme::from_json(json), Err(SchemeError::Json(_))));
    }

    #[test]
    fn test_fields_match_header() {
        let scheme = Scheme::from_json(ALL_TYPES).unwrap();
        assert!(scheme.fields_match_header(&["textField", "floatField", "dateField", "timeField"]));
        // positional, not a set match
        assert!(!scheme.fields_match_header(&["floatField", "textField", "dateField", "timeField"]));
        assert!(!scheme.fields_match_header(&["textField", "floatField", "dateField"]));
        assert!(!scheme.fields_match_header::<&str>(&[]));
    }

    #[test]
    fn test_all_fields_present_is_arity_only() {
        let scheme = Scheme::from_json(ALL_TYPES).unwrap();
        assert!(scheme.all_fields_present(&["x", "y", "z", "w"]));
        assert!(!scheme.all_fields_present(&["x"]));
    }

    #[test]
    fn test_resolve_names() {
        let scheme = Scheme::from_json(ALL_TYPES).unwrap();
        assert_eq!(scheme.resolve_names(&["timeField", "textField"]).unwrap(), vec![3, 0]);
        match scheme.resolve_names(&["textField", "nope"]) {
            Err(DatastoreError::UnknownField(name)) => assert_eq!(name, "nope"),
            other => panic!("expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn test_descriptor_equality_is_by_id() {
        let scheme = Scheme::from_json(ALL_TYPES).unwrap();
        let mut renamed = scheme.fields()[1].clone();
        renamed.name = "other".into();
        renamed.field_type = FieldType::Text;
        assert_eq!(renamed, scheme.fields()[1]);
        assert_ne!(scheme.fields()[0], scheme.fields()[1]);
    }

    #[test]
    fn test_specs_round_trip() {
        let scheme = Scheme::from_json(ALL_TYPES).unwrap();
        let json = serde_json::to_string(&scheme.to_specs()).unwrap();
        let again = Scheme::from_json(&json).unwrap();
        assert_eq!(again.to_specs(), scheme.to_specs());
    }
}
