//! Discovery of tenant-specific `customfield_*` values.
//!
//! Jira names custom fields by instance-local ids, so they cannot be bound to
//! the static [`Fields`](super::models::Fields) schema. The extractor walks the
//! fields object of a payload and keeps every custom field whose value is a
//! number or a string.

use std::collections::BTreeMap;

use serde_json::Value;

pub const CUSTOM_FIELD_PREFIX: &str = "customfield_";

/// Typed value of a scalar custom field.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomValue {
    Number(f64),
    Text(String),
}

impl CustomValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "string",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Why a custom field could not be read as the requested type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("custom field {field} is missing")]
    Missing { field: String },

    #[error("custom field {field} is a {found}, expected a {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Scalar custom fields of one issue, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomFields(BTreeMap<String, CustomValue>);

impl CustomFields {
    pub fn get(&self, field: &str) -> Option<&CustomValue> {
        self.0.get(field)
    }

    pub fn number(&self, field: &str) -> Result<f64, FieldError> {
        match self.lookup(field)? {
            CustomValue::Number(n) => Ok(*n),
            other => Err(wrong_type(field, "number", other)),
        }
    }

    pub fn text(&self, field: &str) -> Result<&str, FieldError> {
        match self.lookup(field)? {
            CustomValue::Text(s) => Ok(s),
            other => Err(wrong_type(field, "string", other)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CustomValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn lookup(&self, field: &str) -> Result<&CustomValue, FieldError> {
        self.0.get(field).ok_or_else(|| FieldError::Missing {
            field: field.to_owned(),
        })
    }
}

impl FromIterator<(String, CustomValue)> for CustomFields {
    fn from_iter<I: IntoIterator<Item = (String, CustomValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn wrong_type(field: &str, expected: &'static str, found: &CustomValue) -> FieldError {
    FieldError::WrongType {
        field: field.to_owned(),
        expected,
        found: found.kind(),
    }
}

/// Extract the scalar custom fields found under `path` in a raw JSON payload.
pub fn extract_custom_fields(payload: &[u8], path: &[&str]) -> Result<CustomFields, DecodeError> {
    let root: Value = serde_json::from_slice(payload)?;
    Ok(custom_fields_at(&root, path))
}

/// Same as [`extract_custom_fields`] for an already parsed document.
///
/// A path that does not lead to an object yields an empty map. Only the
/// immediate children of that object are inspected. Numbers that overflow f64
/// never get here: the JSON parser already rejects them as malformed.
pub fn custom_fields_at(root: &Value, path: &[&str]) -> CustomFields {
    let mut node = root;
    for segment in path {
        match node.get(*segment) {
            Some(child) => node = child,
            None => return CustomFields::default(),
        }
    }
    let Some(object) = node.as_object() else {
        return CustomFields::default();
    };

    let mut fields = BTreeMap::new();
    for (key, value) in object {
        if !key.starts_with(CUSTOM_FIELD_PREFIX) {
            continue;
        }
        match value {
            Value::Number(n) => {
                if let Some(n) = n.as_f64() {
                    fields.insert(key.clone(), CustomValue::Number(n));
                }
            }
            Value::String(s) => {
                fields.insert(key.clone(), CustomValue::Text(s.clone()));
            }
            // objects, arrays, bools and nulls are not needed downstream
            _ => {}
        }
    }

    CustomFields(fields)
}
