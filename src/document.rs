//! Structured documents loaded from a corpus snapshot.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single field value. Variant order matters for untagged decoding: an
/// empty array decodes as an empty `List`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Scalar string.
    Text(String),
    /// Scalar number, kept in its JSON form so integers stay integers.
    Number(serde_json::Number),
    /// Ordered sequence of strings (tags, genres, names).
    List(Vec<String>),
    /// Embedding vector attached by the batch pipeline.
    Vector(Vec<f32>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::List(items) => f.write_str(&items.join(" ")),
            FieldValue::Vector(values) => {
                let mut first = true;
                for value in values {
                    if !first {
                        f.write_str(" ")?;
                    }
                    write!(f, "{value}")?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// Field name to value mapping that keeps the order fields were read in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: IndexMap<String, FieldValue>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert used by tests and fixtures.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Iterates fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Identifier rendered as a string, when present and scalar.
    pub fn id(&self, id_field: &str) -> Option<String> {
        match self.fields.get(id_field)? {
            value @ (FieldValue::Text(_) | FieldValue::Number(_)) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Embedding stored under `field`, if any.
    pub fn vector(&self, field: &str) -> Option<&[f32]> {
        match self.fields.get(field)? {
            FieldValue::Vector(values) => Some(values),
            _ => None,
        }
    }

    /// Stores `vector` under `field`. A new field lands after every existing
    /// one; an existing vector field is overwritten in place.
    pub fn set_vector(&mut self, field: &str, vector: Vec<f32>) {
        self.fields
            .insert(field.to_string(), FieldValue::Vector(vector));
    }
}
