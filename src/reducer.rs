//! Collapses a document into the text blob submitted for embedding.

use std::collections::BTreeSet;

use crate::document::{Document, FieldValue};

/// Field names skipped when building embedding text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedFields {
    names: BTreeSet<String>,
}

impl ExcludedFields {
    /// Exclusion set covering the identifier and vector fields.
    pub fn new(id_field: &str, vector_field: &str) -> Self {
        Self::from_names([id_field, vector_field])
    }

    /// Builds an exclusion set from arbitrary names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds another field to skip.
    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Whether `name` is skipped.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Joins the non-excluded field values of `document` with single spaces,
/// walking fields in insertion order. Sequences are themselves space-joined.
/// A document with nothing left to embed yields an empty string.
pub fn reduce(document: &Document, excluded: &ExcludedFields) -> String {
    document
        .fields()
        .filter(|(name, _)| !excluded.contains(name))
        .map(|(_, value)| render_value(value))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::List(items) => items.join(" "),
        FieldValue::Number(_) | FieldValue::Vector(_) => value.to_string(),
    }
}
