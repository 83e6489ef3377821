//! Search gateway: sends encoded KNN queries to a backend and returns hits
//! in the backend's ranking order.

pub mod solr;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};

/// Identifier field Solr documents are keyed by.
pub const ID_FIELD: &str = "id";
/// Pseudo-field carrying the similarity score.
pub const SCORE_FIELD: &str = "score";

/// One query call: encoded query text, row limit and field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    rows: usize,
    fields: Vec<String>,
}

impl SearchRequest {
    /// Builds a request. The identifier and score fields are always
    /// requested, appended after the caller's fields when missing.
    pub fn new<I, S>(query: String, rows: usize, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if rows == 0 {
            return Err(Error::InvalidQuery("row limit must be a positive integer".into()));
        }
        let mut fields: Vec<String> = fields
            .into_iter()
            .map(Into::into)
            .filter(|field: &String| !field.trim().is_empty())
            .collect();
        for required in [ID_FIELD, SCORE_FIELD] {
            if !fields.iter().any(|field| field == required) {
                fields.push(required.to_string());
            }
        }
        Ok(Self {
            query,
            rows,
            fields,
        })
    }

    /// Encoded query string.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Maximum number of hits to return.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Fields returned per hit.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// A scored record returned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Document identifier.
    pub id: String,
    /// Similarity score, when the backend reports one.
    pub score: Option<f64>,
    /// Remaining requested fields, in response order.
    pub fields: IndexMap<String, Value>,
}

impl SearchHit {
    /// Renders a display field as plain text (`None` when absent).
    pub fn text(&self, field: &str) -> Option<String> {
        self.fields.get(field).map(display_value)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Query to ranked results boundary.
pub trait SearchBackend: Send + Sync {
    /// Executes `request`, returning hits ordered by descending similarity.
    fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>>;
}

/// Runs `request` against `backend`, enforcing the row limit without
/// reordering what the backend ranked.
pub fn run_search(backend: &dyn SearchBackend, request: &SearchRequest) -> Result<Vec<SearchHit>> {
    let mut hits = backend.search(request)?;
    if hits.len() > request.rows() {
        warn!(
            returned = hits.len(),
            rows = request.rows(),
            "backend returned more rows than requested; truncating"
        );
        hits.truncate(request.rows());
    }
    Ok(hits)
}
