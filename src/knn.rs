//! Encodes query vectors into Solr's `{!knn}` query-parser syntax.

use crate::error::{Error, Result};
use crate::vector;

/// Neighbor count used when callers do not pick one.
pub const DEFAULT_TOP_K: usize = 10;

/// A validated KNN clause, built per search call.
#[derive(Debug, Clone, PartialEq)]
pub struct KnnQuery<'a> {
    field: &'a str,
    top_k: usize,
    vector: &'a [f32],
}

impl<'a> KnnQuery<'a> {
    /// Validates the clause components against the field's dimensionality.
    pub fn new(vector: &'a [f32], field: &'a str, top_k: usize, dimensions: usize) -> Result<Self> {
        vector::validate(vector, dimensions)?;
        if field.trim().is_empty() {
            return Err(Error::InvalidQuery("vector field name is required".into()));
        }
        if field.chars().any(|ch| ch.is_whitespace() || ch == '}') {
            return Err(Error::InvalidQuery(format!(
                "vector field name {field:?} cannot contain whitespace or '}}'"
            )));
        }
        if top_k == 0 {
            return Err(Error::InvalidQuery("topK must be a positive integer".into()));
        }
        Ok(Self {
            field,
            top_k,
            vector,
        })
    }

    /// Target vector field.
    pub fn field(&self) -> &str {
        self.field
    }

    /// Requested neighbor count.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Renders `{!knn f=<field> topK=<k>}[v0,v1,...]`.
    pub fn encode(&self) -> Result<String> {
        let literal = serde_json::to_string(self.vector)
            .map_err(|err| Error::InvalidQuery(format!("failed to serialize vector: {err}")))?;
        Ok(format!(
            "{{!knn f={} topK={}}}{}",
            self.field, self.top_k, literal
        ))
    }
}

/// Validates and encodes a KNN query string in one step.
pub fn encode_knn(vector: &[f32], field: &str, top_k: usize, dimensions: usize) -> Result<String> {
    KnnQuery::new(vector, field, top_k, dimensions)?.encode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::DEFAULT_DIMENSIONS;

    fn sample_vector(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32) / 1000.0 - 0.5).collect()
    }

    #[test]
    fn encodes_full_dimension_vector() {
        let vector = sample_vector(DEFAULT_DIMENSIONS);
        let query = encode_knn(&vector, "film_vector", 5, DEFAULT_DIMENSIONS).expect("encodes");
        assert!(query.starts_with("{!knn f=film_vector topK=5}["));
        let literal = &query[query.find('}').expect("clause close") + 1..];
        let decoded: Vec<f32> = serde_json::from_str(literal).expect("array literal");
        assert_eq!(decoded.len(), DEFAULT_DIMENSIONS);
        assert_eq!(decoded, vector);
    }

    #[test]
    fn round_trips_awkward_floats() {
        let vector: Vec<f32> = vec![0.1, -0.000_012_345, 1.0e-30, 3.402_823e38, -0.0];
        let query = encode_knn(&vector, "v", 1, vector.len()).expect("encodes");
        let literal = &query["{!knn f=v topK=1}".len()..];
        let decoded: Vec<f32> = serde_json::from_str(literal).expect("array literal");
        assert_eq!(decoded, vector);
    }

    #[test]
    fn rejects_wrong_dimension_before_encoding() {
        let err = encode_knn(&sample_vector(42), "film_vector", 10, DEFAULT_DIMENSIONS)
            .expect_err("short vector");
        assert_eq!(err.to_string(), "dimension mismatch: expected 1536, got 42");
    }

    #[test]
    fn rejects_bad_field_and_top_k() {
        let vector = sample_vector(4);
        assert!(matches!(
            encode_knn(&vector, " ", 10, 4),
            Err(Error::InvalidQuery(_))
        ));
        assert!(matches!(
            encode_knn(&vector, "a b", 10, 4),
            Err(Error::InvalidQuery(_))
        ));
        assert!(matches!(
            encode_knn(&vector, "film_vector", 0, 4),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn empty_vector_for_zero_dimensions_is_never_encoded() {
        assert!(matches!(
            encode_knn(&[], "film_vector", 10, 0),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn exposes_clause_parts() {
        let vector = sample_vector(2);
        let query = KnnQuery::new(&vector, "film_vector", 3, 2).expect("valid");
        assert_eq!(query.field(), "film_vector");
        assert_eq!(query.top_k(), 3);
    }
}
