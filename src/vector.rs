//! Embedding vector validation and parsing.

use crate::error::{Error, Result};

/// Dimensionality of `text-embedding-3-small` vectors.
pub const DEFAULT_DIMENSIONS: usize = 1536;

/// Checks that `vector` has exactly `expected` finite components.
///
/// A zero `expected` is a configuration error: no KNN field has zero
/// dimensions.
pub fn validate(vector: &[f32], expected: usize) -> Result<()> {
    if expected == 0 {
        return Err(Error::Configuration(
            "vector dimensionality must be positive".into(),
        ));
    }
    if vector.len() != expected {
        return Err(Error::Dimension {
            expected,
            actual: vector.len(),
        });
    }
    if let Some(position) = vector.iter().position(|value| !value.is_finite()) {
        return Err(Error::InvalidQuery(format!(
            "vector component {position} is not a finite number"
        )));
    }
    Ok(())
}

/// Parses a JSON array literal such as `[0.3, 0.5, ...]` and validates its
/// length against `expected`.
pub fn parse_literal(input: &str, expected: usize) -> Result<Vec<f32>> {
    let value: serde_json::Value = serde_json::from_str(input.trim())
        .map_err(|err| Error::InvalidQuery(format!("vector is not valid JSON: {err}")))?;
    let items = value.as_array().ok_or_else(|| {
        Error::InvalidQuery(format!(
            "vector must be a list with exactly {expected} dimensions, got {}",
            describe_json(&value)
        ))
    })?;
    let vector = items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            item.as_f64().map(|v| v as f32).ok_or_else(|| {
                Error::InvalidQuery(format!("vector component {position} is not a number"))
            })
        })
        .collect::<Result<Vec<f32>>>()?;
    validate(&vector, expected)?;
    Ok(vector)
}

fn describe_json(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_dimension() {
        assert!(validate(&vec![0.0f32; DEFAULT_DIMENSIONS], DEFAULT_DIMENSIONS).is_ok());
    }

    #[test]
    fn rejects_short_vector_with_lengths() {
        let err = validate(&[0.1; 42], DEFAULT_DIMENSIONS).expect_err("too short");
        assert!(matches!(
            err,
            Error::Dimension {
                expected: 1536,
                actual: 42
            }
        ));
        assert!(err.to_string().contains("expected 1536, got 42"));
    }

    #[test]
    fn rejects_non_finite_components() {
        let err = validate(&[0.1, f32::NAN], 2).expect_err("nan rejected");
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn zero_dimensionality_is_configuration_error() {
        assert!(matches!(validate(&[], 0), Err(Error::Configuration(_))));
        assert!(matches!(
            parse_literal("[]", 0),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn parses_multiline_literal() {
        let vector = parse_literal("[0.5,\n -1.0, 2]", 3).expect("parses");
        assert_eq!(vector, vec![0.5f32, -1.0, 2.0]);
    }

    #[test]
    fn parse_rejects_wrong_length_and_shape() {
        assert!(matches!(
            parse_literal("[1, 2]", 3),
            Err(Error::Dimension {
                expected: 3,
                actual: 2
            })
        ));
        let err = parse_literal(r#"{"a": 1}"#, 3).expect_err("object rejected");
        assert!(err.to_string().contains("an object"));
        assert!(matches!(
            parse_literal(r#"[1, "x", 3]"#, 3),
            Err(Error::InvalidQuery(_))
        ));
        assert!(matches!(parse_literal("[1, 2", 3), Err(Error::InvalidQuery(_))));
    }
}
