use std::fmt::Write;

use crate::error::{VectorError, VectorResult};

/// A dense embedding produced for one piece of text.
///
/// Always non-empty with finite components; construction enforces both.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector {
    values: Vec<f32>,
}

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> VectorResult<Self> {
        if values.is_empty() {
            return Err(VectorError::InvalidVector("vector is empty".to_string()));
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(VectorError::InvalidVector(format!(
                "component {} is not a finite number",
                index
            )));
        }
        Ok(Self { values })
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.values
    }

    pub fn ensure_dimension(&self, expected: usize) -> VectorResult<()> {
        if self.dimension() != expected {
            return Err(VectorError::DimensionMismatch {
                expected,
                actual: self.dimension(),
            });
        }
        Ok(())
    }

    /// Text literal accepted by libSQL's `vector32()`, e.g. `[0.1,-2,3.5]`.
    pub fn to_literal(&self) -> String {
        let mut out = String::with_capacity(self.values.len() * 10 + 2);
        out.push('[');
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            // f32 Display never emits exponents or NaN here.
            let _ = write!(out, "{}", value);
        }
        out.push(']');
        out
    }
}

impl TryFrom<Vec<f32>> for EmbeddingVector {
    type Error = VectorError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}
