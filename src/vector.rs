//! This is the vector math module
//! Provide the embedding type, L2 normalization, dot product and cosine similarity

use crate::error::{VectorError, VectorResult};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// A text embedding: an immutable sequence of `f64` components.
///
/// Embeddings produced by [`embed`](crate::embed) are unit-length and have
/// [`EMBEDDING_DIM`](crate::EMBEDDING_DIM) components. Serializes as a plain
/// JSON array of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f64>);

impl Embedding {
    /// Wraps raw components without normalizing them.
    pub fn new(values: Vec<f64>) -> Self {
        Embedding(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl Deref for Embedding {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

/// Euclidean magnitude
/// ||vec|| = sqrt(sum(vec[i]^2))
pub fn magnitude(vector: &[f64]) -> f64 {
    vector.iter()
        .map(|x| x * x)
        .sum::<f64>()
        .sqrt()
}

/// L2 Normalization
/// norm_vec = vec / ||vec||
/// A zero-magnitude (or empty) vector comes back as zeros of the same length
pub fn l2_normalize(vector: &[f64]) -> Vec<f64> {
    let norm = magnitude(vector);

    if norm == 0.0 {
        return vec![0.0; vector.len()];
    }

    vector.iter()
        .map(|x| x / norm)
        .collect()
}

/// Dot Product
/// dot_prod = sum(a[i] * b[i]) for i = 0..a.len()
/// Can only process vectors with same dimensions
pub fn dot_product(left: &[f64], right: &[f64]) -> VectorResult<f64> {
    if left.len() != right.len() {
        return Err(VectorError::DimensionMismatch { left: left.len(), right: right.len() });
    }

    let dot_prod = left.iter()
        .zip(right.iter())
        .map(|(x, y)| x * y)
        .sum();

    Ok(dot_prod)
}

/// Cosine Similarity
/// cos = dot(a, b) / (||a|| * ||b||)
/// Returns 0 when either vector has zero magnitude
pub fn cosine_similarity(left: &[f64], right: &[f64]) -> VectorResult<f64> {
    let dot_prod = dot_product(left, right)?;
    let mag_left = magnitude(left);
    let mag_right = magnitude(right);

    if mag_left == 0.0 || mag_right == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_prod / (mag_left * mag_right))
}
