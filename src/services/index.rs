//! Per-request cosine similarity index over document chunks.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::Serialize;

use crate::error::IndexError;
use crate::models::TextChunk;

/// A chunk returned by [`VectorIndex::search`] with its cosine score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: TextChunk,
    pub score: f32,
}

/// In-memory index built from `(chunk, vector)` pairs.
///
/// Rows of `vectors` are L2-normalised at build time, so a search is a single
/// matrix-vector product against the normalised query.
#[derive(Debug)]
pub struct VectorIndex {
    chunks: Vec<TextChunk>,
    vectors: Array2<f32>,
}

impl VectorIndex {
    pub fn build(chunks: Vec<TextChunk>, vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        if chunks.len() != vectors.len() {
            return Err(IndexError::LengthMismatch {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }

        let dim = vectors.first().map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(IndexError::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }

        let rows = vectors.len();
        let flat: Vec<f32> = vectors.into_iter().flatten().collect();
        let mut matrix = Array2::from_shape_vec((rows, dim), flat)
            .map_err(|e| IndexError::ShapeError(e.to_string()))?;

        for mut row in matrix.axis_iter_mut(Axis(0)) {
            let norm = l2_norm(row.view());
            if norm > 0.0 {
                row /= norm;
            }
        }

        Ok(Self {
            chunks,
            vectors: matrix,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    /// Return up to `k` chunks ordered by descending cosine similarity.
    ///
    /// Equal scores keep ascending chunk order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension() {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }

        let mut query = Array1::from_vec(query.to_vec());
        let norm = l2_norm(query.view());
        if norm > 0.0 {
            query /= norm;
        }

        let scores = self.vectors.dot(&query);
        let mut ranked: Vec<(usize, f32)> = scores
            .iter()
            .map(|&s| if s.is_finite() { s } else { 0.0 })
            .enumerate()
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }
}

fn l2_norm(v: ArrayView1<f32>) -> f32 {
    v.dot(&v).sqrt()
}
