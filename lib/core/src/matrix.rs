//! Dense pairwise similarity matrix and its offline builder

use rayon::prelude::*;
use std::time::Instant;

use crate::config::Metric;
use crate::sparse::SparseVector;
use crate::{Error, Result};

/// Square, symmetric, row-major `N x N` similarity matrix
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    data: Vec<f32>,
}

impl SimilarityMatrix {
    /// Wrap a row-major buffer, checking its length and that every value is finite
    pub fn from_raw(n: usize, data: Vec<f32>) -> Result<Self> {
        let expected = n
            .checked_mul(n)
            .ok_or_else(|| Error::Persistence(format!("matrix size {} overflows", n)))?;
        if data.len() != expected {
            return Err(Error::Persistence(format!(
                "matrix buffer holds {} values, expected {} for n = {}",
                data.len(),
                expected,
                n
            )));
        }
        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(Error::Persistence(format!(
                "non-finite similarity at row {}, column {}",
                pos / n,
                pos % n
            )));
        }
        Ok(Self { n, data })
    }

    /// Build from explicit rows; rejects ragged or asymmetric input
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let n = rows.len();
        if let Some(bad) = rows.iter().position(|row| row.len() != n) {
            return Err(Error::InvalidRequest(format!(
                "row {} has {} columns, expected {}",
                bad,
                rows[bad].len(),
                n
            )));
        }
        let matrix = Self::from_raw(n, rows.into_iter().flatten().collect())?;
        matrix.check_symmetric()?;
        Ok(matrix)
    }

    pub fn check_symmetric(&self) -> Result<()> {
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                if self.get(i, j) != self.get(j, i) {
                    return Err(Error::InvalidRequest(format!(
                        "matrix is not symmetric at ({}, {})",
                        i, j
                    )));
                }
            }
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Similarity of item `i` to item `j`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.n + j]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Compute the full pairwise matrix for `vectors`.
///
/// Only the upper triangle is evaluated (rows in parallel) and then mirrored,
/// so `M[i][j]` and `M[j][i]` are the same value. The diagonal is 1.0, the
/// metric's maximum, for every item including ones with an empty vector.
pub fn build_similarity(vectors: &[SparseVector], metric: Metric) -> Result<SimilarityMatrix> {
    let n = vectors.len();
    if n == 0 {
        return Err(Error::ModelBuild("catalog is empty".to_string()));
    }

    let started = Instant::now();
    let norms: Vec<f32> = vectors.iter().map(SparseVector::norm).collect();

    let upper: Vec<Vec<f32>> = (0..n)
        .into_par_iter()
        .map(|i| {
            ((i + 1)..n)
                .map(|j| match metric {
                    Metric::Cosine => cosine(&vectors[i], &vectors[j], norms[i], norms[j]),
                    Metric::Jaccard => vectors[i].jaccard_similarity(&vectors[j]),
                })
                .collect()
        })
        .collect();

    let mut data = vec![0.0f32; n * n];
    for (i, row) in upper.into_iter().enumerate() {
        data[i * n + i] = 1.0;
        for (offset, score) in row.into_iter().enumerate() {
            let j = i + 1 + offset;
            data[i * n + j] = score;
            data[j * n + i] = score;
        }
    }

    let empty = vectors.iter().filter(|v| v.is_empty()).count();
    tracing::info!(
        items = n,
        empty_vectors = empty,
        metric = %metric,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Built similarity matrix"
    );

    SimilarityMatrix::from_raw(n, data)
}

#[inline]
fn cosine(a: &SparseVector, b: &SparseVector, norm_a: f32, norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(b) / (norm_a * norm_b)).clamp(0.0, 1.0)
}
