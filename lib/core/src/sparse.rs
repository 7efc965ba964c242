use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sparse term-count vector with strictly increasing indices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    /// Build from unordered `(index, value)` pairs. Duplicate indices are summed
    /// and zero entries dropped.
    pub fn from_pairs(mut pairs: Vec<(u32, f32)>) -> Self {
        pairs.sort_unstable_by_key(|(idx, _)| *idx);

        let mut indices: Vec<u32> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f32> = Vec::with_capacity(pairs.len());
        for (idx, value) in pairs {
            match indices.last() {
                Some(&last) if last == idx => {
                    if let Some(v) = values.last_mut() {
                        *v += value;
                    }
                }
                _ => {
                    indices.push(idx);
                    values.push(value);
                }
            }
        }

        let mut vector = Self { indices, values };
        vector.retain_nonzero();
        vector
    }

    fn retain_nonzero(&mut self) {
        if self.values.iter().all(|v| *v != 0.0) {
            return;
        }
        let (indices, values) = self
            .indices
            .iter()
            .zip(self.values.iter())
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, v)| (*i, *v))
            .unzip();
        self.indices = indices;
        self.values = values;
    }

    #[inline]
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Dot product by merging the two index lists
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Cosine similarity; zero when either side has zero norm
    pub fn cosine_similarity(&self, other: &SparseVector) -> f32 {
        let norm_a = self.norm();
        let norm_b = other.norm();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        (self.dot(other) / (norm_a * norm_b)).clamp(0.0, 1.0)
    }

    /// Jaccard overlap of the two term sets; zero when both are empty
    pub fn jaccard_similarity(&self, other: &SparseVector) -> f32 {
        let shared = self.shared_terms(other);
        let union = self.nnz() + other.nnz() - shared;
        if union == 0 {
            return 0.0;
        }
        shared as f32 / union as f32
    }

    fn shared_terms(&self, other: &SparseVector) -> usize {
        let (mut i, mut j, mut shared) = (0, 0, 0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    shared += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_sorts_and_merges() {
        let v = SparseVector::from_pairs(vec![(3, 1.0), (1, 2.0), (3, 1.0), (7, 0.0)]);
        assert_eq!(v.indices(), &[1, 3]);
        assert_eq!(v.values(), &[2.0, 2.0]);
    }

    #[test]
    fn test_dot_and_norm() {
        let a = SparseVector::from_pairs(vec![(0, 1.0), (2, 2.0)]);
        let b = SparseVector::from_pairs(vec![(2, 3.0), (5, 4.0)]);
        assert!((a.dot(&b) - 6.0).abs() < 1e-6);
        assert!((b.norm() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = SparseVector::from_pairs(vec![(0, 1.0)]);
        let b = SparseVector::from_pairs(vec![(0, 3.0)]);
        let c = SparseVector::from_pairs(vec![(1, 1.0)]);
        assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-6);
        assert_eq!(a.cosine_similarity(&c), 0.0);
    }

    #[test]
    fn test_zero_norm_is_zero_not_nan() {
        let empty = SparseVector::default();
        let a = SparseVector::from_pairs(vec![(0, 1.0)]);
        assert_eq!(empty.cosine_similarity(&a), 0.0);
        assert_eq!(a.cosine_similarity(&empty), 0.0);
        assert_eq!(empty.cosine_similarity(&empty), 0.0);
        assert_eq!(empty.jaccard_similarity(&empty), 0.0);
    }

    #[test]
    fn test_jaccard_similarity() {
        let a = SparseVector::from_pairs(vec![(0, 1.0), (1, 5.0)]);
        let b = SparseVector::from_pairs(vec![(1, 1.0), (2, 1.0)]);
        assert!((a.jaccard_similarity(&b) - 1.0 / 3.0).abs() < 1e-6);
    }
}
