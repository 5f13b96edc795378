use derive_new::new;
use serde::{Deserialize, Serialize};

/// A sparse numeric vector with a fixed dimension.
///
/// Indices are strictly increasing and always lower than `dim`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, new)]
pub struct SparseVector {
    /// The length of the dense equivalent
    pub dim: usize,

    /// Positions of the non-zero entries
    pub indices: Vec<u32>,

    /// Values of the non-zero entries
    pub values: Vec<f32>,
}

impl SparseVector {
    /// An all-zero vector of the given dimension
    pub fn zeros(dim: usize) -> Self {
        Self::new(dim, Vec::new(), Vec::new())
    }

    /// Build a vector from `(index, value)` pairs, summing duplicates and dropping zeros
    pub fn from_pairs(dim: usize, mut pairs: Vec<(u32, f32)>) -> Self {
        pairs.sort_unstable_by_key(|(index, _)| *index);

        let mut indices: Vec<u32> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f32> = Vec::with_capacity(pairs.len());

        for (index, value) in pairs {
            debug_assert!((index as usize) < dim);

            match indices.last() {
                Some(last) if *last == index => {
                    if let Some(v) = values.last_mut() {
                        *v += value;
                    }
                }
                _ => {
                    indices.push(index);
                    values.push(value);
                }
            }
        }

        let mut vector = Self::new(dim, Vec::with_capacity(indices.len()), Vec::new());
        for (index, value) in indices.into_iter().zip(values) {
            if value != 0.0 {
                vector.indices.push(index);
                vector.values.push(value);
            }
        }

        vector
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Iterate over `(index, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(i, v)| (*i as usize, *v))
    }

    /// Scale every entry so the chosen norm equals one. All-zero vectors are left alone.
    pub fn normalize(&mut self, norm: Norm) {
        let scale = match norm {
            Norm::None => return,
            Norm::L1 => self.values.iter().map(|v| v.abs()).sum::<f32>(),
            Norm::L2 => self.values.iter().map(|v| v * v).sum::<f32>().sqrt(),
            Norm::Infinity => self.values.iter().fold(0.0f32, |acc, v| acc.max(v.abs())),
        };

        if scale > 0.0 {
            for value in self.values.iter_mut() {
                *value /= scale;
            }
        }
    }

    /// Join vectors end to end, shifting the indices of each by the dimensions before it
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a SparseVector>) -> Self {
        let mut out = Self::zeros(0);

        for part in parts {
            let offset = out.dim as u32;
            out.indices.extend(part.indices.iter().map(|i| i + offset));
            out.values.extend_from_slice(&part.values);
            out.dim += part.dim;
        }

        out
    }

    /// Write the dense form into `row`, which must be `dim` long
    pub fn scatter_into(&self, row: &mut [f32]) {
        for (index, value) in self.iter() {
            row[index] = value;
        }
    }
}

/// Vector normalization applied after counting terms
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Norm {
    /// Leave raw counts
    None,
    /// Divide by the sum of absolute values
    L1,
    /// Divide by the euclidean length
    #[default]
    L2,
    /// Divide by the largest absolute value
    Infinity,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn from_pairs_sorts_and_merges() {
        let v = SparseVector::from_pairs(6, vec![(4, 1.0), (1, 2.0), (4, 2.0), (3, 0.0)]);

        assert_eq!(v, SparseVector::new(6, vec![1, 4], vec![2.0, 3.0]));
    }

    #[test]
    fn l2_normalization_gives_unit_length() {
        let mut v = SparseVector::new(3, vec![0, 2], vec![3.0, 4.0]);
        v.normalize(Norm::L2);

        assert_eq!(v.values, vec![0.6, 0.8]);
    }

    #[test]
    fn normalizing_zeros_is_a_no_op() {
        let mut v = SparseVector::zeros(4);
        v.normalize(Norm::L1);

        assert_eq!(v, SparseVector::zeros(4));
    }

    #[test]
    fn concat_offsets_later_parts() {
        let a = SparseVector::new(3, vec![2], vec![1.0]);
        let b = SparseVector::new(2, vec![0, 1], vec![5.0, 6.0]);

        let joined = SparseVector::concat([&a, &b]);

        assert_eq!(joined, SparseVector::new(5, vec![2, 3, 4], vec![1.0, 5.0, 6.0]));
    }
}
