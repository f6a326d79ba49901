//! The array payload behind an [`crate::transform::OutputIndexMap::IndexArray`] output map.

use crate::error::{Error, Result};
use crate::interval::Index;
use ndarray::ArrayD;

/// A multidimensional array of [`Index`] values with a per-dimension origin offset.
///
/// The array's declared domain along dimension `d` is `[origin[d], origin[d] + shape[d])`,
/// where `shape` is the backing `ndarray`'s shape.
#[derive(Clone, Debug)]
pub struct IndexArrayData {
    origin: Vec<Index>,
    values: ArrayD<Index>,
}

impl IndexArrayData {
    /// Builds an array from its origin and backing storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `origin.len()` does not match the array's rank.
    pub fn new(origin: Vec<Index>, values: ArrayD<Index>) -> Result<Self> {
        if origin.len() != values.ndim() {
            return Err(Error::InvalidArgument(format!(
                "index array origin has rank {} but the backing array has rank {}",
                origin.len(),
                values.ndim()
            )));
        }
        Ok(Self { origin, values })
    }

    /// The rank of the array.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.values.ndim()
    }

    /// The origin offset along dimension `dim`.
    #[must_use]
    pub fn origin(&self, dim: usize) -> Index {
        self.origin[dim]
    }

    /// The declared domain shape along dimension `dim`.
    #[must_use]
    pub fn shape(&self, dim: usize) -> Index {
        // ndarray shapes are usize but always small enough to fit Index (i64) in practice;
        // this crate never constructs arrays larger than isize::MAX elements per dimension.
        Index::try_from(self.values.shape()[dim]).unwrap_or(Index::MAX)
    }

    /// Reads the array at `coords`, an absolute-coordinate point (not relative to `origin`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `coords` falls outside the array's declared
    /// domain.
    pub fn get(&self, coords: &[Index]) -> Result<Index> {
        if coords.len() != self.rank() {
            return Err(Error::InvalidArgument(format!(
                "expected {} coordinates, got {}",
                self.rank(),
                coords.len()
            )));
        }
        let mut relative = Vec::with_capacity(coords.len());
        for (dim, &c) in coords.iter().enumerate() {
            let rel = c - self.origin[dim];
            if rel < 0 || rel >= self.shape(dim) {
                return Err(Error::InvalidArgument(format!(
                    "coordinate {c} on dimension {dim} is outside the array's domain \
                     [{}, {})",
                    self.origin[dim],
                    self.origin[dim] + self.shape(dim)
                )));
            }
            // `rel` was just bounds-checked against `shape(dim)`, itself derived from a usize.
            relative.push(rel as usize);
        }
        Ok(self.values[relative.as_slice()])
    }

    /// The `(min, max)` values stored in the array, used to bound an output map's range without
    /// enumerating the whole input domain. Returns `None` for an empty array.
    #[must_use]
    pub fn value_range(&self) -> Option<(Index, Index)> {
        let mut iter = self.values.iter();
        let first = *iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))))
    }
}
