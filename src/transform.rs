//! Index transforms: the affine/array-indexed map from an integer input box to an output tuple.

use crate::array::IndexArrayData;
use crate::error::{Error, Result};
use crate::interval::{checked_add, checked_mul, Index};
use crate::region::IndexBox;
use std::rc::Rc;

/// One output coordinate's computation rule.
///
/// `Rc`, not `Arc`: per the crate's concurrency model the partitioner runs single-threaded per
/// call, and array payloads are never shared across threads.
#[derive(Clone, Debug)]
pub enum OutputIndexMap {
    /// `output = c`, regardless of input.
    Constant(Index),
    /// `output = offset + stride * input[input_dim]`. `stride` is nonzero.
    SingleInputDimension {
        /// Additive offset.
        offset: Index,
        /// Nonzero multiplicative coefficient; the sign determines direction.
        stride: Index,
        /// The input dimension read.
        input_dim: usize,
    },
    /// `output = offset + stride * array[project(input, input_dims)]`.
    IndexArray {
        /// Additive offset.
        offset: Index,
        /// Nonzero multiplicative coefficient.
        stride: Index,
        /// The backing array, shared with other output maps or cell transforms that read it.
        array: Rc<IndexArrayData>,
        /// The input dimensions the array is indexed by, in array-dimension order.
        input_dims: Vec<usize>,
    },
}

impl OutputIndexMap {
    /// The input dimensions this map reads from.
    #[must_use]
    pub fn input_dims(&self) -> Vec<usize> {
        match self {
            Self::Constant(_) => vec![],
            Self::SingleInputDimension { input_dim, .. } => vec![*input_dim],
            Self::IndexArray { input_dims, .. } => input_dims.clone(),
        }
    }

    /// Evaluates the map at a single (fully specified) input point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] on arithmetic overflow, or [`Error::InvalidArgument`] if
    /// an `IndexArray` read falls outside the array's declared domain.
    pub fn evaluate(&self, input: &[Index]) -> Result<Index> {
        match self {
            Self::Constant(c) => Ok(*c),
            Self::SingleInputDimension {
                offset,
                stride,
                input_dim,
            } => checked_add(*offset, checked_mul(*stride, input[*input_dim])?),
            Self::IndexArray {
                offset,
                stride,
                array,
                input_dims,
            } => {
                let coords: Vec<Index> = input_dims.iter().map(|&d| input[d]).collect();
                let value = array.get(&coords)?;
                checked_add(*offset, checked_mul(*stride, value)?)
            }
        }
    }

    /// A safe (possibly loose) bound on the values this map can produce, used at construction
    /// time to detect overflow without enumerating the input domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] on overflow while composing the bound.
    fn value_bound(&self, input_box: &IndexBox) -> Result<Option<(Index, Index)>> {
        match self {
            Self::Constant(c) => Ok(Some((*c, *c))),
            Self::SingleInputDimension {
                offset,
                stride,
                input_dim,
            } => {
                let iv = input_box.interval(*input_dim);
                if iv.is_empty() {
                    return Ok(None);
                }
                let lo = iv.origin();
                let hi = iv.exclusive_max() - 1;
                let a = checked_add(*offset, checked_mul(*stride, lo)?)?;
                let b = checked_add(*offset, checked_mul(*stride, hi)?)?;
                Ok(Some((a.min(b), a.max(b))))
            }
            Self::IndexArray {
                offset,
                stride,
                array,
                ..
            } => {
                let Some((lo, hi)) = array.value_range() else {
                    return Ok(None);
                };
                let a = checked_add(*offset, checked_mul(*stride, lo)?)?;
                let b = checked_add(*offset, checked_mul(*stride, hi)?)?;
                Ok(Some((a.min(b), a.max(b))))
            }
        }
    }
}

/// A structured map from an integer input box of rank `N_in` to an output tuple of rank `M`.
#[derive(Clone, Debug)]
pub struct IndexTransform {
    input_box: IndexBox,
    output_maps: Vec<OutputIndexMap>,
}

impl IndexTransform {
    /// Builds a transform, validating that every referenced input dimension is in range and
    /// that no output map can overflow `Index` arithmetic anywhere in the input box.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if an output map references an input dimension `>=
    /// input_box.rank()`, or [`Error::OutOfRange`] if an output map's value range overflows.
    pub fn new(input_box: IndexBox, output_maps: Vec<OutputIndexMap>) -> Result<Self> {
        for map in &output_maps {
            for dim in map.input_dims() {
                if dim >= input_box.rank() {
                    return Err(Error::InvalidArgument(format!(
                        "output map references input dimension {dim}, but the input box has \
                         rank {}",
                        input_box.rank()
                    )));
                }
            }
            if let OutputIndexMap::SingleInputDimension { stride, .. }
            | OutputIndexMap::IndexArray { stride, .. } = map
            {
                if *stride == 0 {
                    return Err(Error::InvalidArgument(
                        "output map stride must be nonzero".to_string(),
                    ));
                }
            }
            // Only used for its overflow-detecting side effect; an empty input box means there
            // are no points to evaluate, so no bound (and hence no overflow) is possible.
            map.value_bound(&input_box)?;
        }
        Ok(Self {
            input_box,
            output_maps,
        })
    }

    /// The input box, of rank `N_in`.
    #[must_use]
    pub const fn input_box(&self) -> &IndexBox {
        &self.input_box
    }

    /// The output maps, of length `M`.
    #[must_use]
    pub fn output_maps(&self) -> &[OutputIndexMap] {
        &self.output_maps
    }

    /// The input rank, `N_in`.
    #[must_use]
    pub fn input_rank(&self) -> usize {
        self.input_box.rank()
    }

    /// The output rank, `M`.
    #[must_use]
    pub fn output_rank(&self) -> usize {
        self.output_maps.len()
    }

    /// Evaluates every output map at a single input point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] or [`Error::InvalidArgument`], see
    /// [`OutputIndexMap::evaluate`].
    pub fn apply_point(&self, input: &[Index]) -> Result<Vec<Index>> {
        self.output_maps.iter().map(|m| m.evaluate(input)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::IndexInterval;

    fn iv(origin: Index, size: Index) -> IndexInterval {
        IndexInterval::sized(origin, size).unwrap()
    }

    #[test]
    fn identity_transform_applies() {
        let t = IndexTransform::new(
            IndexBox::new(vec![iv(0, 10)]),
            vec![OutputIndexMap::SingleInputDimension {
                offset: 0,
                stride: 1,
                input_dim: 0,
            }],
        )
        .unwrap();
        assert_eq!(t.apply_point(&[4]).unwrap(), vec![4]);
    }

    #[test]
    fn rejects_out_of_range_input_dim() {
        let result = IndexTransform::new(
            IndexBox::new(vec![iv(0, 10)]),
            vec![OutputIndexMap::SingleInputDimension {
                offset: 0,
                stride: 1,
                input_dim: 1,
            }],
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_overflowing_transform() {
        let result = IndexTransform::new(
            IndexBox::new(vec![iv(Index::MAX - 1, 2)]),
            vec![OutputIndexMap::SingleInputDimension {
                offset: 1,
                stride: 1,
                input_dim: 0,
            }],
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_box_never_overflows() {
        let result = IndexTransform::new(
            IndexBox::new(vec![iv(0, 0)]),
            vec![OutputIndexMap::SingleInputDimension {
                offset: Index::MAX,
                stride: Index::MAX,
                input_dim: 0,
            }],
        );
        assert!(result.is_ok());
    }
}
