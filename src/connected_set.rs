//! The [`ConnectedSet`] data model: groups of `(input dim, grid dim)` coupled through output maps.

use crate::interval::{Index, IndexInterval};
use std::rc::Rc;

/// One grid dimension's affine member inside a [`ConnectedSetKind::Strided`] set.
#[derive(Clone, Debug)]
pub enum StridedMember {
    /// The output map is `Constant`; the member contributes no input-dimension coupling.
    Constant {
        /// The constant output value.
        value: Index,
    },
    /// The output map is `SingleInputDimension`, sharing the set's one input dimension.
    Affine {
        /// Additive offset.
        offset: Index,
        /// Nonzero multiplicative coefficient.
        stride: Index,
    },
}

/// One deduplicated group of input-coordinate rows sharing a cell-index tuple, inside a
/// [`ConnectedSetKind::IndexArrayRows`] set.
#[derive(Clone, Debug)]
pub struct RowGroup {
    /// The cell indices this group covers, aligned to the set's `grid_dims` order.
    pub cell_indices: Vec<Index>,
    /// The input-coordinate rows falling in this cell, each aligned to the set's `input_dims`
    /// order. Row order within a group is established during deduplication and is not otherwise
    /// meaningful (see the crate-level note on row-order stability).
    pub rows: Rc<Vec<Vec<Index>>>,
}

/// How a [`ConnectedSet`] is enumerated.
#[derive(Clone, Debug)]
pub enum ConnectedSetKind {
    /// Every member output map is `Constant` or `SingleInputDimension`; enumerable by pure
    /// interval arithmetic. `members` is parallel to the set's `grid_dims`.
    Strided(Vec<StridedMember>),
    /// At least one member output map is `IndexArray`; enumerable by iterating the cartesian
    /// product of the set's input dims. Groups are sorted lexicographically by `cell_indices`.
    IndexArrayRows(Vec<RowGroup>),
}

/// A candidate cell for one connected set: a tuple of cell indices (aligned to the set's
/// `grid_dims`) together with the data needed to build that slice of a [`crate::transform::IndexTransform`]
/// cell transform.
#[derive(Clone, Debug)]
pub struct SetCell {
    /// Cell indices, aligned to the owning [`ConnectedSet`]'s `grid_dims` order.
    pub cell_indices: Vec<Index>,
    /// The cell-specific restriction of the set's input dims.
    pub data: SetCellData,
}

/// The per-cell restriction carried by a [`SetCell`].
#[derive(Clone, Debug)]
pub enum SetCellData {
    /// A constant-only set: no input dims to restrict.
    Constant,
    /// A strided set: the cell's sub-interval of the set's single shared input dim.
    Strided(IndexInterval),
    /// An index-array set: the stored input-coordinate rows for this cell.
    IndexArrayRows(Rc<Vec<Vec<Index>>>),
}

/// A maximal group of `(input dims, grid dims)` mutually coupled through output maps.
#[derive(Clone, Debug)]
pub struct ConnectedSet {
    /// The original-transform input dims this set covers, sorted ascending.
    pub input_dims: Vec<usize>,
    /// Positions into the caller's `grid_output_dimensions` slice (not raw output-dim indices),
    /// sorted ascending, that this set covers.
    pub grid_dims: Vec<usize>,
    /// How the set is enumerated.
    pub kind: ConnectedSetKind,
    /// Every candidate cell this set intersects, sorted lexicographically on `cell_indices`.
    pub cells: Vec<SetCell>,
}
