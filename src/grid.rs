//! The [`Grid`] trait and its two implementations: [`RegularGrid`] and [`IrregularGrid`].

use crate::error::{Error, Result};
use crate::interval::{checked_mul, floor_div, Index, IndexInterval};
use crate::region::IndexBox;
use enum_dispatch::enum_dispatch;

/// A per-dimension partition of the integer line into disjoint, line-covering cells.
///
/// Implementations are pure value types: no hidden global state, no registries. `output_to_cell`
/// and `cell_to_output_interval` are mutual inverses in the sense that
/// `cell_to_output_interval(d, output_to_cell(d, x))` always contains `x`.
#[enum_dispatch]
pub trait Grid {
    /// The number of dimensions this grid partitions.
    fn rank(&self) -> usize;

    /// Maps an output coordinate on dimension `dim` to the cell index covering it.
    fn output_to_cell(&self, dim: usize, output_index: Index) -> Index;

    /// The output-coordinate interval spanned by cell `cell_index` on dimension `dim`.
    fn cell_to_output_interval(&self, dim: usize, cell_index: Index) -> IndexInterval;

    /// The finite box of cell indices this grid is bounded to, if any.
    ///
    /// `IrregularGrid` always returns `Some`: its split-point list has finitely many interior
    /// cells plus the two unbounded boundary cells `-1` and `k-1`. `RegularGrid` has no natural
    /// bound and returns `None`; a caller wanting to coalesce ranges over a `RegularGrid` must
    /// supply explicit bounds.
    fn bounds(&self) -> Option<IndexBox>;
}

/// Dispatches over the two [`Grid`] implementations without `dyn` or virtual calls.
#[enum_dispatch(Grid)]
#[derive(Clone, Debug)]
pub enum GridEnum {
    /// Fixed cell size per dimension.
    RegularGrid,
    /// Explicit sorted split points per dimension.
    IrregularGrid,
}

/// A grid with a fixed cell size `s_d > 0` per dimension: `cell = floor(output / s_d)`, spanning
/// `[cell * s_d, (cell + 1) * s_d)`.
#[derive(Clone, Debug)]
pub struct RegularGrid {
    cell_shape: Vec<Index>,
}

impl RegularGrid {
    /// Builds a regular grid from its per-dimension cell sizes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if any cell size is not strictly positive.
    pub fn new(cell_shape: Vec<Index>) -> Result<Self> {
        if let Some(&bad) = cell_shape.iter().find(|&&s| s <= 0) {
            return Err(Error::InvalidArgument(format!(
                "regular grid cell size must be positive, got {bad}"
            )));
        }
        Ok(Self { cell_shape })
    }

    /// The cell size along dimension `dim`.
    #[must_use]
    pub fn cell_size(&self, dim: usize) -> Index {
        self.cell_shape[dim]
    }
}

impl Grid for RegularGrid {
    fn rank(&self) -> usize {
        self.cell_shape.len()
    }

    fn output_to_cell(&self, dim: usize, output_index: Index) -> Index {
        floor_div(output_index, self.cell_shape[dim])
    }

    fn cell_to_output_interval(&self, dim: usize, cell_index: Index) -> IndexInterval {
        let size = self.cell_shape[dim];
        // `cell_index * size` cannot overflow for any grid built through `new` combined with any
        // `cell_index` the enumerator ever derives from a bounded input transform, but a
        // malicious/huge cell index is still possible through `get_grid_cell_ranges`' caller-
        // supplied bounds; fall back to the saturated interval rather than panicking.
        let Ok(origin) = checked_mul(cell_index, size) else {
            return IndexInterval::empty();
        };
        IndexInterval::sized(origin, size).unwrap_or_else(|_| IndexInterval::empty())
    }

    fn bounds(&self) -> Option<IndexBox> {
        None
    }
}

/// A grid with explicit, per-dimension sorted split points `p_0 < ... < p_{k-1}`.
///
/// Cell `i` for `0 <= i < k - 1` spans `[p_i, p_{i+1})`. Cell `-1` spans `(-inf, p_0)` and cell
/// `k - 1` spans `[p_{k-1}, +inf)`.
#[derive(Clone, Debug)]
pub struct IrregularGrid {
    splits: Vec<Vec<Index>>,
}

impl IrregularGrid {
    /// Builds an irregular grid from its per-dimension split points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if any dimension has fewer than one split point, or if
    /// a dimension's split points are not strictly increasing.
    pub fn new(splits: Vec<Vec<Index>>) -> Result<Self> {
        for points in &splits {
            if points.is_empty() {
                return Err(Error::InvalidArgument(
                    "irregular grid dimension needs at least one split point".to_string(),
                ));
            }
            if points.windows(2).any(|w| w[0] >= w[1]) {
                return Err(Error::InvalidArgument(
                    "irregular grid split points must be strictly increasing".to_string(),
                ));
            }
        }
        Ok(Self { splits })
    }

    fn points(&self, dim: usize) -> &[Index] {
        &self.splits[dim]
    }
}

impl Grid for IrregularGrid {
    fn rank(&self) -> usize {
        self.splits.len()
    }

    fn output_to_cell(&self, dim: usize, output_index: Index) -> Index {
        let points = self.points(dim);
        // `binary_search` on a strictly-increasing, duplicate-free slice either finds an exact
        // match (`Ok(pos)`, meaning `points[pos] == output_index`, so that split point starts
        // the cell and `cell == pos`) or an insertion point (`Err(pos)`, meaning
        // `points[pos - 1] < output_index < points[pos]`, so `cell == pos - 1`; `pos == 0` means
        // `output_index` is below every split point, giving the unbounded-below cell `-1`).
        match points.binary_search(&output_index) {
            Ok(pos) => pos as Index,
            Err(pos) => pos as Index - 1,
        }
    }

    fn cell_to_output_interval(&self, dim: usize, cell_index: Index) -> IndexInterval {
        let points = self.points(dim);
        let k = points.len() as Index;
        if cell_index < -1 || cell_index > k - 1 {
            return IndexInterval::empty();
        }
        if cell_index == -1 {
            return IndexInterval::unbounded_below(points[0]);
        }
        if cell_index == k - 1 {
            return IndexInterval::unbounded_above(points[(k - 1) as usize]);
        }
        IndexInterval::half_open(points[cell_index as usize], points[cell_index as usize + 1])
            .unwrap_or(IndexInterval::empty())
    }

    fn bounds(&self) -> Option<IndexBox> {
        Some(IndexBox::new(
            (0..self.rank())
                .map(|d| {
                    let k = self.points(d).len() as Index;
                    IndexInterval::half_open(-1, k).unwrap_or(IndexInterval::empty())
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_grid_positive_and_negative() {
        let g = RegularGrid::new(vec![2]).unwrap();
        assert_eq!(g.output_to_cell(0, 0), 0);
        assert_eq!(g.output_to_cell(0, 1), 0);
        assert_eq!(g.output_to_cell(0, -1), -1);
        assert_eq!(g.output_to_cell(0, -2), -1);
        assert_eq!(
            g.cell_to_output_interval(0, -1),
            IndexInterval::sized(-2, 2).unwrap()
        );
    }

    #[test]
    fn regular_grid_rejects_nonpositive_cell_size() {
        assert!(RegularGrid::new(vec![0]).is_err());
        assert!(RegularGrid::new(vec![-1]).is_err());
    }

    #[test]
    fn regular_grid_round_trip_contains() {
        let g = RegularGrid::new(vec![3, 7]).unwrap();
        for x in -20..20 {
            let c = g.output_to_cell(0, x);
            assert!(g.cell_to_output_interval(0, c).contains(x));
        }
    }

    #[test]
    fn irregular_grid_interior_cells() {
        let g = IrregularGrid::new(vec![vec![0, 10, 20]]).unwrap();
        assert_eq!(g.output_to_cell(0, -5), -1);
        assert_eq!(g.output_to_cell(0, 0), 0);
        assert_eq!(g.output_to_cell(0, 5), 0);
        assert_eq!(g.output_to_cell(0, 10), 1);
        assert_eq!(g.output_to_cell(0, 25), 2);
        assert_eq!(
            g.cell_to_output_interval(0, 0),
            IndexInterval::sized(0, 10).unwrap()
        );
        assert_eq!(
            g.cell_to_output_interval(0, -1).exclusive_max(),
            0
        );
    }

    #[test]
    fn irregular_grid_rejects_bad_splits() {
        assert!(IrregularGrid::new(vec![vec![]]).is_err());
        assert!(IrregularGrid::new(vec![vec![5, 5]]).is_err());
        assert!(IrregularGrid::new(vec![vec![5, 4]]).is_err());
    }

    #[test]
    fn irregular_grid_bounds() {
        let g = IrregularGrid::new(vec![vec![0, 10, 20], vec![0, 5]]).unwrap();
        let b = g.bounds().unwrap();
        assert_eq!(b.interval(0), &IndexInterval::half_open(-1, 3).unwrap());
        assert_eq!(b.interval(1), &IndexInterval::half_open(-1, 2).unwrap());
    }

    #[test]
    fn irregular_grid_round_trip_contains() {
        let g = IrregularGrid::new(vec![vec![-5, 0, 5, 100]]).unwrap();
        for x in -20..20 {
            let c = g.output_to_cell(0, x);
            assert!(g.cell_to_output_interval(0, c).contains(x));
        }
    }
}
