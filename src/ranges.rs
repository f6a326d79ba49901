//! The range coalescer: an alternative enumeration entry point that emits axis-aligned boxes of
//! grid-cell indices instead of individual cells.
//!
//! The set of cells covered by the emitted boxes is exactly the set [`crate::partition::partition`]
//! would emit, clipped to the caller-supplied `grid_bounds` (per the documented resolution of
//! `IrregularGrid`'s infinite boundary cells in an otherwise finite bound, see `DESIGN.md`).
//!
//! Coalescing works from the innermost grid dimension outward: two consecutive values of an
//! outer dimension merge into one run exactly when their *entire* remaining (inner) decomposition
//! is identical. This subsumes the narrower "unconstrained, equal to `grid_bounds`" rule as one
//! particular case — "equal to the full bound, independent of the outer value" is just one way
//! for the inner decomposition to be constant across a run — while also merging outer runs whose
//! shared inner structure is some other constant.

use crate::analyzer::pre_partition;
use crate::error::{Error, Result};
use crate::grid::GridEnum;
use crate::interval::{checked_add, Index, IndexInterval};
use crate::region::IndexBox;
use crate::transform::IndexTransform;
use std::ops::ControlFlow;

/// Resolves the suffix-box decomposition of `rows` (all sharing an already-fixed prefix on dims
/// `0..dim`) over dims `dim..k`.
///
/// `rows` must be sorted lexicographically. Returns a list of interval tuples, each of length
/// `k - dim`, whose union (as cartesian products) covers exactly the distinct tuples in `rows`
/// with no overlap between returned boxes.
fn coalesce_suffix(dim: usize, rows: &[&[Index]]) -> Result<Vec<Vec<IndexInterval>>> {
    let k = rows[0].len();
    if dim == k {
        return Ok(vec![Vec::new()]);
    }

    let mut groups: Vec<(Index, Vec<&[Index]>)> = Vec::new();
    for &row in rows {
        let v = row[dim];
        let starts_new_group = groups.last().is_none_or(|(last_v, _)| *last_v != v);
        if starts_new_group {
            groups.push((v, vec![row]));
        } else {
            groups.last_mut().expect("just checked non-empty").1.push(row);
        }
    }

    let mut resolved = Vec::with_capacity(groups.len());
    for (v, members) in groups {
        resolved.push((v, coalesce_suffix(dim + 1, &members)?));
    }

    let mut result = Vec::new();
    let mut i = 0;
    while i < resolved.len() {
        let (start_v, ref suffixes) = resolved[i];
        let mut end_v = start_v;
        let mut j = i + 1;
        while j < resolved.len() {
            let (next_v, ref next_suffixes) = resolved[j];
            if next_v == checked_add(end_v, 1)? && *next_suffixes == *suffixes {
                end_v = next_v;
                j += 1;
            } else {
                break;
            }
        }
        let this_interval = IndexInterval::half_open(start_v, checked_add(end_v, 1)?)?;
        for suffix in suffixes {
            let mut full = Vec::with_capacity(1 + suffix.len());
            full.push(this_interval);
            full.extend(suffix.iter().copied());
            result.push(full);
        }
        i = j;
    }
    Ok(result)
}

/// Invokes `callback(cell_box)` once per emitted axis-aligned box of grid-cell indices, in
/// lexicographic order of the boxes' lower corners. The union of cells covered by the emitted
/// boxes equals exactly the set of cell-index tuples [`crate::partition::partition`] would emit
/// for the same `transform`/`grid_dims`/`grid`, intersected with `grid_bounds`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `grid_bounds`'s rank does not match `grid_dims`, or any
/// error [`pre_partition`] can return.
pub fn get_grid_cell_ranges<C>(
    transform: &IndexTransform,
    grid_dims: &[usize],
    grid_bounds: &IndexBox,
    grid: &GridEnum,
    mut callback: impl FnMut(&IndexBox) -> ControlFlow<C>,
) -> Result<ControlFlow<C>> {
    if grid_bounds.rank() != grid_dims.len() {
        return Err(Error::InvalidArgument(format!(
            "grid_bounds has rank {}, but {} grid output dimensions were supplied",
            grid_bounds.rank(),
            grid_dims.len()
        )));
    }

    let plan = pre_partition(transform, grid_dims, grid)?;

    let rows: Vec<Vec<Index>> = plan
        .cells()
        .iter()
        .map(|c| c.cell_indices.clone())
        .filter(|tuple| {
            tuple
                .iter()
                .enumerate()
                .all(|(d, &v)| grid_bounds.interval(d).contains(v))
        })
        .collect();

    if rows.is_empty() {
        return Ok(ControlFlow::Continue(()));
    }

    let refs: Vec<&[Index]> = rows.iter().map(Vec::as_slice).collect();
    let boxes = coalesce_suffix(0, &refs)?;

    for intervals in boxes {
        match callback(&IndexBox::new(intervals)) {
            ControlFlow::Continue(()) => {}
            brk => return Ok(brk),
        }
    }
    Ok(ControlFlow::Continue(()))
}
