//! The partition enumerator: walks a [`PartitionPlan`]'s cells and builds a fresh
//! [`IndexTransform`] ("cell transform") per cell, invoking the caller's callback in
//! lexicographic cell-index order.
//!
//! A cell transform is *not* a slice of the original transform's output: its output rank equals
//! the original transform's *input* rank, so that composing `original.apply_point(cell
//! .apply_point(x))` reproduces the original transform restricted to one grid cell. Each
//! connected set of the plan collapses to exactly one new input dimension ("slot"): a strided
//! set's shared input dim keeps its restricted sub-interval directly; an index-array set's
//! (possibly several) input dims are replaced by one row-index dimension, read back out through
//! freshly built `IndexArray` output maps. Input dims the grid never touches pass through
//! unchanged. Constant-only connected sets contribute no slot at all.

use crate::analyzer::{pre_partition, PartitionPlan, PlanCell};
use crate::array::IndexArrayData;
use crate::connected_set::{ConnectedSetKind, SetCellData};
use crate::error::{Error, Result};
use crate::grid::{Grid, GridEnum, RegularGrid};
use crate::interval::{Index, IndexInterval};
use crate::region::IndexBox;
use crate::transform::{IndexTransform, OutputIndexMap};
use ndarray::Array1;
use std::ops::ControlFlow;
use std::rc::Rc;

/// How one original input dimension of the transform being partitioned is produced inside a cell
/// transform.
#[derive(Clone, Copy, Debug)]
enum DimSource {
    /// Unbound by any grid dim: copied through from cell-local slot `slot`.
    Free { slot: usize },
    /// Bound by a strided connected set's single shared input dim, restricted to that set's
    /// chosen sub-interval at slot `slot`.
    Strided { slot: usize },
    /// Bound by an index-array connected set: `local` is this dimension's position in the set's
    /// `input_dims`, read back out of the row table attached to slot `slot`.
    IndexArrayRow { slot: usize, local: usize },
}

/// Plan-derived (not per-cell) assignment of original input dims to cell-transform slots. Built
/// once per `partition`/`get_grid_cell_ranges` call and reused for every emitted cell.
struct SlotPlan {
    /// One entry per original input dimension, `0..input_rank`.
    dim_sources: Vec<DimSource>,
    /// Parallel to `PartitionPlan::connected_sets()`: the slot assigned to each set, or `None`
    /// for a constant-only set (which binds no input dim and needs no slot).
    set_slots: Vec<Option<usize>>,
    /// Total number of cell-transform input dims.
    slot_count: usize,
}

fn build_slot_plan(plan: &PartitionPlan) -> SlotPlan {
    let mut dim_sources: Vec<Option<DimSource>> = vec![None; plan.input_rank];
    let mut set_slots = Vec::with_capacity(plan.connected_sets.len());
    let mut slot_count = 0usize;

    for set in &plan.connected_sets {
        if set.input_dims.is_empty() {
            set_slots.push(None);
            continue;
        }
        let slot = slot_count;
        slot_count += 1;
        set_slots.push(Some(slot));
        match &set.kind {
            ConnectedSetKind::Strided(_) => {
                dim_sources[set.input_dims[0]] = Some(DimSource::Strided { slot });
            }
            ConnectedSetKind::IndexArrayRows(_) => {
                for (local, &d) in set.input_dims.iter().enumerate() {
                    dim_sources[d] = Some(DimSource::IndexArrayRow { slot, local });
                }
            }
        }
    }
    for &d in &plan.free_input_dims {
        let slot = slot_count;
        slot_count += 1;
        dim_sources[d] = Some(DimSource::Free { slot });
    }

    SlotPlan {
        dim_sources: dim_sources
            .into_iter()
            .map(|s| s.expect("every input dim is either free or bound by exactly one connected set"))
            .collect(),
        set_slots,
        slot_count,
    }
}

/// Builds the cell transform for one [`PlanCell`] of `plan`.
fn build_cell_transform(
    transform: &IndexTransform,
    plan: &PartitionPlan,
    slots: &SlotPlan,
    cell: &PlanCell,
) -> Result<IndexTransform> {
    let mut new_intervals = vec![IndexInterval::empty(); slots.slot_count];
    let mut row_tables: Vec<Option<Rc<Vec<Vec<Index>>>>> = vec![None; plan.connected_sets.len()];

    for (set_idx, slot) in slots.set_slots.iter().enumerate() {
        let Some(slot) = *slot else { continue };
        match &cell.per_set[set_idx] {
            SetCellData::Strided(iv) => new_intervals[slot] = *iv,
            SetCellData::IndexArrayRows(rows) => {
                new_intervals[slot] = IndexInterval::sized(0, rows.len() as Index)?;
                row_tables[set_idx] = Some(Rc::clone(rows));
            }
            SetCellData::Constant => {
                return Err(Error::Internal(
                    "a connected set with bound input dims cannot carry Constant cell data".to_string(),
                ));
            }
        }
    }
    for &d in &plan.free_input_dims {
        let DimSource::Free { slot } = slots.dim_sources[d] else {
            return Err(Error::Internal("a free input dim must resolve to a Free slot".to_string()));
        };
        new_intervals[slot] = *transform.input_box().interval(d);
    }

    let mut set_of_dim: Vec<Option<usize>> = vec![None; plan.input_rank];
    for (set_idx, set) in plan.connected_sets.iter().enumerate() {
        for &d in &set.input_dims {
            set_of_dim[d] = Some(set_idx);
        }
    }

    let mut output_maps = Vec::with_capacity(plan.input_rank);
    for d in 0..plan.input_rank {
        let map = match slots.dim_sources[d] {
            DimSource::Free { slot } | DimSource::Strided { slot } => OutputIndexMap::SingleInputDimension {
                offset: 0,
                stride: 1,
                input_dim: slot,
            },
            DimSource::IndexArrayRow { slot, local } => {
                let set_idx = set_of_dim[d].ok_or_else(|| {
                    Error::Internal(format!("input dim {d} classified as IndexArrayRow has no owning set"))
                })?;
                let rows = row_tables[set_idx].as_ref().ok_or_else(|| {
                    Error::Internal(format!("index-array connected set {set_idx} has no row table for this cell"))
                })?;
                let values: Vec<Index> = rows.iter().map(|row| row[local]).collect();
                let array = IndexArrayData::new(vec![0], Array1::from_vec(values).into_dyn())?;
                OutputIndexMap::IndexArray {
                    offset: 0,
                    stride: 1,
                    array: Rc::new(array),
                    input_dims: vec![slot],
                }
            }
        };
        output_maps.push(map);
    }

    IndexTransform::new(IndexBox::new(new_intervals), output_maps)
}

/// Invokes `callback(cell_indices, cell_transform)` for each grid cell intersected by
/// `transform`'s image under `grid`, restricted to `grid_dims`, in lexicographic cell-index
/// order. Returns as soon as the callback breaks, forwarding its value unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] or [`Error::OutOfRange`] from plan construction (see
/// [`pre_partition`]) before any callback is invoked, or from cell-transform assembly for a
/// particular cell (in which case earlier callbacks have already run and cannot be undone).
pub fn partition<C>(
    transform: &IndexTransform,
    grid_dims: &[usize],
    grid: &GridEnum,
    mut callback: impl FnMut(&[Index], &IndexTransform) -> ControlFlow<C>,
) -> Result<ControlFlow<C>> {
    let plan = pre_partition(transform, grid_dims, grid)?;
    let slots = build_slot_plan(&plan);

    for cell in plan.cells() {
        let cell_transform = build_cell_transform(transform, &plan, &slots, cell)?;
        match callback(&cell.cell_indices, &cell_transform) {
            ControlFlow::Continue(()) => {}
            brk => return Ok(brk),
        }
    }
    Ok(ControlFlow::Continue(()))
}

/// Convenience wrapper over [`partition`] that builds a [`RegularGrid`] from `cell_shape`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if any element of `cell_shape` is not strictly positive, or
/// any error [`partition`] can return.
pub fn partition_regular<C>(
    transform: &IndexTransform,
    grid_dims: &[usize],
    cell_shape: Vec<Index>,
    callback: impl FnMut(&[Index], &IndexTransform) -> ControlFlow<C>,
) -> Result<ControlFlow<C>> {
    let grid = GridEnum::from(RegularGrid::new(cell_shape)?);
    partition(transform, grid_dims, &grid, callback)
}
