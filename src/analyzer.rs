//! The pre-partition analyzer: classifies output maps, forms connected sets, and builds the
//! immutable [`PartitionPlan`] consumed by [`crate::partition`] and [`crate::ranges`].

use crate::connected_set::{ConnectedSet, ConnectedSetKind, RowGroup, SetCell, SetCellData, StridedMember};
use crate::error::{Error, Result};
use crate::grid::{Grid, GridEnum};
use crate::interval::{ceil_div, checked_add, checked_sub, floor_div, Index, IndexInterval};
use crate::transform::{IndexTransform, OutputIndexMap};
use crate::union_find::UnionFind;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::rc::Rc;

/// The immutable, precomputed structure an analyzer call produces: an ordered list of connected
/// sets plus the materialized, globally cell-index-sorted list of grid cells their cartesian
/// product touches.
///
/// Deterministic given the same transform, grid output dimensions, and grid: rebuilding the plan
/// from identical inputs yields an equal cell list, up to the row order *within* one cell of an
/// index-array set, which [the design notes](crate) leave unspecified.
#[derive(Clone, Debug)]
pub struct PartitionPlan {
    pub(crate) grid_dims: Vec<usize>,
    pub(crate) input_rank: usize,
    pub(crate) free_input_dims: Vec<usize>,
    pub(crate) connected_sets: Vec<ConnectedSet>,
    pub(crate) cells: Vec<PlanCell>,
}

/// One fully-resolved grid cell in a [`PartitionPlan`]: the cell-index tuple (aligned to
/// `grid_dims`, i.e. to the caller's `grid_output_dimensions` order) plus, per connected set, the
/// data needed to restrict that set's input dims to this cell.
#[derive(Clone, Debug)]
pub struct PlanCell {
    /// Cell indices aligned to the plan's `grid_dims` (caller-supplied) order.
    pub cell_indices: Vec<Index>,
    /// Parallel to `PartitionPlan::connected_sets`: the chosen restriction for each set.
    pub per_set: Vec<SetCellData>,
}

impl PartitionPlan {
    /// The grid dimensions (positions into the transform's output maps) this plan was built for,
    /// in caller order.
    #[must_use]
    pub fn grid_dims(&self) -> &[usize] {
        &self.grid_dims
    }

    /// The original-transform input dims not bound by any grid dimension, sorted ascending.
    #[must_use]
    pub fn free_input_dims(&self) -> &[usize] {
        &self.free_input_dims
    }

    /// The connected sets this plan enumerates.
    #[must_use]
    pub fn connected_sets(&self) -> &[ConnectedSet] {
        &self.connected_sets
    }

    /// The materialized, globally cell-index-sorted list of cells this plan touches.
    #[must_use]
    pub fn cells(&self) -> &[PlanCell] {
        &self.cells
    }

    /// Builds a plan with no cells: used for an empty input box, where no callback invocation can
    /// ever happen.
    fn empty(grid_dims: Vec<usize>, input_rank: usize) -> Self {
        let free_input_dims = (0..input_rank).collect();
        Self {
            grid_dims,
            input_rank,
            free_input_dims,
            connected_sets: Vec::new(),
            cells: Vec::new(),
        }
    }
}

fn validate_grid_dims(transform: &IndexTransform, grid_dims: &[usize], grid: &GridEnum) -> Result<()> {
    if grid.rank() != grid_dims.len() {
        return Err(Error::InvalidArgument(format!(
            "grid has rank {}, but {} grid output dimensions were supplied",
            grid.rank(),
            grid_dims.len()
        )));
    }
    let mut seen = vec![false; transform.output_rank()];
    for &g in grid_dims {
        if g >= transform.output_rank() {
            return Err(Error::InvalidArgument(format!(
                "grid output dimension {g} is out of range for a transform of output rank {}",
                transform.output_rank()
            )));
        }
        if std::mem::replace(&mut seen[g], true) {
            return Err(Error::InvalidArgument(format!(
                "grid output dimension {g} is listed more than once"
            )));
        }
    }
    Ok(())
}

/// Builds the [`PartitionPlan`] for `transform` restricted to `grid_dims` under `grid`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for a malformed `grid_dims`/`grid` pairing or an
/// out-of-domain index-array read, and [`Error::OutOfRange`] on arithmetic overflow while
/// evaluating output maps or composing affine preimages.
pub fn pre_partition(
    transform: &IndexTransform,
    grid_dims: &[usize],
    grid: &GridEnum,
) -> Result<PartitionPlan> {
    validate_grid_dims(transform, grid_dims, grid)?;

    if transform.input_box().is_empty() {
        return Ok(PartitionPlan::empty(grid_dims.to_vec(), transform.input_rank()));
    }

    let input_rank = transform.input_rank();
    let universe = grid_dims.len() + input_rank;
    let mut uf = UnionFind::new(universe);
    let input_node = |d: usize| grid_dims.len() + d;

    for (pos, &g) in grid_dims.iter().enumerate() {
        match &transform.output_maps()[g] {
            OutputIndexMap::Constant(_) => {}
            OutputIndexMap::SingleInputDimension { input_dim, .. } => {
                uf.union(pos, input_node(*input_dim));
            }
            OutputIndexMap::IndexArray { input_dims, .. } => {
                for &d in input_dims {
                    uf.union(pos, input_node(d));
                }
            }
        }
    }

    let mut root_to_grid_dims: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for pos in 0..grid_dims.len() {
        root_to_grid_dims.entry(uf.find(pos)).or_default().push(pos);
    }
    let mut root_to_input_dims: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for d in 0..input_rank {
        root_to_input_dims
            .entry(uf.find(input_node(d)))
            .or_default()
            .push(d);
    }

    let mut bound_input_dims = vec![false; input_rank];
    let mut connected_sets = Vec::new();
    for (root, set_grid_dims) in root_to_grid_dims {
        let set_input_dims = root_to_input_dims.remove(&root).unwrap_or_default();
        for &d in &set_input_dims {
            bound_input_dims[d] = true;
        }
        let set = build_connected_set(transform, grid_dims, grid, set_grid_dims, set_input_dims)?;
        connected_sets.push(set);
    }
    let free_input_dims: Vec<usize> = (0..input_rank).filter(|&d| !bound_input_dims[d]).collect();

    let cells = if connected_sets.iter().any(|cs| cs.cells.is_empty()) {
        Vec::new()
    } else {
        connected_sets
            .iter()
            .map(|cs| 0..cs.cells.len())
            .multi_cartesian_product()
            .map(|choice| {
                let mut cell_indices = vec![0; grid_dims.len()];
                let mut per_set = Vec::with_capacity(connected_sets.len());
                for (cs, &pick) in connected_sets.iter().zip(&choice) {
                    let set_cell = &cs.cells[pick];
                    for (&pos, &c) in cs.grid_dims.iter().zip(&set_cell.cell_indices) {
                        cell_indices[pos] = c;
                    }
                    per_set.push(set_cell.data.clone());
                }
                PlanCell {
                    cell_indices,
                    per_set,
                }
            })
            .sorted_by(|a, b| a.cell_indices.cmp(&b.cell_indices))
            .collect()
    };
    // Zero connected sets (G is empty) means `multi_cartesian_product` over no factors yields a
    // single empty combination, already producing the one universal all-pass-through cell.
    let cells = if connected_sets.is_empty() {
        vec![PlanCell {
            cell_indices: Vec::new(),
            per_set: Vec::new(),
        }]
    } else {
        cells
    };

    Ok(PartitionPlan {
        grid_dims: grid_dims.to_vec(),
        input_rank,
        free_input_dims,
        connected_sets,
        cells,
    })
}

fn build_connected_set(
    transform: &IndexTransform,
    grid_dims: &[usize],
    grid: &GridEnum,
    set_grid_dims: Vec<usize>,
    set_input_dims: Vec<usize>,
) -> Result<ConnectedSet> {
    let has_index_array = set_grid_dims
        .iter()
        .any(|&pos| matches!(transform.output_maps()[grid_dims[pos]], OutputIndexMap::IndexArray { .. }));

    if has_index_array {
        build_index_array_set(transform, grid_dims, grid, set_grid_dims, set_input_dims)
    } else {
        build_strided_set(transform, grid_dims, grid, set_grid_dims, set_input_dims)
    }
}

fn build_strided_set(
    transform: &IndexTransform,
    grid_dims: &[usize],
    grid: &GridEnum,
    set_grid_dims: Vec<usize>,
    set_input_dims: Vec<usize>,
) -> Result<ConnectedSet> {
    let members: Vec<StridedMember> = set_grid_dims
        .iter()
        .map(|&pos| match &transform.output_maps()[grid_dims[pos]] {
            OutputIndexMap::Constant(value) => Ok(StridedMember::Constant { value: *value }),
            OutputIndexMap::SingleInputDimension { offset, stride, .. } => Ok(StridedMember::Affine {
                offset: *offset,
                stride: *stride,
            }),
            OutputIndexMap::IndexArray { .. } => Err(Error::Internal(
                "a strided connected set must not contain an IndexArray member".to_string(),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    let cells = if set_input_dims.is_empty() {
        debug_assert_eq!(set_grid_dims.len(), 1, "a constant-only set has exactly one member");
        let StridedMember::Constant { value } = members[0] else {
            return Err(Error::Internal(
                "strided set with no input dims must be a single Constant member".to_string(),
            ));
        };
        vec![SetCell {
            cell_indices: vec![grid.output_to_cell(set_grid_dims[0], value)],
            data: SetCellData::Constant,
        }]
    } else {
        let input_dim = set_input_dims[0];
        let domain = *transform.input_box().interval(input_dim);
        strided_set_cells(&set_grid_dims, &members, grid, domain)?
    };

    Ok(ConnectedSet {
        input_dims: set_input_dims,
        grid_dims: set_grid_dims,
        kind: ConnectedSetKind::Strided(members),
        cells,
    })
}

/// The input interval over which applying `(offset, stride)` lands inside `target`.
fn affine_preimage(offset: Index, stride: Index, target: IndexInterval) -> Result<IndexInterval> {
    if target.is_empty() {
        return Ok(IndexInterval::empty());
    }
    let lo = target.origin();
    let hi = target.exclusive_max();
    if stride > 0 {
        let new_lo = ceil_div(checked_sub(lo, offset)?, stride);
        let new_hi = ceil_div(checked_sub(hi, offset)?, stride);
        IndexInterval::half_open(new_lo, new_hi)
    } else {
        let new_lo = checked_add(floor_div(checked_sub(hi, offset)?, stride), 1)?;
        let new_hi = checked_add(floor_div(checked_sub(lo, offset)?, stride), 1)?;
        IndexInterval::half_open(new_lo, new_hi)
    }
}

/// The breakpoints within `domain` at which `(offset, stride)`'s cell (on `grid`'s dimension
/// `grid_dim_pos`) changes, including `domain`'s own endpoints.
fn member_breakpoints(
    offset: Index,
    stride: Index,
    grid_dim_pos: usize,
    grid: &GridEnum,
    domain: IndexInterval,
) -> Result<Vec<Index>> {
    if domain.is_empty() {
        return Ok(Vec::new());
    }
    let a = checked_add(offset, crate::interval::checked_mul(stride, domain.origin())?)?;
    let b = checked_add(
        offset,
        crate::interval::checked_mul(stride, domain.exclusive_max() - 1)?,
    )?;
    let (lo, hi) = (a.min(b), a.max(b));
    let c_lo = grid.output_to_cell(grid_dim_pos, lo);
    let c_hi = grid.output_to_cell(grid_dim_pos, hi);

    let mut breakpoints = vec![domain.origin()];
    let mut c = c_lo;
    while c <= c_hi {
        let out_iv = grid.cell_to_output_interval(grid_dim_pos, c);
        let pre = affine_preimage(offset, stride, out_iv)?;
        let clipped = pre.intersect(&domain);
        if !clipped.is_empty() {
            breakpoints.push(clipped.origin());
            breakpoints.push(clipped.exclusive_max());
        }
        c += 1;
    }
    breakpoints.sort_unstable();
    breakpoints.dedup();
    Ok(breakpoints)
}

fn strided_set_cells(
    set_grid_dims: &[usize],
    members: &[StridedMember],
    grid: &GridEnum,
    domain: IndexInterval,
) -> Result<Vec<SetCell>> {
    if domain.is_empty() {
        return Ok(Vec::new());
    }

    let mut breakpoints = vec![domain.origin(), domain.exclusive_max()];
    for (local, &pos) in set_grid_dims.iter().enumerate() {
        if let StridedMember::Affine { offset, stride } = members[local] {
            breakpoints.extend(member_breakpoints(offset, stride, pos, grid, domain)?);
        }
    }
    breakpoints.sort_unstable();
    breakpoints.dedup();

    let mut cells = Vec::new();
    for window in breakpoints.windows(2) {
        let sub = IndexInterval::half_open(window[0], window[1])?;
        if sub.is_empty() {
            continue;
        }
        let rep = sub.origin();
        let mut cell_indices = Vec::with_capacity(set_grid_dims.len());
        for (local, &pos) in set_grid_dims.iter().enumerate() {
            let c = match members[local] {
                StridedMember::Constant { value } => grid.output_to_cell(pos, value),
                StridedMember::Affine { offset, stride } => {
                    let out = checked_add(offset, crate::interval::checked_mul(stride, rep)?)?;
                    grid.output_to_cell(pos, out)
                }
            };
            cell_indices.push(c);
        }
        cells.push(SetCell {
            cell_indices,
            data: SetCellData::Strided(sub),
        });
    }
    Ok(cells)
}

fn build_index_array_set(
    transform: &IndexTransform,
    grid_dims: &[usize],
    grid: &GridEnum,
    set_grid_dims: Vec<usize>,
    set_input_dims: Vec<usize>,
) -> Result<ConnectedSet> {
    let input_box = transform.input_box();
    if set_input_dims
        .iter()
        .any(|&d| input_box.interval(d).is_empty())
    {
        return Ok(ConnectedSet {
            input_dims: set_input_dims,
            grid_dims: set_grid_dims,
            kind: ConnectedSetKind::IndexArrayRows(Vec::new()),
            cells: Vec::new(),
        });
    }

    // Grouping is a hot loop over every combination in the set's input domain, so it uses a fast
    // non-cryptographic hasher for the lookup table; the final cell order is restored explicitly
    // below since `FxHashMap` iteration order
    // is unspecified.
    let mut groups: FxHashMap<Vec<Index>, Vec<Vec<Index>>> = FxHashMap::default();
    let ranges: Vec<std::ops::Range<Index>> = set_input_dims
        .iter()
        .map(|&d| {
            let iv = input_box.interval(d);
            iv.origin()..iv.exclusive_max()
        })
        .collect();

    for combo in ranges.iter().cloned().multi_cartesian_product() {
        let mut point = vec![0; transform.input_rank()];
        for (&d, &v) in set_input_dims.iter().zip(&combo) {
            point[d] = v;
        }
        let mut cell_indices = Vec::with_capacity(set_grid_dims.len());
        for &pos in &set_grid_dims {
            let g = grid_dims[pos];
            let value = transform.output_maps()[g].evaluate(&point)?;
            cell_indices.push(grid.output_to_cell(pos, value));
        }
        groups.entry(cell_indices).or_default().push(combo);
    }
    // Handle the degenerate rank-0 case (an `IndexArray` map with no `input_dims`, reading a
    // scalar array): `multi_cartesian_product` over zero ranges yields no combinations at all
    // (not the single empty one), so evaluate that single point explicitly.
    if set_input_dims.is_empty() {
        let point = vec![0; transform.input_rank()];
        let mut cell_indices = Vec::with_capacity(set_grid_dims.len());
        for &pos in &set_grid_dims {
            let g = grid_dims[pos];
            let value = transform.output_maps()[g].evaluate(&point)?;
            cell_indices.push(grid.output_to_cell(pos, value));
        }
        groups.entry(cell_indices).or_default().push(Vec::new());
    }

    let mut sorted_keys: Vec<Vec<Index>> = groups.keys().cloned().collect();
    sorted_keys.sort_unstable();

    let mut kind_groups = Vec::with_capacity(sorted_keys.len());
    let mut cells = Vec::with_capacity(sorted_keys.len());
    for cell_indices in sorted_keys {
        let rows = Rc::new(
            groups
                .remove(&cell_indices)
                .expect("key was just read from this same map"),
        );
        kind_groups.push(RowGroup {
            cell_indices: cell_indices.clone(),
            rows: Rc::clone(&rows),
        });
        cells.push(SetCell {
            cell_indices,
            data: SetCellData::IndexArrayRows(rows),
        });
    }

    Ok(ConnectedSet {
        input_dims: set_input_dims,
        grid_dims: set_grid_dims,
        kind: ConnectedSetKind::IndexArrayRows(kind_groups),
        cells,
    })
}
