#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

//! An index-transform grid partitioner.
//!
//! Given an [`IndexTransform`](transform::IndexTransform) from an N-dimensional input domain to
//! an M-dimensional output index space, and a [`Grid`](grid::Grid) partitioning selected output
//! dimensions into cells, this crate enumerates the grid cells intersected by the transform's
//! image and, for each one, builds a restricted *cell transform* whose image lies entirely within
//! that cell.
//!
//! The four entry points are [`analyzer::pre_partition`] (build the reusable
//! [`analyzer::PartitionPlan`]), [`partition::partition`] and [`partition::partition_regular`]
//! (enumerate individual cells), and [`ranges::get_grid_cell_ranges`] (enumerate axis-aligned
//! runs of cells instead).
//!
//! Row order *within* one cell of an index-array connected set is deliberately left unspecified:
//! two conforming implementations may disagree on it without either being wrong. Everything else
//! about enumeration order (the cell-index tuples themselves, and the order cells/boxes are
//! emitted in) is fully determined: strictly lexicographic on cell-index tuples.

pub mod analyzer;
pub mod array;
pub mod connected_set;
pub mod error;
pub mod grid;
pub mod interval;
pub mod partition;
pub mod ranges;
pub mod region;
pub mod transform;
mod union_find;
