//! Rectilinear regions of an index space: ordered tuples of [`IndexInterval`].

use crate::interval::{Index, IndexInterval};

/// An ordered collection of per-dimension intervals, representing a rectilinear region.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexBox {
    intervals: Vec<IndexInterval>,
}

impl IndexBox {
    /// Builds a box from its per-dimension intervals.
    #[must_use]
    pub fn new(intervals: Vec<IndexInterval>) -> Self {
        Self { intervals }
    }

    /// The rank (number of dimensions) of the box.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.intervals.len()
    }

    /// The interval spanned by dimension `dim`.
    #[must_use]
    pub fn interval(&self, dim: usize) -> &IndexInterval {
        &self.intervals[dim]
    }

    /// Iterates over the per-dimension intervals.
    pub fn intervals(&self) -> impl Iterator<Item = &IndexInterval> {
        self.intervals.iter()
    }

    /// `true` if any dimension is empty, which makes the whole box empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.iter().any(IndexInterval::is_empty)
    }

    /// Dimension-wise intersection. Empty (in any dimension) if the boxes don't overlap
    /// everywhere, or if the ranks differ.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        if self.rank() != other.rank() {
            return Self::new(vec![IndexInterval::empty(); self.rank().max(other.rank())]);
        }
        Self::new(
            self.intervals
                .iter()
                .zip(&other.intervals)
                .map(|(a, b)| a.intersect(b))
                .collect(),
        )
    }

    /// The shape (per-dimension size) of the box; `0` for any empty dimension.
    #[must_use]
    pub fn shape(&self) -> Vec<Index> {
        self.intervals.iter().map(IndexInterval::size).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_2d() {
        let a = IndexBox::new(vec![
            IndexInterval::sized(0, 10).unwrap(),
            IndexInterval::sized(0, 10).unwrap(),
        ]);
        let b = IndexBox::new(vec![
            IndexInterval::sized(5, 10).unwrap(),
            IndexInterval::sized(-5, 10).unwrap(),
        ]);
        let c = a.intersect(&b);
        assert_eq!(c.interval(0), &IndexInterval::sized(5, 5).unwrap());
        assert_eq!(c.interval(1), &IndexInterval::sized(0, 5).unwrap());
    }

    #[test]
    fn empty_dimension_makes_box_empty() {
        let a = IndexBox::new(vec![
            IndexInterval::sized(0, 0).unwrap(),
            IndexInterval::sized(0, 10).unwrap(),
        ]);
        assert!(a.is_empty());
    }
}
