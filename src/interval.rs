//! Half-open integer intervals and the checked arithmetic they're built from.

use crate::error::{Error, Result};

/// Signed index type, wide enough to address any element of an index space.
pub type Index = i64;

/// Adds `a` and `b`, turning overflow into [`Error::OutOfRange`].
pub fn checked_add(a: Index, b: Index) -> Result<Index> {
    a.checked_add(b)
        .ok_or_else(|| Error::OutOfRange(format!("{a} + {b} overflows Index")))
}

/// Multiplies `a` and `b`, turning overflow into [`Error::OutOfRange`].
pub fn checked_mul(a: Index, b: Index) -> Result<Index> {
    a.checked_mul(b)
        .ok_or_else(|| Error::OutOfRange(format!("{a} * {b} overflows Index")))
}

/// Subtracts `b` from `a`, turning overflow into [`Error::OutOfRange`].
pub fn checked_sub(a: Index, b: Index) -> Result<Index> {
    a.checked_sub(b)
        .ok_or_else(|| Error::OutOfRange(format!("{a} - {b} overflows Index")))
}

/// Division rounding towards negative infinity. `b` must be nonzero.
#[must_use]
pub const fn floor_div(a: Index, b: Index) -> Index {
    let q = a / b;
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Division rounding towards positive infinity. `b` must be nonzero.
#[must_use]
pub const fn ceil_div(a: Index, b: Index) -> Index {
    let q = a / b;
    let r = a % b;
    if r != 0 && ((r < 0) == (b < 0)) {
        q + 1
    } else {
        q
    }
}

/// A half-open range `[origin, origin + size)` with `size >= 0`.
///
/// Two empty intervals compare equal regardless of `origin`, matching the convention that an
/// empty interval carries no position information.
#[derive(Clone, Copy, Debug)]
pub struct IndexInterval {
    origin: Index,
    size: Index,
}

impl IndexInterval {
    /// The canonical empty interval.
    #[must_use]
    pub const fn empty() -> Self {
        Self { origin: 0, size: 0 }
    }

    /// Builds `[origin, origin + size)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `size < 0`, [`Error::OutOfRange`] if
    /// `origin + size` overflows.
    pub fn sized(origin: Index, size: Index) -> Result<Self> {
        if size < 0 {
            return Err(Error::InvalidArgument(format!(
                "interval size must be nonnegative, got {size}"
            )));
        }
        checked_add(origin, size)?;
        Ok(Self { origin, size })
    }

    /// Builds `[lower, upper)`, empty if `upper <= lower`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `upper - lower` overflows.
    pub fn half_open(lower: Index, upper: Index) -> Result<Self> {
        if upper <= lower {
            return Ok(Self::empty());
        }
        let size = upper
            .checked_sub(lower)
            .ok_or_else(|| Error::OutOfRange(format!("{upper} - {lower} overflows Index")))?;
        Ok(Self {
            origin: lower,
            size,
        })
    }

    /// The lower (inclusive) bound. Meaningless for an empty interval.
    #[must_use]
    pub const fn origin(&self) -> Index {
        self.origin
    }

    /// The number of elements covered.
    #[must_use]
    pub const fn size(&self) -> Index {
        self.size
    }

    /// The upper (exclusive) bound. Meaningless for an empty interval.
    ///
    /// Uses wrapping addition: every interval built through the public constructors already
    /// has `origin + size` validated not to overflow, and [`Self::unbounded_below`] /
    /// [`Self::unbounded_above`] rely on wrapping arithmetic being self-consistent to represent
    /// a half-infinite interval with a finite `(origin, size)` pair.
    #[must_use]
    pub const fn exclusive_max(&self) -> Index {
        self.origin.wrapping_add(self.size)
    }

    /// `true` if the interval covers no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// `true` if `x` falls within `[origin, origin + size)`.
    #[must_use]
    pub const fn contains(&self, x: Index) -> bool {
        !self.is_empty() && x >= self.origin && x < self.exclusive_max()
    }

    /// The intersection of two intervals; empty if they do not overlap.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }
        let lower = self.origin.max(other.origin);
        let upper = self.exclusive_max().min(other.exclusive_max());
        Self::half_open(lower, upper).unwrap_or_else(|_| Self::empty())
    }

    /// `true` if `self` is entirely contained in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.is_empty() || (self.origin >= other.origin && self.exclusive_max() <= other.exclusive_max())
    }

    /// Shifts the interval by `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] on overflow.
    pub fn translate(&self, offset: Index) -> Result<Self> {
        if self.is_empty() {
            return Ok(Self::empty());
        }
        Self::sized(checked_add(self.origin, offset)?, self.size)
    }

    /// `(-inf, upper)`, i.e. everything strictly below `upper`.
    ///
    /// Represented as `origin = Index::MIN` with `size` computed through wrapping subtraction:
    /// `Index::MIN` is the one point where `origin.wrapping_add(upper.wrapping_sub(origin))`
    /// reconstructs `upper` exactly, so [`Self::exclusive_max`] and [`Self::contains`] behave
    /// correctly without a dedicated "unbounded" flag.
    #[must_use]
    pub fn unbounded_below(upper: Index) -> Self {
        Self {
            origin: Index::MIN,
            size: upper.wrapping_sub(Index::MIN),
        }
    }

    /// `[origin, +inf)`, approximated as `[origin, Index::MAX)`.
    ///
    /// `Index::MAX` itself can never be the exclusive upper bound of a real interval (no
    /// `IndexInterval` built through [`Self::sized`]/[`Self::half_open`] can reach it without
    /// overflowing), so it is used here as a sentinel for "unbounded above" and never collides
    /// with genuine data.
    #[must_use]
    pub fn unbounded_above(origin: Index) -> Self {
        Self {
            origin,
            size: Index::MAX.saturating_sub(origin),
        }
    }
}

impl PartialEq for IndexInterval {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => true,
            (true, false) | (false, true) => false,
            (false, false) => self.origin == other.origin && self.size == other.size,
        }
    }
}

impl Eq for IndexInterval {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_intervals_compare_equal() {
        assert_eq!(IndexInterval::empty(), IndexInterval::sized(5, 0).unwrap());
        assert_eq!(IndexInterval::sized(5, 0).unwrap(), IndexInterval::sized(-3, 0).unwrap());
    }

    #[test]
    fn half_open_below_lower_is_empty() {
        assert!(IndexInterval::half_open(5, 5).unwrap().is_empty());
        assert!(IndexInterval::half_open(5, 2).unwrap().is_empty());
    }

    #[test]
    fn contains_is_half_open() {
        let iv = IndexInterval::sized(2, 4).unwrap();
        assert!(!iv.contains(1));
        assert!(iv.contains(2));
        assert!(iv.contains(5));
        assert!(!iv.contains(6));
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = IndexInterval::sized(0, 3).unwrap();
        let b = IndexInterval::sized(10, 3).unwrap();
        assert!(a.intersect(&b).is_empty());
    }

    #[test]
    fn intersect_overlap() {
        let a = IndexInterval::sized(0, 5).unwrap();
        let b = IndexInterval::sized(3, 5).unwrap();
        assert_eq!(a.intersect(&b), IndexInterval::sized(3, 2).unwrap());
    }

    #[test]
    fn negative_size_rejected() {
        assert!(IndexInterval::sized(0, -1).is_err());
    }

    #[test]
    fn unbounded_below_contains_everything_under_upper() {
        let iv = IndexInterval::unbounded_below(10);
        assert!(iv.contains(Index::MIN));
        assert!(iv.contains(0));
        assert!(iv.contains(9));
        assert!(!iv.contains(10));
        assert_eq!(iv.exclusive_max(), 10);
    }

    #[test]
    fn unbounded_above_contains_everything_from_origin() {
        let iv = IndexInterval::unbounded_above(10);
        assert!(iv.contains(10));
        assert!(iv.contains(Index::MAX - 1));
        assert!(!iv.contains(9));
    }

    #[test]
    fn overflow_detected() {
        assert!(IndexInterval::sized(Index::MAX - 1, 5).is_err());
        assert!(checked_add(Index::MAX, 1).is_err());
        assert!(checked_mul(Index::MAX, 2).is_err());
    }

    #[test]
    fn floor_div_rounds_towards_negative_infinity() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_div(7, -2), -4);
        assert_eq!(floor_div(-7, -2), 3);
        assert_eq!(floor_div(6, 2), 3);
    }

    #[test]
    fn ceil_div_rounds_towards_positive_infinity() {
        assert_eq!(ceil_div(7, 2), 4);
        assert_eq!(ceil_div(-7, 2), -3);
        assert_eq!(ceil_div(7, -2), -3);
        assert_eq!(ceil_div(-7, -2), 4);
        assert_eq!(ceil_div(6, 2), 3);
    }
}
