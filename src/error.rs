//! Error type returned by the fallible entry points of this crate.

use thiserror::Error;

/// Errors raised while constructing or enumerating index transforms, grids, and partitions.
///
/// User-initiated cancellation is *not* represented here: callbacks communicate "stop
/// enumerating" through [`std::ops::ControlFlow::Break`], which the entry points in
/// [`crate::partition`] and [`crate::ranges`] forward to the caller untouched.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// A malformed transform, grid, or argument: rank mismatch, a grid dimension out of range,
    /// duplicate grid dimensions, or an index-array read outside its declared domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// `Index` arithmetic overflowed while composing or evaluating an output map.
    #[error("out of range: {0}")]
    OutOfRange(String),
    /// An invariant that should be unreachable was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
