use std::fmt;

/// Errors surfaced by the fallible boundary operations.
///
/// The per-pixel core never raises errors; it reports failure through
/// `bool`/`Option` returns and guards its preconditions with `debug_assert!`.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// A raw buffer is smaller than the stated frame dimensions require.
    BufferTooSmall { expected: usize, actual: usize },
    /// A contour could not be triangulated.
    TriangulationFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BufferTooSmall { expected, actual } => {
                write!(f, "buffer holds {actual} elements, {expected} required")
            }
            Error::TriangulationFailed => write!(f, "contour triangulation failed"),
        }
    }
}

impl std::error::Error for Error {}
