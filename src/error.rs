use core::fmt;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Byte width of a type descriptor was zero or negative.
    InvalidWidth { byte_width: i64 },
    /// A write supplied a value whose length differs from the column width.
    WidthMismatch { expected: usize, actual: i64 },
    IndexOutOfBounds { index: usize, bound: usize },
    AllocationFailure { requested: usize, limit: usize },
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidWidth { byte_width } => {
                write!(f, "byte width must be positive, got {byte_width}")
            }
            Error::WidthMismatch { expected, actual } => {
                write!(
                    f,
                    "only {expected}-byte input data is allowed, got {actual} bytes"
                )
            }
            Error::IndexOutOfBounds { index, bound } => {
                write!(f, "index {index} out of bounds (bound {bound})")
            }
            Error::AllocationFailure { requested, limit } => {
                write!(f, "unable to allocate {requested} bytes (limit {limit})")
            }
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}
