use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by building, loading, saving, or misusing a cursor.
///
/// Lookups that simply find nothing are not errors; they return `None` or the
/// negative sentinels documented on each query.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading or writing the byte range failed, or the range is truncated.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A byte range that cannot hold a whole number of units.
    #[error("byte length {0} is not a multiple of 4")]
    UnalignedLength(usize),

    #[error("key at index {0} is empty")]
    EmptyKey(usize),

    #[error("key at index {0} contains a zero byte")]
    ZeroByteInKey(usize),

    #[error("duplicate key: {0:?}")]
    DuplicateKey(Vec<u8>),

    /// Values must fit in 31 bits.
    #[error("value {value} does not fit in 31 bits")]
    ValueOutOfRange { value: u32 },

    #[error("{keys} keys but {values} values")]
    LengthMismatch { keys: usize, values: usize },

    /// The array grew past the largest offset a unit can encode.
    #[error("double array exceeds the addressable unit range")]
    TooLarge,

    /// `try_next` was called again after it had already reported the end.
    #[error("common-prefix cursor advanced past its end")]
    CursorExhausted,
}
