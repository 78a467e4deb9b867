//! Error types for the entropy-coding laboratory.

use thiserror::Error;

/// Error variants for coder configuration and encoding.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested symbol stride is outside the supported range.
    #[error("stride {0} outside the supported range 1..=127 bits")]
    InvalidStride(u64),

    /// Arithmetic-coder word length does not fit the storage integer.
    #[error("word length {0} outside the supported range 1..=63 bits")]
    InvalidWordLength(u32),

    /// The coding interval collapsed to zero width; the word length is too
    /// small for the probability distribution being coded.
    #[error("coding interval collapsed (word length too small for the distribution)")]
    IntervalCollapse,

    /// An I/O error occurred while reading input.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for coder operations.
pub type Result<T> = std::result::Result<T, Error>;
