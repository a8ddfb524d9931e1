//! Error types for the arithmetic coding codecs.

use thiserror::Error;

/// Error variants for compression and expansion.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested context order is outside the supported range.
    #[error("unsupported context order: {0}")]
    InvalidOrder(usize),

    /// The compressed stream ended before decoding finished.
    #[error("unexpected end of compressed stream")]
    UnexpectedEof,

    /// An I/O error occurred during encoding or decoding.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;
