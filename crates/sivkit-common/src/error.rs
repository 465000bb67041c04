//! Error taxonomy shared across the workspace.

use thiserror::Error;

/// Convenience alias used by every fallible operation in the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for key import, sealing, opening and streaming.
///
/// [`Error::Integrity`] is deliberately opaque: it never distinguishes a
/// tag mismatch from truncation, a wrong key, or mismatched associated
/// data, so an attacker learns nothing from the failure mode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Key material has a length the construction or provider cannot use.
    #[error("invalid key length: {0} bytes")]
    InvalidKeyLength(usize),

    /// A stream nonce prefix does not have the required length.
    #[error("invalid nonce prefix length: expected {expected} bytes, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    /// The algorithm identifier is not recognised.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// More associated-data items were supplied than the construction can bind.
    #[error("too many associated data items: {0}")]
    TooManyAssociatedData(usize),

    /// Authentication failed while opening a sealed message.
    #[error("ciphertext verification failure")]
    Integrity,

    /// A stream was used again after processing its terminal chunk.
    #[error("stream already processed its last chunk")]
    ChunkSequence,

    /// The stream chunk counter is exhausted.
    #[error("stream chunk counter overflowed")]
    CounterOverflow,
}
