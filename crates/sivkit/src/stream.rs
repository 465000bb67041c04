//! STREAM: chunked online authenticated encryption.
//!
//! Each chunk seals under a derived nonce
//! `prefix(8) || counter(4, big-endian) || last_flag(1)`. The counter
//! forces chunks to be opened in sealing order, and the flag rides inside
//! the terminal chunk's nonce, so truncating the stream is detectable.

use tracing::warn;

use sivkit_common::{CryptoProvider, Error, Result};

use crate::aead::Aead;
use crate::siv::Algorithm;

/// Required length of a stream nonce prefix.
pub const NONCE_PREFIX_SIZE: usize = 8;

const COUNTER_SIZE: usize = 4;
const LAST_FLAG_SIZE: usize = 1;
const CHUNK_NONCE_SIZE: usize = NONCE_PREFIX_SIZE + COUNTER_SIZE + LAST_FLAG_SIZE;

#[derive(Debug, PartialEq, Eq)]
enum StreamState {
    Active,
    Terminated,
}

/// Per-chunk nonce schedule shared by both directions of a stream.
struct NonceSequence {
    prefix: [u8; NONCE_PREFIX_SIZE],
    counter: u32,
    state: StreamState,
}

impl NonceSequence {
    fn new(nonce_prefix: &[u8]) -> Result<Self> {
        let prefix = nonce_prefix
            .try_into()
            .map_err(|_| Error::InvalidNonceLength {
                expected: NONCE_PREFIX_SIZE,
                actual: nonce_prefix.len(),
            })?;
        Ok(Self {
            prefix,
            counter: 0,
            state: StreamState::Active,
        })
    }

    /// Yields the nonce for the next chunk; `last` closes the stream.
    fn next(&mut self, last: bool) -> Result<[u8; CHUNK_NONCE_SIZE]> {
        if self.state == StreamState::Terminated {
            warn!("stream chunk requested after the terminal chunk");
            return Err(Error::ChunkSequence);
        }

        let mut nonce = [0u8; CHUNK_NONCE_SIZE];
        nonce[..NONCE_PREFIX_SIZE].copy_from_slice(&self.prefix);
        nonce[NONCE_PREFIX_SIZE..NONCE_PREFIX_SIZE + COUNTER_SIZE]
            .copy_from_slice(&self.counter.to_be_bytes());
        nonce[CHUNK_NONCE_SIZE - 1] = last as u8;

        self.counter = self.counter.checked_add(1).ok_or(Error::CounterOverflow)?;
        if last {
            self.state = StreamState::Terminated;
        }
        Ok(nonce)
    }
}

/// Encrypting half of a STREAM session.
pub struct StreamEncryptor {
    aead: Aead,
    nonces: NonceSequence,
}

impl StreamEncryptor {
    /// Imports a combined key and fixes the stream's nonce prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNonceLength`] unless `nonce_prefix` is
    /// exactly [`NONCE_PREFIX_SIZE`] bytes; key errors as for
    /// [`Siv::import_key`](crate::Siv::import_key).
    pub async fn import_key(
        provider: &dyn CryptoProvider,
        key: &[u8],
        nonce_prefix: &[u8],
        algorithm: Algorithm,
    ) -> Result<Self> {
        Ok(Self {
            aead: Aead::import_key(provider, key, algorithm).await?,
            nonces: NonceSequence::new(nonce_prefix)?,
        })
    }

    /// Seals the next chunk; `last_chunk` closes the stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChunkSequence`] once the stream is closed and
    /// [`Error::CounterOverflow`] when the chunk counter is exhausted.
    pub async fn seal(
        &mut self,
        plaintext: &[u8],
        last_chunk: bool,
        associated_data: &[u8],
    ) -> Result<Vec<u8>> {
        let nonce = self.nonces.next(last_chunk)?;
        self.aead.seal(plaintext, &nonce, &[associated_data]).await
    }

    /// Wipes the construction-owned key material.
    pub fn clear(&mut self) {
        self.aead.clear();
    }
}

/// Decrypting half of a STREAM session.
pub struct StreamDecryptor {
    aead: Aead,
    nonces: NonceSequence,
}

impl StreamDecryptor {
    /// Imports a combined key and fixes the stream's nonce prefix.
    ///
    /// # Errors
    ///
    /// As for [`StreamEncryptor::import_key`].
    pub async fn import_key(
        provider: &dyn CryptoProvider,
        key: &[u8],
        nonce_prefix: &[u8],
        algorithm: Algorithm,
    ) -> Result<Self> {
        Ok(Self {
            aead: Aead::import_key(provider, key, algorithm).await?,
            nonces: NonceSequence::new(nonce_prefix)?,
        })
    }

    /// Opens the next chunk, which must carry the position and terminal
    /// flag it was sealed with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integrity`] for reordered, corrupted or
    /// wrongly-flagged chunks, [`Error::ChunkSequence`] once the stream is
    /// closed, and [`Error::CounterOverflow`] when the counter is
    /// exhausted.
    pub async fn open(
        &mut self,
        sealed: &[u8],
        last_chunk: bool,
        associated_data: &[u8],
    ) -> Result<Vec<u8>> {
        let nonce = self.nonces.next(last_chunk)?;
        self.aead.open(sealed, &nonce, &[associated_data]).await
    }

    /// Wipes the construction-owned key material.
    pub fn clear(&mut self) {
        self.aead.clear();
    }
}
