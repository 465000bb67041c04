//! Asynchronous cipher-provider capability traits.
//!
//! The constructions in the `sivkit` crate never touch AES directly; they
//! are written against these object-safe traits so a pure-software
//! provider, a hardware token, or a platform crypto API can sit behind the
//! same seam. All key-dependent cipher work happens behind a trait call,
//! which is also the only place the constructions suspend; the surrounding
//! GF(2^128) arithmetic is synchronous.
//!
//! Cancellation: if a future returned by one of these methods is dropped
//! before completion, the state of the owning construction is unspecified
//! and the instance must be discarded.

use async_trait::async_trait;

use crate::block::Block;
use crate::error::Result;

/// Entry point of a provider: turns raw key bytes into cipher capabilities.
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    /// Imports a raw AES key for single-block and chained-block encryption.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyLength`](crate::Error::InvalidKeyLength)
    /// if the provider does not support `key.len()`.
    async fn import_block_cipher_key(&self, key: &[u8]) -> Result<Box<dyn BlockCipher>>;

    /// Imports a raw AES key for counter-mode encryption.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyLength`](crate::Error::InvalidKeyLength)
    /// if the provider does not support `key.len()`.
    async fn import_ctr_key(&self, key: &[u8]) -> Result<Box<dyn CtrCipher>>;
}

/// A keyed block cipher restricted to the forward (encrypt) direction.
#[async_trait]
pub trait BlockCipher: Send + Sync {
    /// Encrypts one block in place.
    async fn encrypt_block(&self, block: &mut Block) -> Result<()>;

    /// Folds whole blocks of `data` into a CBC chain:
    /// `chain = E(chain ^ block)` for each 16-byte chunk, in order.
    ///
    /// `data.len()` must be a multiple of [`Block::SIZE`]. Batching keeps a
    /// long MAC update to a single suspension point.
    async fn encrypt_block_batch(&self, chain: &mut Block, data: &[u8]) -> Result<()>;
}

/// A keyed stream cipher in counter mode.
#[async_trait]
pub trait CtrCipher: Send + Sync {
    /// Encrypts (equivalently, decrypts) `data` with AES-CTR.
    ///
    /// The keystream starts at `counter` and increments it as one 128-bit
    /// big-endian integer per block; a partial final block truncates the
    /// keystream. The input is not modified; the result is returned.
    async fn encrypt_ctr(&self, counter: &Block, data: &[u8]) -> Result<Vec<u8>>;
}
