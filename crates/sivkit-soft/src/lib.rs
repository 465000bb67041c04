//! Pure-software AES provider for the `sivkit` constructions.
//!
//! Implements the [`CryptoProvider`] capability with the RustCrypto `aes`
//! and `ctr` crates. Suitable anywhere, with no hardware or platform
//! dependencies; a platform-accelerated provider can replace it behind the
//! same traits without touching the construction layer.

mod aes_ctr;
mod cipher;

use async_trait::async_trait;

use sivkit_common::{BlockCipher, CryptoProvider, CtrCipher, Result};

/// Software provider over AES-128 and AES-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftAesProvider;

#[async_trait]
impl CryptoProvider for SoftAesProvider {
    async fn import_block_cipher_key(&self, key: &[u8]) -> Result<Box<dyn BlockCipher>> {
        Ok(Box::new(cipher::SoftAes::new(key)?))
    }

    async fn import_ctr_key(&self, key: &[u8]) -> Result<Box<dyn CtrCipher>> {
        Ok(Box::new(aes_ctr::SoftAesCtr::new(key)?))
    }
}
