//! Forward-direction AES block encryption over the `aes` crate.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes128, Aes256};
use async_trait::async_trait;

use sivkit_common::{Block, BlockCipher, Error, Result};

/// A keyed AES block cipher selected by key length.
///
/// AES-192 is deliberately absent: the SIV family uses 32- or 64-byte
/// combined keys, so only the 16- and 32-byte halves ever reach a
/// provider. The `aes` crate is built with its `zeroize` feature, which
/// wipes the expanded key schedule when the cipher drops.
pub(crate) enum SoftAes {
    Aes128(Aes128),
    Aes256(Aes256),
}

impl SoftAes {
    pub(crate) fn new(key: &[u8]) -> Result<Self> {
        match key.len() {
            16 => Aes128::new_from_slice(key)
                .map(Self::Aes128)
                .map_err(|_| Error::InvalidKeyLength(key.len())),
            32 => Aes256::new_from_slice(key)
                .map(Self::Aes256)
                .map_err(|_| Error::InvalidKeyLength(key.len())),
            len => Err(Error::InvalidKeyLength(len)),
        }
    }

    fn encrypt_in_place(&self, block: &mut Block) {
        let bytes = GenericArray::from_mut_slice(block.as_mut_bytes());
        match self {
            Self::Aes128(cipher) => cipher.encrypt_block(bytes),
            Self::Aes256(cipher) => cipher.encrypt_block(bytes),
        }
    }
}

#[async_trait]
impl BlockCipher for SoftAes {
    async fn encrypt_block(&self, block: &mut Block) -> Result<()> {
        self.encrypt_in_place(block);
        Ok(())
    }

    async fn encrypt_block_batch(&self, chain: &mut Block, data: &[u8]) -> Result<()> {
        debug_assert_eq!(data.len() % Block::SIZE, 0);
        for chunk in data.chunks_exact(Block::SIZE) {
            chain.xor_bytes(0, chunk);
            self.encrypt_in_place(chain);
        }
        Ok(())
    }
}
