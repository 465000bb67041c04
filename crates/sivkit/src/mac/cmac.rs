//! AES-CMAC (RFC 4493) in streaming form.

use async_trait::async_trait;

use sivkit_common::{Block, BlockCipher, CryptoProvider, Result};

use super::Mac;

/// Streaming CMAC over an imported block-cipher key.
///
/// The CBC chain lives in the one-block buffer, with incoming bytes XORed
/// in at the fill position. A trailing exactly-full block stays buffered
/// until [`finish`](Mac::finish): the final block of the message is masked
/// with a subkey, so it cannot be folded into the chain early.
pub struct Cmac {
    cipher: Box<dyn BlockCipher>,
    subkey1: Block,
    subkey2: Block,
    buffer: Block,
    pos: usize,
    finished: bool,
}

impl Cmac {
    /// Imports the MAC key and derives both final-block subkeys.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::InvalidKeyLength`](sivkit_common::Error::InvalidKeyLength)
    /// from the provider.
    pub async fn import_key(provider: &dyn CryptoProvider, key: &[u8]) -> Result<Self> {
        let cipher = provider.import_block_cipher_key(key).await?;

        // subkey1 = dbl(E_K(0)), subkey2 = dbl(subkey1)
        let mut subkey1 = Block::new();
        cipher.encrypt_block(&mut subkey1).await?;
        subkey1.dbl();

        let mut subkey2 = subkey1.clone();
        subkey2.dbl();

        Ok(Self {
            cipher,
            subkey1,
            subkey2,
            buffer: Block::new(),
            pos: 0,
            finished: false,
        })
    }
}

#[async_trait]
impl Mac for Cmac {
    async fn update(&mut self, mut data: &[u8]) -> Result<()> {
        let left = Block::SIZE - self.pos;

        if data.len() > left {
            // Complete the pending block and fold it into the chain.
            self.buffer.xor_bytes(self.pos, &data[..left]);
            data = &data[left..];
            self.cipher.encrypt_block(&mut self.buffer).await?;
            self.pos = 0;

            // Whole blocks, holding back one that could end the message.
            if data.len() > Block::SIZE {
                let batched = (data.len() - 1) / Block::SIZE * Block::SIZE;
                self.cipher
                    .encrypt_block_batch(&mut self.buffer, &data[..batched])
                    .await?;
                data = &data[batched..];
            }
        }

        self.buffer.xor_bytes(self.pos, data);
        self.pos += data.len();
        Ok(())
    }

    async fn finish(&mut self) -> Result<[u8; Block::SIZE]> {
        if !self.finished {
            if self.pos == Block::SIZE {
                self.buffer.xor_in_place(&self.subkey1);
            } else {
                self.buffer.xor_in_place(&self.subkey2);
                self.buffer.as_mut_bytes()[self.pos] ^= 0x80;
            }
            self.cipher.encrypt_block(&mut self.buffer).await?;
            self.finished = true;
        }
        Ok(self.buffer.to_bytes())
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.pos = 0;
        self.finished = false;
    }

    fn clear(&mut self) {
        self.reset();
        self.subkey1.clear();
        self.subkey2.clear();
    }
}

impl Drop for Cmac {
    fn drop(&mut self) {
        self.clear();
    }
}
