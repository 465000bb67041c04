//! AES-PMAC: the parallelisable MAC of Black and Rogaway.
//!
//! Each message block is whitened with a per-position offset mask and
//! encrypted independently; the results XOR into a running digest, which
//! is encrypted once at the end. The offsets follow a Gray-code walk over
//! a precomputed table of doublings of `E_K(0)`, so advancing to the next
//! block costs a single XOR.

use async_trait::async_trait;

use sivkit_common::{Block, BlockCipher, CryptoProvider, Result};

use super::Mac;

/// Number of precomputed doubling masks; bounds a message to 2^31 blocks.
const PRECOMPUTED_MASKS: usize = 31;

/// Streaming PMAC over an imported block-cipher key.
pub struct Pmac {
    cipher: Box<dyn BlockCipher>,
    /// `masks[0] = E_K(0)`, `masks[i] = dbl(masks[i-1])`.
    masks: Vec<Block>,
    /// `E_K(0) * x^-1`, masking a final block that is exactly block-sized.
    inv_mask: Block,
    offset: Block,
    digest: Block,
    buffer: Block,
    pos: usize,
    counter: u32,
    finished: bool,
}

impl Pmac {
    /// Imports the MAC key and precomputes the offset mask table.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::InvalidKeyLength`](sivkit_common::Error::InvalidKeyLength)
    /// from the provider.
    pub async fn import_key(provider: &dyn CryptoProvider, key: &[u8]) -> Result<Self> {
        let cipher = provider.import_block_cipher_key(key).await?;

        let mut mask = Block::new();
        cipher.encrypt_block(&mut mask).await?;

        let mut masks = Vec::with_capacity(PRECOMPUTED_MASKS);
        for _ in 0..PRECOMPUTED_MASKS {
            masks.push(mask.clone());
            mask.dbl();
        }

        let mut inv_mask = masks[0].clone();
        halve(&mut inv_mask);

        Ok(Self {
            cipher,
            masks,
            inv_mask,
            offset: Block::new(),
            digest: Block::new(),
            buffer: Block::new(),
            pos: 0,
            counter: 0,
            finished: false,
        })
    }

    /// Absorbs the buffered block as a non-final block.
    async fn process_buffer(&mut self) -> Result<()> {
        // offset_i = offset_{i-1} ^ masks[ntz(i)], i counted from 1.
        let index = (self.counter + 1).trailing_zeros() as usize;
        self.offset.xor_in_place(&self.masks[index]);
        self.counter += 1;

        self.buffer.xor_in_place(&self.offset);
        self.cipher.encrypt_block(&mut self.buffer).await?;
        self.digest.xor_in_place(&self.buffer);

        self.buffer.clear();
        self.pos = 0;
        Ok(())
    }
}

#[async_trait]
impl Mac for Pmac {
    async fn update(&mut self, mut data: &[u8]) -> Result<()> {
        let left = Block::SIZE - self.pos;

        if data.len() > left {
            // Top up the pending block and absorb it.
            self.buffer.copy_bytes(self.pos, &data[..left]);
            data = &data[left..];
            self.process_buffer().await?;
        }

        // Whole blocks, holding back one that could end the message.
        while data.len() > Block::SIZE {
            self.buffer.copy_bytes(0, &data[..Block::SIZE]);
            data = &data[Block::SIZE..];
            self.process_buffer().await?;
        }

        self.buffer.copy_bytes(self.pos, data);
        self.pos += data.len();
        Ok(())
    }

    async fn finish(&mut self) -> Result<[u8; Block::SIZE]> {
        if !self.finished {
            if self.pos == Block::SIZE {
                // Whole final block: masked with E_K(0) * x^-1, no padding.
                self.buffer.xor_in_place(&self.inv_mask);
                self.digest.xor_in_place(&self.buffer);
            } else {
                // Bytes beyond pos are zero, so this is pad(M) = M || 10*.
                self.buffer.as_mut_bytes()[self.pos] = 0x80;
                self.digest.xor_in_place(&self.buffer);
            }
            self.cipher.encrypt_block(&mut self.digest).await?;
            self.finished = true;
        }
        Ok(self.digest.to_bytes())
    }

    fn reset(&mut self) {
        self.offset.clear();
        self.digest.clear();
        self.buffer.clear();
        self.pos = 0;
        self.counter = 0;
        self.finished = false;
    }

    fn clear(&mut self) {
        self.reset();
        for mask in &mut self.masks {
            mask.clear();
        }
        self.inv_mask.clear();
    }
}

impl Drop for Pmac {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Multiplies a block by x^-1 in GF(2^128): shift right one bit, folding
/// the reduction constant back in iff the shifted-out bit was set. The
/// fold is mask-selected, never a branch on block contents.
fn halve(block: &mut Block) {
    let bytes = block.as_mut_bytes();
    let carry = bytes[Block::SIZE - 1] & 1;
    for i in (1..Block::SIZE).rev() {
        bytes[i] = (bytes[i] >> 1) | (bytes[i - 1] << 7);
    }
    bytes[0] >>= 1;

    let fold = carry.wrapping_neg();
    bytes[0] ^= 0x80 & fold;
    bytes[Block::SIZE - 1] ^= 0x43 & fold;
}
