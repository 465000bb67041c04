//! The 128-bit work unit used throughout the workspace.
//!
//! A [`Block`] holds one AES-width chunk of state: a message block, a
//! derived subkey, a PMAC offset mask, a CBC chain value, a CTR counter or
//! a synthetic IV. Because most of those are key-derived, the type wipes
//! itself on drop and refuses to print its contents.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 16-byte block in GF(2^128), byte 0 holding the most significant bits.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Block([u8; 16]);

impl Block {
    /// Width of the block in bytes.
    pub const SIZE: usize = 16;

    /// Low byte of the GF(2^128) reduction polynomial x^128 + x^7 + x^2 + x + 1.
    const R: u8 = 0x87;

    /// An all-zero block.
    pub fn new() -> Self {
        Self([0u8; Self::SIZE])
    }

    /// Multiplies the block by x in GF(2^128), in place.
    ///
    /// The whole block shifts left one bit; if a bit falls off the most
    /// significant end, the reduction constant folds into the final byte.
    /// The fold is selected by a mask rather than a branch, so the timing
    /// does not depend on the (possibly secret) block contents.
    pub fn dbl(&mut self) {
        let mut carry = 0u8;
        for byte in self.0.iter_mut().rev() {
            let shifted_out = *byte >> 7;
            *byte = (*byte << 1) | carry;
            carry = shifted_out;
        }
        self.0[Self::SIZE - 1] ^= Self::R & carry.wrapping_neg();
    }

    /// XORs another block into this one, lane-wise.
    pub fn xor_in_place(&mut self, other: &Block) {
        for (slot, byte) in self.0.iter_mut().zip(other.0.iter()) {
            *slot ^= byte;
        }
    }

    /// XORs `data` into the block starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + data.len()` exceeds [`Block::SIZE`].
    pub fn xor_bytes(&mut self, offset: usize, data: &[u8]) {
        for (slot, byte) in self.0[offset..offset + data.len()].iter_mut().zip(data) {
            *slot ^= byte;
        }
    }

    /// Overwrites the block starting at `offset` with `data`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + data.len()` exceeds [`Block::SIZE`].
    pub fn copy_bytes(&mut self, offset: usize, data: &[u8]) {
        self.0[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Zeroises the block contents.
    pub fn clear(&mut self) {
        self.0.zeroize();
    }

    /// Borrows the raw bytes.
    pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }

    /// Mutably borrows the raw bytes.
    pub fn as_mut_bytes(&mut self) -> &mut [u8; Self::SIZE] {
        &mut self.0
    }

    /// Copies the block contents out.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        self.0
    }
}

impl From<[u8; Block::SIZE]> for Block {
    fn from(bytes: [u8; Block::SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<&[u8; Block::SIZE]> for Block {
    fn from(bytes: &[u8; Block::SIZE]) -> Self {
        Self(*bytes)
    }
}

// Blocks routinely hold subkeys and masks; they must never reach logs.
impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Block([REDACTED])")
    }
}
