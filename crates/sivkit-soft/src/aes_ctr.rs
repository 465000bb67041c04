//! AES-CTR keystream generation over the `ctr` crate.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{KeyIvInit, StreamCipher};
use aes::{Aes128, Aes256};
use async_trait::async_trait;
use ctr::Ctr128BE;
use zeroize::{Zeroize, ZeroizeOnDrop};

use sivkit_common::{Block, CtrCipher, Error, Result};

#[derive(Zeroize, ZeroizeOnDrop)]
enum CtrKey {
    Aes128([u8; 16]),
    Aes256([u8; 32]),
}

/// Counter-mode capability keyed with raw AES key bytes.
///
/// The key bytes are held here (wiped on drop) and the cipher instance is
/// rebuilt per call, because each SIV seal starts from a fresh synthetic
/// IV rather than continuing a keystream.
pub(crate) struct SoftAesCtr {
    key: CtrKey,
}

impl SoftAesCtr {
    pub(crate) fn new(key: &[u8]) -> Result<Self> {
        let key = match key.len() {
            16 => CtrKey::Aes128(key.try_into().map_err(|_| Error::InvalidKeyLength(16))?),
            32 => CtrKey::Aes256(key.try_into().map_err(|_| Error::InvalidKeyLength(32))?),
            len => return Err(Error::InvalidKeyLength(len)),
        };
        Ok(Self { key })
    }
}

#[async_trait]
impl CtrCipher for SoftAesCtr {
    async fn encrypt_ctr(&self, counter: &Block, data: &[u8]) -> Result<Vec<u8>> {
        let mut output = data.to_vec();
        let iv = GenericArray::from_slice(counter.as_bytes());
        match &self.key {
            CtrKey::Aes128(key) => {
                let mut cipher = Ctr128BE::<Aes128>::new(GenericArray::from_slice(key), iv);
                cipher.apply_keystream(&mut output);
            }
            CtrKey::Aes256(key) => {
                let mut cipher = Ctr128BE::<Aes256>::new(GenericArray::from_slice(key), iv);
                cipher.apply_keystream(&mut output);
            }
        }
        Ok(output)
    }
}
