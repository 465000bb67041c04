//! AES-SIV (RFC 5297) and AES-PMAC-SIV.
//!
//! S2V folds any number of associated-data items and the plaintext into a
//! synthetic IV, which both authenticates the message and seeds the CTR
//! keystream. Sealing is deterministic: no random IV exists to misuse, and
//! repeating a nonce reveals at most that two messages were equal.

use std::fmt;
use std::str::FromStr;

use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroize;

use sivkit_common::{Block, CryptoProvider, CtrCipher, Error, Result};

use crate::mac::{Cmac, Mac, Pmac};

/// Maximum number of associated-data items S2V can bind to one message.
pub const MAX_ASSOCIATED_DATA: usize = 126;

/// Construction selector for [`Siv`], [`Aead`](crate::Aead) and the
/// stream types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// RFC 5297 AES-SIV: S2V over CMAC.
    AesSiv,
    /// AES-PMAC-SIV: S2V over PMAC.
    AesPmacSiv,
}

impl Algorithm {
    /// Canonical identifier, e.g. `"AES-SIV"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::AesSiv => "AES-SIV",
            Algorithm::AesPmacSiv => "AES-PMAC-SIV",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    /// Accepts the canonical identifiers plus the historical
    /// `"AES-CMAC-SIV"` alias for [`Algorithm::AesSiv`].
    fn from_str(value: &str) -> Result<Self> {
        match value {
            "AES-SIV" | "AES-CMAC-SIV" => Ok(Algorithm::AesSiv),
            "AES-PMAC-SIV" => Ok(Algorithm::AesPmacSiv),
            other => Err(Error::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Deterministic authenticated encryption with a synthetic IV.
pub struct Siv {
    mac: Box<dyn Mac>,
    ctr: Box<dyn CtrCipher>,
}

impl Siv {
    /// Imports a combined key: the first half keys S2V's MAC, the second
    /// half keys the CTR layer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyLength`] if the length is odd or either
    /// half is not a key size the provider supports.
    pub async fn import_key(
        provider: &dyn CryptoProvider,
        key: &[u8],
        algorithm: Algorithm,
    ) -> Result<Self> {
        if key.len() % 2 != 0 {
            return Err(Error::InvalidKeyLength(key.len()));
        }
        let (mac_key, ctr_key) = key.split_at(key.len() / 2);

        let mac: Box<dyn Mac> = match algorithm {
            Algorithm::AesSiv => Box::new(Cmac::import_key(provider, mac_key).await?),
            Algorithm::AesPmacSiv => Box::new(Pmac::import_key(provider, mac_key).await?),
        };
        let ctr = provider.import_ctr_key(ctr_key).await?;

        debug!(algorithm = %algorithm, key_len = key.len(), "imported SIV key");
        Ok(Self { mac, ctr })
    }

    /// Seals `plaintext`, binding every associated-data item in order, and
    /// returns `tag || ciphertext` (one block longer than the input).
    ///
    /// Deterministic: the same key, plaintext and associated data always
    /// produce the same output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManyAssociatedData`] for more than
    /// [`MAX_ASSOCIATED_DATA`] items.
    pub async fn seal(&mut self, plaintext: &[u8], associated_data: &[&[u8]]) -> Result<Vec<u8>> {
        if associated_data.len() > MAX_ASSOCIATED_DATA {
            return Err(Error::TooManyAssociatedData(associated_data.len()));
        }

        let iv = self.s2v(plaintext, associated_data).await?;
        let ciphertext = self.ctr.encrypt_ctr(&zero_iv_bits(&iv), plaintext).await?;

        let mut sealed = Vec::with_capacity(Block::SIZE + ciphertext.len());
        sealed.extend_from_slice(iv.as_bytes());
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Opens `sealed` (as produced by [`seal`](Siv::seal)) under the same
    /// associated data and returns the plaintext.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integrity`] if `sealed` is shorter than one block
    /// or the recomputed tag does not match; the candidate plaintext is
    /// wiped before the error is returned.
    pub async fn open(&mut self, sealed: &[u8], associated_data: &[&[u8]]) -> Result<Vec<u8>> {
        if associated_data.len() > MAX_ASSOCIATED_DATA {
            return Err(Error::TooManyAssociatedData(associated_data.len()));
        }
        if sealed.len() < Block::SIZE {
            return Err(Error::Integrity);
        }

        let (tag, ciphertext) = sealed.split_at(Block::SIZE);
        let mut iv = Block::new();
        iv.copy_bytes(0, tag);

        let mut plaintext = self.ctr.encrypt_ctr(&zero_iv_bits(&iv), ciphertext).await?;
        let expected = self.s2v(&plaintext, associated_data).await?;

        if bool::from(expected.as_bytes()[..].ct_eq(tag)) {
            Ok(plaintext)
        } else {
            plaintext.zeroize();
            debug!("tag verification failed");
            Err(Error::Integrity)
        }
    }

    /// Wipes the MAC layer's subkeys, masks and buffers. The CTR key
    /// schedule is wiped when the provider handle drops.
    pub fn clear(&mut self) {
        self.mac.clear();
    }

    /// S2V of RFC 5297 §2.4: a chained MAC over the associated data and
    /// the message, where the message enters either via xorend (length of
    /// at least one block) or doubled-and-padded (shorter).
    async fn s2v(&mut self, data: &[u8], associated_data: &[&[u8]]) -> Result<Block> {
        self.mac.reset();
        self.mac.update(Block::new().as_bytes()).await?;
        let mut state = Block::from(self.mac.finish().await?);

        for item in associated_data {
            self.mac.reset();
            self.mac.update(item).await?;
            let item_mac = self.mac.finish().await?;
            state.dbl();
            state.xor_bytes(0, &item_mac);
        }

        self.mac.reset();
        if data.len() >= Block::SIZE {
            // xorend: the chain state folds into the last block of the
            // message while it streams through the MAC.
            let split = data.len() - Block::SIZE;
            self.mac.update(&data[..split]).await?;

            let mut tail = Block::new();
            tail.copy_bytes(0, &data[split..]);
            tail.xor_in_place(&state);
            self.mac.update(tail.as_bytes()).await?;
        } else {
            state.dbl();
            state.xor_bytes(0, data);
            state.as_mut_bytes()[data.len()] ^= 0x80;
            self.mac.update(state.as_bytes()).await?;
        }

        let iv = Block::from(self.mac.finish().await?);
        self.mac.reset();
        Ok(iv)
    }
}

/// RFC 5297 §2.5: the keystream counter runs with the top bit of each of
/// the last two 32-bit words of the IV cleared.
fn zero_iv_bits(iv: &Block) -> Block {
    let mut out = iv.clone();
    let bytes = out.as_mut_bytes();
    bytes[8] &= 0x7f;
    bytes[12] &= 0x7f;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use sivkit_soft::SoftAesProvider;

    // RFC 5297 appendix A.1 (deterministic authenticated encryption).
    const A1_KEY: [u8; 32] =
        hex!("fffefdfcfbfaf9f8f7f6f5f4f3f2f1f0f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
    const A1_AD: [u8; 24] = hex!("101112131415161718191a1b1c1d1e1f2021222324252627");
    const A1_PLAINTEXT: [u8; 14] = hex!("112233445566778899aabbccddee");
    const A1_SEALED: [u8; 30] =
        hex!("85632d07c6e8f37f950acd320a2ecc9340c02b9690c4dc04daef7f6afe5c");

    // RFC 5297 appendix A.2 (nonce-based authenticated encryption).
    const A2_KEY: [u8; 32] =
        hex!("7f7e7d7c7b7a79787776757473727170404142434445464748494a4b4c4d4e4f");
    const A2_AD1: [u8; 40] = hex!(
        "00112233445566778899aabbccddeeffdeaddadadeaddadaffeeddccbbaa99887766554433221100"
    );
    const A2_AD2: [u8; 10] = hex!("102030405060708090a0");
    const A2_NONCE: [u8; 16] = hex!("09f911029d74e35bd84156c5635688c0");
    const A2_PLAINTEXT: &[u8] = b"this is some plaintext to encrypt using SIV-AES";
    const A2_SEALED: [u8; 63] = hex!(
        "7bdb6e3b432667eb06f4d14bff2fbd0f"
        "cb900f2fddbe404326601965c889bf17"
        "dba77ceb094fa663b7a3f748ba8af829"
        "ea64ad544a272e9c485b62a3fd5c0d"
    );

    async fn a1_siv() -> Siv {
        Siv::import_key(&SoftAesProvider, &A1_KEY, Algorithm::AesSiv)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn seals_rfc5297_a1_example() {
        crate::testing::init_tracing();
        let mut siv = a1_siv().await;
        let sealed = siv.seal(&A1_PLAINTEXT, &[&A1_AD]).await.unwrap();
        assert_eq!(sealed, A1_SEALED);
    }

    #[tokio::test]
    async fn opens_rfc5297_a1_example() {
        let mut siv = a1_siv().await;
        let opened = siv.open(&A1_SEALED, &[&A1_AD]).await.unwrap();
        assert_eq!(opened, A1_PLAINTEXT);
    }

    #[tokio::test]
    async fn seals_rfc5297_a2_example() {
        let mut siv = Siv::import_key(&SoftAesProvider, &A2_KEY, Algorithm::AesSiv)
            .await
            .unwrap();
        let sealed = siv
            .seal(A2_PLAINTEXT, &[&A2_AD1, &A2_AD2, &A2_NONCE])
            .await
            .unwrap();
        assert_eq!(sealed, A2_SEALED);

        let opened = siv
            .open(&A2_SEALED, &[&A2_AD1, &A2_AD2, &A2_NONCE])
            .await
            .unwrap();
        assert_eq!(opened, A2_PLAINTEXT);
    }

    #[tokio::test]
    async fn sealing_is_deterministic() {
        let mut siv = a1_siv().await;
        let first = siv.seal(&A1_PLAINTEXT, &[&A1_AD]).await.unwrap();
        let second = siv.seal(&A1_PLAINTEXT, &[&A1_AD]).await.unwrap();
        assert_eq!(first, second);

        let other = siv.seal(b"different message", &[&A1_AD]).await.unwrap();
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn any_bit_flip_fails_opening() {
        let mut siv = a1_siv().await;
        for byte in 0..A1_SEALED.len() {
            for bit in 0..8 {
                let mut corrupted = A1_SEALED;
                corrupted[byte] ^= 1 << bit;
                let err = siv.open(&corrupted, &[&A1_AD]).await.unwrap_err();
                assert_eq!(err, Error::Integrity, "byte {byte} bit {bit}");
            }
        }
    }

    #[tokio::test]
    async fn associated_data_order_matters() {
        let mut siv = Siv::import_key(&SoftAesProvider, &A2_KEY, Algorithm::AesSiv)
            .await
            .unwrap();
        let sealed = siv.seal(b"payload", &[b"first", b"second"]).await.unwrap();

        assert!(siv.open(&sealed, &[b"first", b"second"]).await.is_ok());
        let err = siv.open(&sealed, &[b"second", b"first"]).await.unwrap_err();
        assert_eq!(err, Error::Integrity);
        let err = siv.open(&sealed, &[b"first"]).await.unwrap_err();
        assert_eq!(err, Error::Integrity);
    }

    #[tokio::test]
    async fn empty_plaintext_and_no_associated_data_round_trip() {
        let mut siv = a1_siv().await;
        let sealed = siv.seal(b"", &[]).await.unwrap();
        assert_eq!(sealed.len(), Block::SIZE);
        let opened = siv.open(&sealed, &[]).await.unwrap();
        assert!(opened.is_empty());
    }

    #[tokio::test]
    async fn block_aligned_plaintext_round_trips() {
        // Exactly one block exercises the degenerate xorend split.
        let mut siv = a1_siv().await;
        let plaintext = [0xa5u8; Block::SIZE];
        let sealed = siv.seal(&plaintext, &[]).await.unwrap();
        assert_eq!(siv.open(&sealed, &[]).await.unwrap(), plaintext);
    }

    #[tokio::test]
    async fn truncated_input_fails_opening() {
        let mut siv = a1_siv().await;
        for len in [0usize, 1, Block::SIZE - 1] {
            let err = siv.open(&A1_SEALED[..len], &[&A1_AD]).await.unwrap_err();
            assert_eq!(err, Error::Integrity, "len {len}");
        }
    }

    #[tokio::test]
    async fn odd_key_length_is_rejected() {
        let result = Siv::import_key(&SoftAesProvider, &[0u8; 31], Algorithm::AesSiv).await;
        assert!(matches!(result, Err(Error::InvalidKeyLength(31))));
    }

    #[tokio::test]
    async fn unsupported_half_size_is_rejected() {
        // 48 bytes splits into two AES-192 halves, which no provider keys.
        let result = Siv::import_key(&SoftAesProvider, &[0u8; 48], Algorithm::AesSiv).await;
        assert!(matches!(result, Err(Error::InvalidKeyLength(24))));
    }

    #[tokio::test]
    async fn associated_data_item_limit_is_enforced() {
        let mut siv = a1_siv().await;
        let items: Vec<&[u8]> = vec![b"x"; MAX_ASSOCIATED_DATA + 1];
        let err = siv.seal(b"payload", &items).await.unwrap_err();
        assert_eq!(err, Error::TooManyAssociatedData(MAX_ASSOCIATED_DATA + 1));

        let items: Vec<&[u8]> = vec![b"x"; MAX_ASSOCIATED_DATA];
        assert!(siv.seal(b"payload", &items).await.is_ok());
    }

    #[tokio::test]
    async fn pmac_variant_round_trips_and_differs() {
        let mut pmac_siv = Siv::import_key(&SoftAesProvider, &A1_KEY, Algorithm::AesPmacSiv)
            .await
            .unwrap();
        let sealed = pmac_siv.seal(&A1_PLAINTEXT, &[&A1_AD]).await.unwrap();
        assert_ne!(sealed, A1_SEALED);
        assert_eq!(
            pmac_siv.open(&sealed, &[&A1_AD]).await.unwrap(),
            A1_PLAINTEXT
        );

        // A CMAC-keyed instance must reject the PMAC-sealed message.
        let mut siv = a1_siv().await;
        let err = siv.open(&sealed, &[&A1_AD]).await.unwrap_err();
        assert_eq!(err, Error::Integrity);
    }

    #[tokio::test]
    async fn pmac_variant_matches_the_s2v_ctr_composition() {
        let mut pmac_siv = Siv::import_key(&SoftAesProvider, &A1_KEY, Algorithm::AesPmacSiv)
            .await
            .unwrap();
        let sealed = pmac_siv.seal(&A1_PLAINTEXT, &[&A1_AD]).await.unwrap();

        // S2V over PMAC, replayed step by step through the primitives.
        let (mac_key, ctr_key) = A1_KEY.split_at(A1_KEY.len() / 2);
        let mut mac = Pmac::import_key(&SoftAesProvider, mac_key).await.unwrap();
        mac.update(Block::new().as_bytes()).await.unwrap();
        let mut state = Block::from(mac.finish().await.unwrap());

        mac.reset();
        mac.update(&A1_AD).await.unwrap();
        let ad_mac = mac.finish().await.unwrap();
        state.dbl();
        state.xor_bytes(0, &ad_mac);

        // The plaintext is shorter than one block, so it enters doubled
        // and padded rather than via xorend.
        state.dbl();
        state.xor_bytes(0, &A1_PLAINTEXT);
        state.as_mut_bytes()[A1_PLAINTEXT.len()] ^= 0x80;
        mac.reset();
        mac.update(state.as_bytes()).await.unwrap();
        let iv = Block::from(mac.finish().await.unwrap());

        let mut masked = iv.clone();
        masked.as_mut_bytes()[8] &= 0x7f;
        masked.as_mut_bytes()[12] &= 0x7f;
        let ctr = SoftAesProvider.import_ctr_key(ctr_key).await.unwrap();
        let ciphertext = ctr.encrypt_ctr(&masked, &A1_PLAINTEXT).await.unwrap();

        let mut expected = iv.to_bytes().to_vec();
        expected.extend_from_slice(&ciphertext);
        assert_eq!(sealed, expected);
    }

    #[tokio::test]
    async fn wrong_key_fails_opening() {
        let mut siv = a1_siv().await;
        let sealed = siv.seal(&A1_PLAINTEXT, &[&A1_AD]).await.unwrap();

        let mut wrong_key = A1_KEY;
        wrong_key[0] ^= 0x01;
        let mut other = Siv::import_key(&SoftAesProvider, &wrong_key, Algorithm::AesSiv)
            .await
            .unwrap();
        let err = other.open(&sealed, &[&A1_AD]).await.unwrap_err();
        assert_eq!(err, Error::Integrity);
    }

    #[tokio::test]
    async fn clear_leaves_instance_unusable_but_calm() {
        let mut siv = a1_siv().await;
        siv.clear();
        // Sealing after clear produces output under wiped subkeys; it must
        // not match the real vector.
        let sealed = siv.seal(&A1_PLAINTEXT, &[&A1_AD]).await.unwrap();
        assert_ne!(sealed, A1_SEALED);
    }

    #[test]
    fn algorithm_identifiers_parse_and_display() {
        assert_eq!("AES-SIV".parse::<Algorithm>().unwrap(), Algorithm::AesSiv);
        assert_eq!(
            "AES-CMAC-SIV".parse::<Algorithm>().unwrap(),
            Algorithm::AesSiv
        );
        assert_eq!(
            "AES-PMAC-SIV".parse::<Algorithm>().unwrap(),
            Algorithm::AesPmacSiv
        );
        assert_eq!(Algorithm::AesSiv.to_string(), "AES-SIV");
        assert_eq!(Algorithm::AesPmacSiv.to_string(), "AES-PMAC-SIV");

        let err = "AES-GCM".parse::<Algorithm>().unwrap_err();
        assert_eq!(err, Error::UnsupportedAlgorithm("AES-GCM".into()));
    }
}
