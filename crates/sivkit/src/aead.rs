//! Conventional nonce-based facade over [`Siv`].

use sivkit_common::{CryptoProvider, Result};

use crate::siv::{Algorithm, Siv};

/// Nonce-based AEAD over the SIV construction.
///
/// The nonce rides as the final associated-data item of S2V, so any nonce
/// length works, and a repeated nonce degrades to determinism rather than
/// to a broken keystream.
pub struct Aead {
    siv: Siv,
}

impl Aead {
    /// Imports a combined key; see [`Siv::import_key`].
    pub async fn import_key(
        provider: &dyn CryptoProvider,
        key: &[u8],
        algorithm: Algorithm,
    ) -> Result<Self> {
        Ok(Self {
            siv: Siv::import_key(provider, key, algorithm).await?,
        })
    }

    /// Seals `plaintext` under `nonce`, binding every item of
    /// `associated_data` and then the nonce itself as the final item.
    pub async fn seal(
        &mut self,
        plaintext: &[u8],
        nonce: &[u8],
        associated_data: &[&[u8]],
    ) -> Result<Vec<u8>> {
        let mut items = Vec::with_capacity(associated_data.len() + 1);
        items.extend_from_slice(associated_data);
        items.push(nonce);
        self.siv.seal(plaintext, &items).await
    }

    /// Opens `sealed` under the same nonce and associated data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integrity`](sivkit_common::Error::Integrity) on
    /// any mismatch of ciphertext, nonce or associated data.
    pub async fn open(
        &mut self,
        sealed: &[u8],
        nonce: &[u8],
        associated_data: &[&[u8]],
    ) -> Result<Vec<u8>> {
        let mut items = Vec::with_capacity(associated_data.len() + 1);
        items.extend_from_slice(associated_data);
        items.push(nonce);
        self.siv.open(sealed, &items).await
    }

    /// Wipes the construction-owned key material.
    pub fn clear(&mut self) {
        self.siv.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::siv::MAX_ASSOCIATED_DATA;
    use hex_literal::hex;
    use sivkit_common::Error;
    use sivkit_soft::SoftAesProvider;

    const KEY: [u8; 64] = hex!(
        "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f"
        "202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f"
    );

    async fn aead(algorithm: Algorithm) -> Aead {
        Aead::import_key(&SoftAesProvider, &KEY, algorithm)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn round_trips_with_both_algorithms() {
        for algorithm in [Algorithm::AesSiv, Algorithm::AesPmacSiv] {
            let mut aead = aead(algorithm).await;
            let sealed = aead
                .seal(b"the message", b"nonce-1", &[b"header"])
                .await
                .unwrap();
            let opened = aead.open(&sealed, b"nonce-1", &[b"header"]).await.unwrap();
            assert_eq!(opened, b"the message", "{algorithm}");
        }
    }

    #[tokio::test]
    async fn matches_siv_with_nonce_as_final_item() {
        let mut aead = aead(Algorithm::AesSiv).await;
        let sealed = aead
            .seal(b"payload", b"the-nonce", &[b"ad-1", b"ad-2"])
            .await
            .unwrap();

        let mut siv = Siv::import_key(&SoftAesProvider, &KEY, Algorithm::AesSiv)
            .await
            .unwrap();
        let expected = siv
            .seal(b"payload", &[b"ad-1", b"ad-2", b"the-nonce"])
            .await
            .unwrap();
        assert_eq!(sealed, expected);
    }

    #[tokio::test]
    async fn wrong_nonce_or_associated_data_fails() {
        let mut aead = aead(Algorithm::AesSiv).await;
        let sealed = aead.seal(b"payload", b"nonce", &[b"ad"]).await.unwrap();

        let err = aead.open(&sealed, b"other", &[b"ad"]).await.unwrap_err();
        assert_eq!(err, Error::Integrity);
        let err = aead.open(&sealed, b"nonce", &[b"other"]).await.unwrap_err();
        assert_eq!(err, Error::Integrity);
        let err = aead.open(&sealed, b"nonce", &[]).await.unwrap_err();
        assert_eq!(err, Error::Integrity);
        assert_eq!(
            aead.open(&sealed, b"nonce", &[b"ad"]).await.unwrap(),
            b"payload"
        );
    }

    #[tokio::test]
    async fn nonce_reuse_stays_deterministic() {
        let mut aead = aead(Algorithm::AesSiv).await;
        let first = aead.seal(b"same message", b"same nonce", &[]).await.unwrap();
        let second = aead.seal(b"same message", b"same nonce", &[]).await.unwrap();
        assert_eq!(first, second);

        let different = aead
            .seal(b"other message", b"same nonce", &[])
            .await
            .unwrap();
        assert_ne!(first, different);
    }

    #[tokio::test]
    async fn empty_nonce_and_associated_data_round_trip() {
        let mut aead = aead(Algorithm::AesSiv).await;
        let sealed = aead.seal(b"payload", b"", &[]).await.unwrap();
        assert_eq!(aead.open(&sealed, b"", &[]).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn associated_data_limit_counts_the_nonce() {
        let mut aead = aead(Algorithm::AesSiv).await;
        let items: Vec<&[u8]> = vec![b"x"; MAX_ASSOCIATED_DATA];
        let err = aead.seal(b"payload", b"nonce", &items).await.unwrap_err();
        assert_eq!(err, Error::TooManyAssociatedData(MAX_ASSOCIATED_DATA + 1));
    }
}
