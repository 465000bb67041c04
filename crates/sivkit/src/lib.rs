//! Nonce-misuse-resistant authenticated encryption.
//!
//! Implements AES-SIV (RFC 5297) and AES-PMAC-SIV over a pluggable
//! asynchronous cipher provider, together with the STREAM construction
//! for chunked online encryption.
//!
//! The synthetic IV doubles as the authentication tag and the CTR
//! starting counter, so sealing is deterministic and a repeated nonce
//! reveals at most that two messages were equal. The price is two passes
//! over the plaintext; [`StreamEncryptor`] recovers online operation by
//! sealing a sequence of bounded chunks.
//!
//! ```
//! use sivkit::{Aead, Algorithm, SoftAesProvider};
//!
//! #[tokio::main]
//! async fn main() -> sivkit::Result<()> {
//!     let mut aead = Aead::import_key(&SoftAesProvider, &[0u8; 32], Algorithm::AesSiv).await?;
//!     let sealed = aead.seal(b"a very secret message", b"nonce", &[]).await?;
//!     assert_eq!(aead.open(&sealed, b"nonce", &[]).await?, b"a very secret message");
//!     Ok(())
//! }
//! ```

pub mod aead;
pub mod mac;
pub mod siv;
pub mod stream;

pub use aead::Aead;
pub use mac::{Cmac, Mac, Pmac};
pub use siv::{Algorithm, Siv, MAX_ASSOCIATED_DATA};
pub use stream::{StreamDecryptor, StreamEncryptor, NONCE_PREFIX_SIZE};

pub use sivkit_common::{Block, BlockCipher, CryptoProvider, CtrCipher, Error, Result};

#[cfg(feature = "soft")]
pub use sivkit_soft::SoftAesProvider;
