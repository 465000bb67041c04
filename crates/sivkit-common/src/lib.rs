//! Shared primitives for the `sivkit` workspace: the 128-bit block unit,
//! the workspace error taxonomy, and the asynchronous cipher-provider
//! capability traits that the constructions are generic over.

pub mod block;
pub mod error;
pub mod provider;

pub use block::Block;
pub use error::{Error, Result};
pub use provider::{BlockCipher, CryptoProvider, CtrCipher};
