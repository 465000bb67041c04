//! Message authentication over the block-cipher capability.

pub mod cmac;
pub mod pmac;

pub use cmac::Cmac;
pub use pmac::Pmac;

use async_trait::async_trait;

use sivkit_common::{Block, Result};

/// An incremental keyed MAC producing one-block tags.
///
/// Implementations buffer at most one block of pending input, so a message
/// of any size streams through in constant memory. How the input is
/// fragmented across [`update`](Mac::update) calls never affects the tag.
#[async_trait]
pub trait Mac: Send + Sync {
    /// Absorbs the next stretch of the message.
    async fn update(&mut self, data: &[u8]) -> Result<()>;

    /// Completes the computation and returns the tag.
    ///
    /// Idempotent: further calls return the same tag without reprocessing.
    async fn finish(&mut self) -> Result<[u8; Block::SIZE]>;

    /// Returns to the freshly keyed state, ready for a new message.
    fn reset(&mut self);

    /// Zeroises subkeys, masks and buffered state. The instance must not
    /// be used afterwards.
    fn clear(&mut self);
}
