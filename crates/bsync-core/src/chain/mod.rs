//! Block identity and the chain sink that accepts downloaded blocks.
//!
//! The reservation table never validates or stores blocks itself; it forwards
//! each completed block to a [`ChainSink`] at the height recorded in the row.

mod hash;
mod memory;

pub use hash::BlockHash;
pub use memory::MemoryChain;

/// A downloaded block: its hash plus opaque payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub hash: BlockHash,
    pub payload: Vec<u8>,
}

impl Block {
    pub fn new(hash: BlockHash, payload: Vec<u8>) -> Self {
        Self { hash, payload }
    }
}

/// Durable acceptor of completed blocks. Implementations must be thread safe;
/// callers perform no extra synchronization around `import`.
pub trait ChainSink: Send + Sync {
    /// Accept `block` at `height`. Returns false if the sink rejects it.
    fn import(&self, block: Block, height: u64) -> bool;
}
