use {borsh::{BorshDeserialize, BorshSerialize}, serde::{Deserialize, Serialize}};

/// A single entry in an adjuster's block log.
///
/// Blocks are appended once per processed block and never mutated afterwards.
/// `base_fee` is the fee that was in force when the block was produced, i.e.
/// the value *before* the adjuster reacted to this block's gas usage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Block {
    /// 1-based sequence number within the adjuster's lifetime (or since the
    /// last reset).
    pub number: u64,

    /// Gas consumed by the block. May exceed the maximum block size.
    pub gas_used: u64,

    /// Base fee at the time this block was produced.
    pub base_fee: u64,
}

/// Snapshot of an adjuster, computed on demand from its block log and
/// algorithm-specific internal state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FeeState {
    /// Base fee that the next block will be charged.
    pub base_fee: u64,

    /// Learning-rate-equivalent scalar. Its meaning is algorithm specific but
    /// it is always a non-negative measure of how aggressively the fee moves.
    pub learning_rate: f64,

    /// Windowed gas usage relative to the nominal target (1.0 == on target).
    /// Zero until the algorithm's window has filled.
    pub target_utilization: f64,

    /// Windowed gas usage relative to the maximum (burst) block size.
    /// Zero until the algorithm's window has filled.
    pub burst_utilization: f64,
}

/// Append-only block history shared by every adjuster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockLog {
    blocks: Vec<Block>,
}

impl BlockLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block produced at `base_fee` and return the stored entry.
    pub fn record(&mut self, gas_used: u64, base_fee: u64) -> Block {
        let block = Block {
            number: self.blocks.len() as u64 + 1,
            gas_used,
            base_fee,
        };
        self.blocks.push(block);
        block
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Block] {
        &self.blocks
    }

    pub fn last(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Defensive copy of the history.
    pub fn to_vec(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}
