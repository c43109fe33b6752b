//! Textbook EIP-1559 base-fee adjuster.
//!
//! Reacts to the latest block only:
//!
//! ```text
//! change = base_fee × (gas_used − target) / target / 8
//! next   = max(base_fee + change, min_base_fee)
//! ```
//!
//! Integer arithmetic truncates toward zero, so the maximum single-block move
//! is 12.5 %.

use {
    crate::{
        adjuster::FeeAdjuster,
        calculator,
        config::Eip1559Config,
        state::{Block, BlockLog, FeeState},
    },
    log::*,
};

/// Fixed EIP-1559 change denominator.
pub const BASE_FEE_MAX_CHANGE_DENOMINATOR: i128 = 8;

/// Next base fee after a block that used `gas_used` against `target`.
///
/// Unchanged when the block hit the target exactly or the target is zero.
/// Arithmetic is widened to `i128` and saturates rather than overflowing.
pub fn next_base_fee(base_fee: u64, gas_used: u64, target: u64, min_base_fee: u64) -> u64 {
    if gas_used == target || target == 0 {
        return base_fee;
    }
    let gas_delta = gas_used as i128 - target as i128;
    let change = (base_fee as i128).saturating_mul(gas_delta)
        / target as i128
        / BASE_FEE_MAX_CHANGE_DENOMINATOR;
    let next = (base_fee as i128)
        .saturating_add(change)
        .max(min_base_fee as i128);
    u64::try_from(next).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone)]
pub struct Eip1559Adjuster {
    config: Eip1559Config,
    blocks: BlockLog,
    base_fee: u64,
}

impl Eip1559Adjuster {
    pub fn new(config: Eip1559Config) -> Self {
        Self {
            base_fee: config.initial_base_fee,
            blocks: BlockLog::new(),
            config,
        }
    }

    pub fn config(&self) -> &Eip1559Config {
        &self.config
    }
}

impl FeeAdjuster for Eip1559Adjuster {
    fn process_block(&mut self, gas_used: u64) {
        let block = self.blocks.record(gas_used, self.base_fee);
        self.base_fee = next_base_fee(
            self.base_fee,
            gas_used,
            self.config.target_block_size,
            self.config.min_base_fee,
        );
        debug!(
            "eip1559: block {} gas={} fee {} -> {}",
            block.number, gas_used, block.base_fee, self.base_fee
        );
    }

    /// Utilization is that of the last block only, not a window.
    fn current_state(&self) -> FeeState {
        let (target_utilization, burst_utilization) = match self.blocks.last() {
            Some(last) => (
                calculator::block_utilization(last.gas_used, self.config.target_block_size),
                calculator::block_utilization(last.gas_used, self.max_block_size()),
            ),
            None => (0.0, 0.0),
        };
        FeeState {
            base_fee: self.base_fee,
            learning_rate: self.config.max_fee_change,
            target_utilization,
            burst_utilization,
        }
    }

    fn max_block_size(&self) -> u64 {
        calculator::max_block_size(self.config.target_block_size, self.config.burst_multiplier)
    }

    fn blocks(&self) -> Vec<Block> {
        self.blocks.to_vec()
    }

    fn reset(&mut self) {
        self.blocks.clear();
        self.base_fee = self.config.initial_base_fee;
    }
}
