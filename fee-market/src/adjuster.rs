//! The controller abstraction shared by every algorithm.

use crate::state::{Block, FeeState};

/// A base-fee controller fed one gas observation per block.
///
/// Implementations never return errors or panic from these methods; invalid
/// configuration is rejected before construction (see
/// [`AdjusterFactory`](crate::factory::AdjusterFactory)) and numeric edge cases
/// resolve to neutral values.
///
/// Callers must serialize calls on a single instance.
///
/// Future randomness injection (gas, fee or delay jitter) belongs in a
/// decorator that wraps any `FeeAdjuster` and perturbs its inputs and outputs,
/// rather than inside the algorithms.
pub trait FeeAdjuster {
    /// Record a block that consumed `gas_used` gas and react to it. Values
    /// above [`max_block_size`](Self::max_block_size) are accepted as-is.
    fn process_block(&mut self, gas_used: u64);

    fn current_state(&self) -> FeeState;

    /// `target × burst multiplier`; constant for the instance.
    fn max_block_size(&self) -> u64;

    /// Copy of every block processed since construction or the last reset.
    fn blocks(&self) -> Vec<Block>;

    /// Restore the initial configuration and discard all history.
    fn reset(&mut self);
}

impl<T: FeeAdjuster + ?Sized> FeeAdjuster for Box<T> {
    fn process_block(&mut self, gas_used: u64) {
        (**self).process_block(gas_used)
    }

    fn current_state(&self) -> FeeState {
        (**self).current_state()
    }

    fn max_block_size(&self) -> u64 {
        (**self).max_block_size()
    }

    fn blocks(&self) -> Vec<Block> {
        (**self).blocks()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
