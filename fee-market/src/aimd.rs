//! Additive-increase / multiplicative-decrease base-fee adjuster.
//!
//! The learning rate grows by `alpha` while windowed utilization is more than
//! `gamma` away from target, and decays by `beta` otherwise. The base fee then
//! moves in proportion to the latest block's deviation from target:
//!
//! ```text
//! lr'  = min(max_lr, lr + alpha)          if |util - 1| > gamma
//!      = max(min_lr, lr * beta)           otherwise
//! fee' = fee * (1 + lr' * (gas - target) / target) + delta * Σ(gas_i - target)
//! ```
//!
//! Nothing moves until the window has filled.

use {
    crate::{
        adjuster::FeeAdjuster,
        calculator,
        config::AimdConfig,
        state::{Block, BlockLog, FeeState},
    },
    log::*,
};

#[derive(Debug, Clone)]
pub struct AimdAdjuster {
    config: AimdConfig,
    blocks: BlockLog,
    learning_rate: f64,
    base_fee: u64,
}

impl AimdAdjuster {
    pub fn new(config: AimdConfig) -> Self {
        Self {
            learning_rate: config.initial_learning_rate,
            base_fee: config.initial_base_fee,
            blocks: BlockLog::new(),
            config,
        }
    }

    pub fn config(&self) -> &AimdConfig {
        &self.config
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn window_full(&self) -> bool {
        self.blocks.len() >= self.config.window_size
    }

    fn adjust_learning_rate(&mut self) {
        let utilization = calculator::target_utilization(
            self.blocks.as_slice(),
            self.config.window_size,
            self.config.target_block_size,
        );
        self.learning_rate = if (utilization - 1.0).abs() > self.config.gamma {
            (self.config.alpha + self.learning_rate).min(self.config.max_learning_rate)
        } else {
            (self.config.beta * self.learning_rate).max(self.config.min_learning_rate)
        };
    }

    fn adjust_base_fee(&mut self, gas_used: u64) {
        let target = self.config.target_block_size;
        let adjustment = if target == 0 {
            0.0
        } else {
            self.learning_rate * (gas_used as f64 - target as f64) / target as f64
        };
        let net_delta =
            calculator::net_gas_delta(self.blocks.as_slice(), self.config.window_size, target);
        let next = self.base_fee as f64 * (1.0 + adjustment) + self.config.delta * net_delta as f64;
        self.base_fee = calculator::floor_fee(next, self.config.min_base_fee);
    }
}

impl FeeAdjuster for AimdAdjuster {
    fn process_block(&mut self, gas_used: u64) {
        let block = self.blocks.record(gas_used, self.base_fee);
        if !self.window_full() {
            debug!(
                "aimd: block {} warming up ({}/{})",
                block.number,
                self.blocks.len(),
                self.config.window_size
            );
            return;
        }

        self.adjust_learning_rate();
        self.adjust_base_fee(gas_used);
        debug!(
            "aimd: block {} gas={} fee {} -> {} lr={:.6}",
            block.number, gas_used, block.base_fee, self.base_fee, self.learning_rate
        );
    }

    fn current_state(&self) -> FeeState {
        let (target_utilization, burst_utilization) = if self.window_full() {
            (
                calculator::target_utilization(
                    self.blocks.as_slice(),
                    self.config.window_size,
                    self.config.target_block_size,
                ),
                calculator::burst_utilization(
                    self.blocks.as_slice(),
                    self.config.window_size,
                    self.max_block_size(),
                ),
            )
        } else {
            (0.0, 0.0)
        };
        FeeState {
            base_fee: self.base_fee,
            learning_rate: self.learning_rate,
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
        self.learning_rate = self.config.initial_learning_rate;
        self.base_fee = self.config.initial_base_fee;
    }
}
