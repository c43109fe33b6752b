//! PID base-fee adjuster.
//!
//! The error signal is the latest block's utilization minus one. The integral
//! term is clamped to `[min_integral, max_integral]` and the derivative is the
//! least-squares slope of the recent error history once it holds `window_size`
//! samples, a two-point difference before that.
//!
//! ```text
//! e      = gas / target − 1
//! I      = clamp(I + e, min_integral, max_integral)
//! u      = clamp(kp·e + ki·I + kd·de/dt, −max_fee_change, max_fee_change)
//! fee'   = max(fee × (1 + u), min_base_fee)
//! ```

use {
    crate::{
        adjuster::FeeAdjuster,
        calculator,
        config::PidConfig,
        state::{Block, BlockLog, FeeState},
    },
    log::*,
    std::collections::VecDeque,
};

/// Integral accumulator and bounded error history shared by the PID-style
/// controllers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PidState {
    integral: f64,
    last_error: f64,
    history: VecDeque<f64>,
}

impl PidState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate `error` with anti-windup and push it onto the history,
    /// keeping at most `window` samples.
    pub fn update(&mut self, error: f64, min_integral: f64, max_integral: f64, window: usize) {
        self.integral = calculator::clamp_f64(self.integral + error, min_integral, max_integral);
        self.history.push_back(error);
        while self.history.len() > window.max(1) {
            self.history.pop_front();
        }
        self.last_error = error;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    pub fn history(&self) -> &VecDeque<f64> {
        &self.history
    }

    /// Latest error minus the previous one.
    pub fn simple_derivative(&self) -> f64 {
        calculator::simple_difference(&self.history)
    }

    /// Regression slope once `window` samples exist, otherwise the two-point
    /// difference.
    pub fn smoothed_derivative(&self, window: usize) -> f64 {
        if self.history.len() < 2 {
            0.0
        } else if self.history.len() < window {
            self.simple_derivative()
        } else {
            calculator::regression_slope(&self.history)
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct PidAdjuster {
    config: PidConfig,
    blocks: BlockLog,
    base_fee: u64,
    pid: PidState,
    last_output: f64,
}

impl PidAdjuster {
    pub fn new(config: PidConfig) -> Self {
        Self {
            base_fee: config.initial_base_fee,
            blocks: BlockLog::new(),
            pid: PidState::new(),
            last_output: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    pub fn integral(&self) -> f64 {
        self.pid.integral()
    }

    /// Clamped control output applied to the most recent block.
    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    fn control_output(&self, error: f64) -> f64 {
        let output = self.config.kp * error
            + self.config.ki * self.pid.integral()
            + self.config.kd * self.pid.smoothed_derivative(self.config.window_size);
        calculator::clamp_f64(output, -self.config.max_fee_change, self.config.max_fee_change)
    }
}

impl FeeAdjuster for PidAdjuster {
    fn process_block(&mut self, gas_used: u64) {
        let block = self.blocks.record(gas_used, self.base_fee);

        let error = if self.config.target_block_size == 0 {
            0.0
        } else {
            calculator::block_utilization(gas_used, self.config.target_block_size) - 1.0
        };
        self.pid.update(
            error,
            self.config.min_integral,
            self.config.max_integral,
            self.config.window_size,
        );

        self.last_output = self.control_output(error);
        self.base_fee = calculator::scale_fee(self.base_fee, self.last_output, self.config.min_base_fee);
        debug!(
            "pid: block {} gas={} error={:.6} integral={:.6} output={:.6} fee {} -> {}",
            block.number,
            gas_used,
            error,
            self.pid.integral(),
            self.last_output,
            block.base_fee,
            self.base_fee
        );
    }

    /// The learning-rate equivalent is the magnitude of the last control
    /// output, bounded by `[0, max_fee_change]`.
    fn current_state(&self) -> FeeState {
        let window = self.config.window_size;
        FeeState {
            base_fee: self.base_fee,
            learning_rate: self.last_output.abs(),
            target_utilization: calculator::target_utilization(
                self.blocks.as_slice(),
                window,
                self.config.target_block_size,
            ),
            burst_utilization: calculator::burst_utilization(
                self.blocks.as_slice(),
                window,
                self.max_block_size(),
            ),
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
        self.pid.clear();
        self.last_output = 0.0;
    }
}
