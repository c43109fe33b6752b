//! Strategic (batcher) layer.
//!
//! Prices blocks with the EIP-1559 rule while tracking simulated L1
//! data-availability pressure. On a wall-clock cadence it runs a slow PID loop
//! on DA utilization and pushes a rate-limited set of tactical-layer
//! parameters onto its outbound [`UpdateLink`].
//!
//! Parameter policy by average DA utilization `u`:
//!
//! | Tier      | Condition              | Kp            | Ki             | Max fee change  |
//! |-----------|------------------------|---------------|----------------|-----------------|
//! | Emergency | `u > max`              | 1.5           | 0.15           | 0.25            |
//! | Pressure  | `target < u <= max`    | 0.8 + 0.7·p   | 0.15 − 0.05·p  | 0.25 + 0.15·p   |
//! | Low       | `u <= target`          | 0.6           | 0.2            | 0.2             |
//!
//! where `p = (u − target) / (max − target)`. Emergency additionally enables
//! throttling at intensity `min(0.5, 2·(u − max))` and lowers the target
//! utilization to 0.7.

use {
    super::{
        link::{SendOutcome, UpdateLink},
        types::{DaMetrics, SequencerParamUpdate, WEI_PER_ETH, WEI_PER_GWEI},
    },
    crate::{
        adjuster::FeeAdjuster,
        calculator,
        clock::Clock,
        config::StrategicConfig,
        eip1559,
        pid::PidState,
        state::{Block, BlockLog, FeeState},
    },
    log::*,
    serde::Serialize,
    std::{
        collections::VecDeque,
        sync::Arc,
        time::{Duration, Instant},
    },
};

/// Baseline L1 gas price (20 gwei).
pub const BASE_L1_GAS_PRICE: u64 = 20_000_000_000;
/// Bytes available in one blob.
pub const DA_CAPACITY: u64 = 131_072;
/// Gas consumed per DA byte in the simulation.
pub const GAS_PER_DA_BYTE: u64 = 1_000;
/// L1 gas needed to submit one batch.
pub const BATCH_SUBMISSION_GAS: u64 = 100_000;

const EMERGENCY_TARGET_UTILIZATION: f64 = 0.7;
const MAX_THROTTLING_INTENSITY: f64 = 0.5;

/// Derive a DA observation from a block's gas usage.
pub fn simulate_da_metrics(gas_used: u64, target_block_size: u64) -> DaMetrics {
    let utilization = calculator::block_utilization(gas_used, target_block_size);
    let l1_gas_price = (BASE_L1_GAS_PRICE as f64 * (1.0 + utilization * 0.5)) as u64;
    let da_usage = gas_used / GAS_PER_DA_BYTE;
    DaMetrics {
        l1_gas_price,
        blob_price: l1_gas_price / 16,
        da_usage,
        da_capacity: DA_CAPACITY,
        batch_cost: l1_gas_price.saturating_mul(BATCH_SUBMISSION_GAS),
        batch_efficiency: (da_usage as f64 / DA_CAPACITY as f64).min(1.0),
    }
}

/// Move from `current` towards `desired` by at most `current × max_change`.
pub fn clamp_parameter_change(current: f64, desired: f64, max_change: f64) -> f64 {
    let max_abs_change = (current * max_change).abs();
    let change = desired - current;
    if change > max_abs_change {
        current + max_abs_change
    } else if change < -max_abs_change {
        current - max_abs_change
    } else {
        desired
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategicDiagnostics {
    /// `None` until the first block.
    pub l1_gas_price_gwei: Option<f64>,
    pub blob_price_gwei: Option<f64>,
    pub da_utilization: Option<f64>,
    pub batch_cost_eth: Option<f64>,
    pub da_utilization_average: f64,
    pub strategic_output: f64,
    pub current_sequencer_kp: f64,
    pub current_sequencer_ki: f64,
    pub current_sequencer_kd: f64,
    pub throttling_active: bool,
    pub emergency_mode: bool,
    pub last_update_reason: String,
    pub pending_updates: usize,
    pub updates_sent: u64,
}

#[derive(Debug)]
pub struct StrategicLayer {
    config: StrategicConfig,
    clock: Arc<dyn Clock>,
    blocks: BlockLog,
    base_fee: u64,
    da_metrics: VecDeque<DaMetrics>,
    pid: PidState,
    strategic_output: f64,
    last_update: Instant,
    sequencer_params: SequencerParamUpdate,
    da_util_avg: f64,
    emergency_mode: bool,
    outbound: UpdateLink,
    updates_sent: u64,
}

impl StrategicLayer {
    pub fn new(config: StrategicConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            base_fee: config.initial_base_fee,
            blocks: BlockLog::new(),
            da_metrics: VecDeque::with_capacity(config.da_window_size),
            pid: PidState::new(),
            strategic_output: 0.0,
            last_update: now,
            sequencer_params: SequencerParamUpdate::initial(now),
            da_util_avg: 0.0,
            emergency_mode: false,
            outbound: UpdateLink::new(),
            updates_sent: 0,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &StrategicConfig {
        &self.config
    }

    /// Receiving end of the outbound parameter link.
    pub fn updates(&self) -> &UpdateLink {
        &self.outbound
    }

    /// Most recently issued tactical parameters.
    pub fn sequencer_params(&self) -> &SequencerParamUpdate {
        &self.sequencer_params
    }

    pub fn emergency_mode(&self) -> bool {
        self.emergency_mode
    }

    pub fn da_metrics(&self) -> &VecDeque<DaMetrics> {
        &self.da_metrics
    }

    pub fn da_utilization_average(&self) -> f64 {
        self.da_util_avg
    }

    fn update_frequency(&self) -> Duration {
        Duration::from_millis(self.config.update_frequency_ms)
    }

    fn average_da_utilization(&self) -> f64 {
        if self.da_metrics.is_empty() {
            return 0.0;
        }
        let total: f64 = self.da_metrics.iter().map(DaMetrics::utilization).sum();
        total / self.da_metrics.len() as f64
    }

    fn update_strategic_parameters(&mut self) {
        if self.da_metrics.is_empty() {
            return;
        }

        let da_util = self.average_da_utilization();
        self.da_util_avg = da_util;
        let error = da_util - self.config.target_da_utilization;
        self.pid.update(
            error,
            self.config.min_integral,
            self.config.max_integral,
            self.config.da_window_size,
        );
        self.strategic_output = self.config.kp * error
            + self.config.ki * self.pid.integral()
            + self.config.kd * self.pid.simple_derivative();
        debug!(
            "strategic: da_util={:.4} error={:.4} output={:.4}",
            da_util, error, self.strategic_output
        );

        let update = self.sequencer_parameters(da_util);
        self.send_parameter_update(update);
    }

    fn sequencer_parameters(&mut self, da_util: f64) -> SequencerParamUpdate {
        let target = self.config.target_da_utilization;
        let max = self.config.max_da_utilization;

        let mut kp = 0.8;
        let mut ki = 0.15;
        let kd = 0.05;
        let mut target_utilization = 1.0;
        let mut max_fee_change = 0.25;
        let mut throttling_active = false;
        let mut throttling_intensity = 0.0;
        let reason;

        if da_util > max {
            if !self.emergency_mode {
                info!(
                    "strategic: entering emergency throttling (DA util {:.2}%)",
                    da_util * 100.0
                );
            }
            self.emergency_mode = true;
            throttling_active = true;
            throttling_intensity = ((da_util - max) * 2.0).min(MAX_THROTTLING_INTENSITY);
            target_utilization = EMERGENCY_TARGET_UTILIZATION;
            kp = 1.5;
            reason = format!("Emergency throttling: DA util {:.2}%", da_util * 100.0);
        } else if da_util > target {
            let pressure = (da_util - target) / (max - target);
            kp = 0.8 + 0.7 * pressure;
            ki = 0.15 - 0.05 * pressure;
            max_fee_change = 0.25 + 0.15 * pressure;
            reason = format!("DA pressure adjustment: util {:.2}%", da_util * 100.0);
        } else {
            if self.emergency_mode {
                info!(
                    "strategic: leaving emergency throttling (DA util {:.2}%)",
                    da_util * 100.0
                );
            }
            self.emergency_mode = false;
            kp = 0.6;
            ki = 0.2;
            max_fee_change = 0.2;
            reason = format!(
                "Low DA pressure: optimizing UX, util {:.2}%",
                da_util * 100.0
            );
        }

        let max_change = self.config.max_parameter_change;
        let previous = &self.sequencer_params;
        let kp = self
            .config
            .sequencer_kp_range
            .clamp(clamp_parameter_change(previous.kp, kp, max_change));
        let ki = self
            .config
            .sequencer_ki_range
            .clamp(clamp_parameter_change(previous.ki, ki, max_change));
        let kd = self
            .config
            .sequencer_kd_range
            .clamp(clamp_parameter_change(previous.kd, kd, max_change));

        SequencerParamUpdate {
            issued_at: self.clock.now(),
            kp,
            ki,
            kd,
            target_utilization,
            max_fee_change,
            throttling_active,
            throttling_intensity,
            reason,
        }
    }

    fn send_parameter_update(&mut self, update: SequencerParamUpdate) {
        self.sequencer_params = update.clone();
        self.updates_sent += 1;
        if self.outbound.send(update) != SendOutcome::Delivered {
            debug!(
                "strategic: outbound link saturated ({} pending)",
                self.outbound.len()
            );
        }
    }

    pub fn diagnostics(&self) -> StrategicDiagnostics {
        let latest = self.da_metrics.back();
        StrategicDiagnostics {
            l1_gas_price_gwei: latest.map(|m| m.l1_gas_price as f64 / WEI_PER_GWEI),
            blob_price_gwei: latest.map(|m| m.blob_price as f64 / WEI_PER_GWEI),
            da_utilization: latest.map(|m| m.batch_efficiency),
            batch_cost_eth: latest.map(|m| m.batch_cost as f64 / WEI_PER_ETH),
            da_utilization_average: self.da_util_avg,
            strategic_output: self.strategic_output,
            current_sequencer_kp: self.sequencer_params.kp,
            current_sequencer_ki: self.sequencer_params.ki,
            current_sequencer_kd: self.sequencer_params.kd,
            throttling_active: self.sequencer_params.throttling_active,
            emergency_mode: self.emergency_mode,
            last_update_reason: self.sequencer_params.reason.clone(),
            pending_updates: self.outbound.len(),
            updates_sent: self.updates_sent,
        }
    }
}

impl FeeAdjuster for StrategicLayer {
    fn process_block(&mut self, gas_used: u64) {
        let block = self.blocks.record(gas_used, self.base_fee);

        self.da_metrics
            .push_back(simulate_da_metrics(gas_used, self.config.target_block_size));
        while self.da_metrics.len() > self.config.da_window_size {
            self.da_metrics.pop_front();
        }

        self.base_fee = eip1559::next_base_fee(
            self.base_fee,
            gas_used,
            self.config.target_block_size,
            self.config.min_base_fee,
        );
        debug!(
            "strategic: block {} gas={} fee {} -> {}",
            block.number, gas_used, block.base_fee, self.base_fee
        );

        if self.clock.since(self.last_update) >= self.update_frequency() {
            self.update_strategic_parameters();
            self.last_update = self.clock.now();
        }
    }

    /// Reports the average DA utilization as the learning-rate equivalent.
    fn current_state(&self) -> FeeState {
        let window = self.config.da_window_size;
        FeeState {
            base_fee: self.base_fee,
            learning_rate: self.da_util_avg,
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
        let now = self.clock.now();
        self.blocks.clear();
        self.base_fee = self.config.initial_base_fee;
        self.da_metrics.clear();
        self.pid.clear();
        self.strategic_output = 0.0;
        self.last_update = now;
        self.sequencer_params = SequencerParamUpdate::initial(now);
        self.da_util_avg = 0.0;
        self.emergency_mode = false;
        self.updates_sent = 0;
        self.outbound.drain();
    }
}
