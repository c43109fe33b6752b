//! Tactical (sequencer) layer.
//!
//! A per-block PID controller whose gains, target utilization, max fee change
//! and throttling directives are replaced at runtime by strategic updates.
//! Active parameters live behind a read/write lock: one writer applies
//! updates, every block reads them.
//!
//! Emergency mode is entered after two consecutive blocks above the emergency
//! threshold and left after three consecutive blocks under 80 % of target.
//! Blocks between the two thresholds leave both counters untouched.

use {
    super::{
        link::{SendOutcome, UpdateLink},
        types::{SequencerParamUpdate, SequencerParams},
    },
    crate::{
        adjuster::FeeAdjuster,
        calculator,
        clock::Clock,
        config::TacticalConfig,
        pid::PidState,
        state::{Block, BlockLog, FeeState},
    },
    log::*,
    parking_lot::RwLock,
    serde::Serialize,
    std::{sync::Arc, time::Instant},
};

/// Consecutive blocks above the emergency threshold needed to enter emergency.
pub const EMERGENCY_ENTRY_BLOCKS: u32 = 2;
/// Consecutive low blocks needed to leave emergency.
pub const EMERGENCY_EXIT_BLOCKS: u32 = 3;
/// Utilization below which a block counts as low.
pub const LOW_UTILIZATION: f64 = 0.8;
/// Utilization above which gains are boosted.
pub const HIGH_UTILIZATION: f64 = 1.2;
/// Gain multiplier applied to low blocks.
pub const LOW_UTILIZATION_DAMPING: f64 = 0.8;

/// Shared handle to the tactical layer's active parameters.
///
/// Cloning is cheap; every clone reads and writes the same set. Intended for
/// a writer on another thread modelling a remote strategic process.
#[derive(Debug, Clone)]
pub struct ParameterHandle {
    params: Arc<RwLock<SequencerParams>>,
}

impl ParameterHandle {
    fn new(params: SequencerParams) -> Self {
        Self {
            params: Arc::new(RwLock::new(params)),
        }
    }

    pub fn snapshot(&self) -> SequencerParams {
        *self.params.read()
    }

    /// Overwrite the active set with `update`, returning the previous set.
    pub fn apply(&self, update: &SequencerParamUpdate) -> SequencerParams {
        std::mem::replace(&mut *self.params.write(), update.params())
    }

    fn restore(&self, params: SequencerParams) {
        *self.params.write() = params;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TacticalDiagnostics {
    pub current_kp: f64,
    pub current_ki: f64,
    pub current_kd: f64,
    pub current_target_util: f64,
    pub current_max_fee_change: f64,
    pub throttling_active: bool,
    pub throttling_intensity: f64,
    pub emergency_mode: bool,
    pub responsiveness_boost: f64,
    pub integral_term: f64,
    pub last_error: f64,
    pub utilization_tolerance: f64,
    /// Whether the last block landed within the tolerance band of the target.
    pub within_tolerance: bool,
    pub consecutive_high_util: u32,
    pub consecutive_low_util: u32,
    pub parameter_updates_applied: u64,
    /// Milliseconds since the last applied update, if any.
    pub since_last_parameter_update_ms: Option<u64>,
    pub pending_updates: usize,
}

#[derive(Debug)]
pub struct TacticalLayer {
    config: TacticalConfig,
    clock: Arc<dyn Clock>,
    blocks: BlockLog,
    base_fee: u64,
    pid: PidState,
    params: ParameterHandle,
    inbound: UpdateLink,
    emergency_mode: bool,
    consecutive_high_util: u32,
    consecutive_low_util: u32,
    responsiveness_boost: f64,
    last_parameter_update: Option<Instant>,
    updates_applied: u64,
}

impl TacticalLayer {
    pub fn new(config: TacticalConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            base_fee: config.initial_base_fee,
            blocks: BlockLog::new(),
            pid: PidState::new(),
            params: ParameterHandle::new(initial_params(&config)),
            inbound: UpdateLink::new(),
            emergency_mode: false,
            consecutive_high_util: 0,
            consecutive_low_util: 0,
            responsiveness_boost: 1.0,
            last_parameter_update: None,
            updates_applied: 0,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &TacticalConfig {
        &self.config
    }

    pub fn parameter_handle(&self) -> ParameterHandle {
        self.params.clone()
    }

    /// Sending end of the inbound link; updates are applied one per block.
    pub fn parameter_sender(&self) -> UpdateLink {
        self.inbound.clone()
    }

    pub fn send_parameter_update(&self, update: SequencerParamUpdate) -> SendOutcome {
        self.inbound.send(update)
    }

    pub fn emergency_mode(&self) -> bool {
        self.emergency_mode
    }

    pub fn responsiveness_boost(&self) -> f64 {
        self.responsiveness_boost
    }

    pub fn parameter_updates_applied(&self) -> u64 {
        self.updates_applied
    }

    fn check_parameter_updates(&mut self) {
        if let Some(update) = self.inbound.try_recv() {
            self.apply_parameter_update(&update);
        }
    }

    fn apply_parameter_update(&mut self, update: &SequencerParamUpdate) {
        self.params.apply(update);
        self.last_parameter_update = Some(self.clock.now());
        self.updates_applied += 1;
        info!(
            "tactical: applied parameter update kp={:.3} ki={:.3} kd={:.3} target_util={:.3} reason={}",
            update.kp, update.ki, update.kd, update.target_utilization, update.reason
        );
    }

    fn update_emergency_mode(&mut self, utilization: f64, block_number: u64) {
        if utilization > self.config.emergency_threshold {
            self.consecutive_high_util += 1;
            self.consecutive_low_util = 0;
            if self.consecutive_high_util >= EMERGENCY_ENTRY_BLOCKS && !self.emergency_mode {
                self.emergency_mode = true;
                info!(
                    "tactical: block {} entering emergency mode (utilization {:.2}%)",
                    block_number,
                    utilization * 100.0
                );
            }
        } else if utilization < LOW_UTILIZATION {
            self.consecutive_low_util += 1;
            self.consecutive_high_util = 0;
            if self.consecutive_low_util >= EMERGENCY_EXIT_BLOCKS && self.emergency_mode {
                self.emergency_mode = false;
                info!(
                    "tactical: block {} exiting emergency mode (utilization {:.2}%)",
                    block_number,
                    utilization * 100.0
                );
            }
        } else {
            // mode changes only on unbroken runs
            self.consecutive_high_util = 0;
            self.consecutive_low_util = 0;
        }
    }

    fn update_responsiveness(&mut self, utilization: f64) {
        self.responsiveness_boost = if utilization > HIGH_UTILIZATION {
            self.config.responsiveness_boost
        } else if utilization < LOW_UTILIZATION {
            LOW_UTILIZATION_DAMPING
        } else {
            1.0
        };
    }

    fn control_output(&self, error: f64, params: &SequencerParams) -> f64 {
        let boost = self.responsiveness_boost;
        let mut output = params.kp * boost * error
            + params.ki * boost * self.pid.integral()
            + params.kd * boost * self.pid.simple_derivative();

        let mut max_change = params.max_fee_change;
        if self.emergency_mode {
            max_change = max_change.max(self.config.emergency_max_change);
        }
        if params.throttling_active {
            max_change *= 1.0 - params.throttling_intensity * 0.5;
            if output < 0.0 {
                output *= 1.0 - params.throttling_intensity * 0.3;
            }
        }
        calculator::clamp_f64(output, -max_change, max_change)
    }

    fn effective_learning_rate(&self) -> f64 {
        let params = self.params.snapshot();
        let mut rate = (params.kp + params.ki + params.kd) / 3.0;
        if self.emergency_mode {
            rate *= 1.5;
        }
        rate * self.responsiveness_boost
    }

    pub fn diagnostics(&self) -> TacticalDiagnostics {
        let params = self.params.snapshot();
        TacticalDiagnostics {
            current_kp: params.kp,
            current_ki: params.ki,
            current_kd: params.kd,
            current_target_util: params.target_utilization,
            current_max_fee_change: params.max_fee_change,
            throttling_active: params.throttling_active,
            throttling_intensity: params.throttling_intensity,
            emergency_mode: self.emergency_mode,
            responsiveness_boost: self.responsiveness_boost,
            integral_term: self.pid.integral(),
            last_error: self.pid.last_error(),
            utilization_tolerance: self.config.utilization_tolerance,
            within_tolerance: self.pid.last_error().abs() <= self.config.utilization_tolerance,
            consecutive_high_util: self.consecutive_high_util,
            consecutive_low_util: self.consecutive_low_util,
            parameter_updates_applied: self.updates_applied,
            since_last_parameter_update_ms: self
                .last_parameter_update
                .map(|at| self.clock.since(at).as_millis() as u64),
            pending_updates: self.inbound.len(),
        }
    }
}

fn initial_params(config: &TacticalConfig) -> SequencerParams {
    SequencerParams {
        kp: config.kp,
        ki: config.ki,
        kd: config.kd,
        target_utilization: config.initial_target_utilization,
        max_fee_change: config.max_fee_change,
        throttling_active: false,
        throttling_intensity: 0.0,
    }
}

impl FeeAdjuster for TacticalLayer {
    fn process_block(&mut self, gas_used: u64) {
        self.check_parameter_updates();

        let block = self.blocks.record(gas_used, self.base_fee);
        let params = self.params.snapshot();
        let utilization = calculator::block_utilization(gas_used, self.config.target_block_size);
        let error = utilization - params.target_utilization;

        self.update_emergency_mode(utilization, block.number);
        self.update_responsiveness(utilization);
        self.pid.update(
            error,
            self.config.min_integral,
            self.config.max_integral,
            self.config.window_size,
        );

        let output = self.control_output(error, &params);
        self.base_fee = calculator::scale_fee(self.base_fee, output, self.config.min_base_fee);
        debug!(
            "tactical: block {} gas={} error={:.4} boost={:.2} output={:.4} fee {} -> {}",
            block.number,
            gas_used,
            error,
            self.responsiveness_boost,
            output,
            block.base_fee,
            self.base_fee
        );
    }

    fn current_state(&self) -> FeeState {
        let window = self.config.window_size;
        FeeState {
            base_fee: self.base_fee,
            learning_rate: self.effective_learning_rate(),
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
        self.params.restore(initial_params(&self.config));
        self.inbound.drain();
        self.emergency_mode = false;
        self.consecutive_high_util = 0;
        self.consecutive_low_util = 0;
        self.responsiveness_boost = 1.0;
        self.last_parameter_update = None;
        self.updates_applied = 0;
    }
}
