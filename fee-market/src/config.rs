//! Adjuster configuration.
//!
//! Each algorithm gets its own config struct so it only ever sees its own
//! knobs. [`MarketConfig`] is the shared record that callers hand to the
//! factory; its fields override the corresponding fields of a variant's
//! defaults. All timing values are in milliseconds.
//!
//! Configurations are immutable once an adjuster has been built from them.

use {
    crate::{calculator, error::FeeMarketError},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Default nominal block target in gas units.
pub const DEFAULT_TARGET_BLOCK_SIZE: u64 = 15_000_000;
/// Default burst multiplier (max block = 2 × target).
pub const DEFAULT_BURST_MULTIPLIER: f64 = 2.0;
/// Default initial base fee (1 gwei).
pub const DEFAULT_INITIAL_BASE_FEE: u64 = 1_000_000_000;

/// Settings shared by every adjuster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct MarketConfig {
    /// Nominal (non-burst) block size in gas units.
    pub target_block_size: u64,

    /// Maximum block size as a multiple of the target. Must be > 1.
    pub burst_multiplier: f64,

    /// Base fee before the first block, in wei.
    pub initial_base_fee: u64,

    /// Floor for the base fee, in wei.
    pub min_base_fee: u64,

    /// Number of blocks in the utilization window (AIMD and PID).
    pub window_size: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            target_block_size: DEFAULT_TARGET_BLOCK_SIZE,
            burst_multiplier: DEFAULT_BURST_MULTIPLIER,
            initial_base_fee: DEFAULT_INITIAL_BASE_FEE,
            min_base_fee: 0,
            window_size: 10,
        }
    }
}

impl MarketConfig {
    #[inline]
    pub fn max_block_size(&self) -> u64 {
        calculator::max_block_size(self.target_block_size, self.burst_multiplier)
    }

    pub fn validate(&self) -> Result<(), FeeMarketError> {
        validate_core(self.target_block_size, self.burst_multiplier)?;
        ensure(self.window_size > 0, || {
            format!("window_size ({}) must be positive", self.window_size)
        })
    }
}

/// Additive-increase / multiplicative-decrease adjuster settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AimdConfig {
    pub target_block_size: u64,
    pub burst_multiplier: f64,
    pub initial_base_fee: u64,
    pub min_base_fee: u64,

    /// Blocks that must accumulate before any adjustment (warm-up) and over
    /// which utilization is averaged.
    pub window_size: usize,

    /// Utilization deviation from 1.0 above which the learning rate grows.
    pub gamma: f64,

    pub initial_learning_rate: f64,
    pub max_learning_rate: f64,
    pub min_learning_rate: f64,

    /// Additive increase step.
    pub alpha: f64,

    /// Multiplicative decrease factor.
    pub beta: f64,

    /// Coefficient applied to the window's net gas delta (wei per gas unit).
    pub delta: f64,
}

impl Default for AimdConfig {
    fn default() -> Self {
        Self {
            target_block_size: DEFAULT_TARGET_BLOCK_SIZE,
            burst_multiplier: DEFAULT_BURST_MULTIPLIER,
            initial_base_fee: DEFAULT_INITIAL_BASE_FEE,
            min_base_fee: 0,
            window_size: 10,
            gamma: 0.25,
            initial_learning_rate: 0.1,
            max_learning_rate: 0.5,
            min_learning_rate: 0.001,
            alpha: 0.01,
            beta: 0.9,
            delta: 0.0,
        }
    }
}

impl AimdConfig {
    pub fn validate(&self) -> Result<(), FeeMarketError> {
        validate_core(self.target_block_size, self.burst_multiplier)?;
        ensure(self.window_size > 0, || {
            format!("window_size ({}) must be positive", self.window_size)
        })?;
        ensure((0.0..=2.0).contains(&self.gamma), || {
            format!("gamma ({:.3}) must be between 0 and 2.0", self.gamma)
        })?;
        ensure(self.max_learning_rate >= self.min_learning_rate, || {
            format!(
                "max learning rate ({:.6}) must be >= min learning rate ({:.6})",
                self.max_learning_rate, self.min_learning_rate
            )
        })?;
        ensure(
            (self.min_learning_rate..=self.max_learning_rate).contains(&self.initial_learning_rate),
            || {
                format!(
                    "initial learning rate ({:.6}) must be between {:.6} and {:.6}",
                    self.initial_learning_rate, self.min_learning_rate, self.max_learning_rate
                )
            },
        )?;
        ensure(self.alpha >= 0.0, || {
            format!("alpha ({:.6}) must not be negative", self.alpha)
        })?;
        ensure((0.0..=1.0).contains(&self.beta), || {
            format!("beta ({:.6}) must be between 0 and 1", self.beta)
        })
    }

    pub(crate) fn with_market(mut self, market: &MarketConfig) -> Self {
        self.target_block_size = market.target_block_size;
        self.burst_multiplier = market.burst_multiplier;
        self.initial_base_fee = market.initial_base_fee;
        self.min_base_fee = market.min_base_fee;
        self.window_size = market.window_size;
        self
    }
}

/// Textbook EIP-1559 adjuster settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Eip1559Config {
    pub target_block_size: u64,
    pub burst_multiplier: f64,
    pub initial_base_fee: u64,
    pub min_base_fee: u64,

    /// Maximum fractional change per block. The update rule always uses a
    /// 1/8 step; this value is only reported as the learning rate.
    pub max_fee_change: f64,
}

impl Default for Eip1559Config {
    fn default() -> Self {
        Self {
            target_block_size: DEFAULT_TARGET_BLOCK_SIZE,
            burst_multiplier: DEFAULT_BURST_MULTIPLIER,
            initial_base_fee: DEFAULT_INITIAL_BASE_FEE,
            min_base_fee: 0,
            max_fee_change: 0.125,
        }
    }
}

impl Eip1559Config {
    pub fn validate(&self) -> Result<(), FeeMarketError> {
        validate_core(self.target_block_size, self.burst_multiplier)?;
        validate_fraction("EIP-1559 max fee change", self.max_fee_change)
    }

    pub(crate) fn with_market(mut self, market: &MarketConfig) -> Self {
        self.target_block_size = market.target_block_size;
        self.burst_multiplier = market.burst_multiplier;
        self.initial_base_fee = market.initial_base_fee;
        self.min_base_fee = market.min_base_fee;
        self
    }
}

/// Single-loop PID adjuster settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PidConfig {
    pub target_block_size: u64,
    pub burst_multiplier: f64,
    pub initial_base_fee: u64,
    pub min_base_fee: u64,

    pub kp: f64,
    pub ki: f64,
    pub kd: f64,

    /// Anti-windup bounds for the integral accumulator.
    pub max_integral: f64,
    pub min_integral: f64,

    /// Bound on the absolute control output (fractional fee change per block).
    pub max_fee_change: f64,

    /// Error samples used for the regression derivative.
    pub window_size: usize,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            target_block_size: DEFAULT_TARGET_BLOCK_SIZE,
            burst_multiplier: DEFAULT_BURST_MULTIPLIER,
            initial_base_fee: DEFAULT_INITIAL_BASE_FEE,
            min_base_fee: 0,
            kp: 0.1,
            ki: 0.01,
            kd: 0.05,
            max_integral: 1000.0,
            min_integral: -1000.0,
            max_fee_change: 0.25,
            window_size: 3,
        }
    }
}

impl PidConfig {
    pub fn validate(&self) -> Result<(), FeeMarketError> {
        validate_core(self.target_block_size, self.burst_multiplier)?;
        validate_gains("PID", self.kp, self.ki, self.kd)?;
        validate_integral("PID", self.min_integral, self.max_integral)?;
        validate_fraction("PID max fee change", self.max_fee_change)?;
        ensure(self.window_size > 0, || {
            format!("PID window size ({}) must be positive", self.window_size)
        })
    }

    pub(crate) fn with_market(mut self, market: &MarketConfig) -> Self {
        self.target_block_size = market.target_block_size;
        self.burst_multiplier = market.burst_multiplier;
        self.initial_base_fee = market.initial_base_fee;
        self.min_base_fee = market.min_base_fee;
        self.window_size = market.window_size;
        self
    }
}

/// Inclusive `[min, max]` range for a tunable pushed to the tactical layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        calculator::clamp_f64(value, self.min, self.max)
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Strategic (batcher) layer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StrategicConfig {
    pub target_block_size: u64,
    pub burst_multiplier: f64,
    pub initial_base_fee: u64,
    pub min_base_fee: u64,

    /// Number of DA observations retained (and error samples kept).
    pub da_window_size: usize,

    /// Wall-clock interval between strategic parameter updates.
    pub update_frequency_ms: u64,

    /// Strategic PID gains acting on DA-utilization error.
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,

    /// DA utilization the batcher aims for.
    pub target_da_utilization: f64,

    /// DA utilization above which emergency throttling kicks in.
    pub max_da_utilization: f64,

    /// Absolute ranges for gains sent to the tactical layer.
    pub sequencer_kp_range: ParamRange,
    pub sequencer_ki_range: ParamRange,
    pub sequencer_kd_range: ParamRange,

    /// Max fractional change of each gain between consecutive updates.
    pub max_parameter_change: f64,

    pub max_integral: f64,
    pub min_integral: f64,
}

impl Default for StrategicConfig {
    fn default() -> Self {
        Self {
            target_block_size: DEFAULT_TARGET_BLOCK_SIZE,
            burst_multiplier: DEFAULT_BURST_MULTIPLIER,
            initial_base_fee: DEFAULT_INITIAL_BASE_FEE,
            min_base_fee: 0,
            da_window_size: 10,
            update_frequency_ms: 30_000,
            kp: 2.0,
            ki: 0.306,
            kd: 0.3,
            target_da_utilization: 0.75,
            max_da_utilization: 0.90,
            sequencer_kp_range: ParamRange::new(0.1, 2.0),
            sequencer_ki_range: ParamRange::new(0.01, 0.5),
            sequencer_kd_range: ParamRange::new(0.005, 0.2),
            max_parameter_change: 0.2,
            max_integral: 10.0,
            min_integral: -10.0,
        }
    }
}

impl StrategicConfig {
    pub fn validate(&self) -> Result<(), FeeMarketError> {
        validate_core(self.target_block_size, self.burst_multiplier)?;
        ensure(self.da_window_size > 0, || {
            format!("DA window size ({}) must be positive", self.da_window_size)
        })?;
        validate_gains("strategic", self.kp, self.ki, self.kd)?;
        validate_integral("strategic", self.min_integral, self.max_integral)?;
        ensure(
            self.target_da_utilization > 0.0
                && self.target_da_utilization < self.max_da_utilization,
            || {
                format!(
                    "target DA utilization ({:.3}) must be in (0, max DA utilization {:.3})",
                    self.target_da_utilization, self.max_da_utilization
                )
            },
        )?;
        for (name, range) in [
            ("sequencer Kp", self.sequencer_kp_range),
            ("sequencer Ki", self.sequencer_ki_range),
            ("sequencer Kd", self.sequencer_kd_range),
        ] {
            ensure(range.min >= 0.0 && range.min <= range.max, || {
                format!(
                    "{name} range [{:.3}, {:.3}] must satisfy 0 <= min <= max",
                    range.min, range.max
                )
            })?;
        }
        ensure(self.max_parameter_change >= 0.0, || {
            format!(
                "max parameter change ({:.3}) must not be negative",
                self.max_parameter_change
            )
        })
    }
}

/// Tactical (sequencer) layer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TacticalConfig {
    pub target_block_size: u64,
    pub burst_multiplier: f64,
    pub initial_base_fee: u64,
    pub min_base_fee: u64,

    /// Initial gains; replaced at runtime by strategic updates.
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,

    pub max_integral: f64,
    pub min_integral: f64,

    /// Initial bound on the control output; replaced at runtime.
    pub max_fee_change: f64,

    /// Error samples retained; also the utilization reporting window.
    pub window_size: usize,

    /// Gain multiplier applied while a block is above 120% of target.
    pub responsiveness_boost: f64,

    /// Single-block utilization that counts towards emergency mode.
    pub emergency_threshold: f64,

    /// Output bound used while in emergency mode (if larger).
    pub emergency_max_change: f64,

    /// Initial target utilization; replaced at runtime.
    pub initial_target_utilization: f64,

    /// Band around the target utilization within which the last block is
    /// reported as on target in the diagnostics.
    pub utilization_tolerance: f64,
}

impl Default for TacticalConfig {
    fn default() -> Self {
        Self {
            target_block_size: DEFAULT_TARGET_BLOCK_SIZE,
            burst_multiplier: DEFAULT_BURST_MULTIPLIER,
            initial_base_fee: DEFAULT_INITIAL_BASE_FEE,
            min_base_fee: 0,
            kp: 0.8,
            ki: 0.15,
            kd: 0.25,
            max_integral: 5.0,
            min_integral: -5.0,
            max_fee_change: 0.25,
            window_size: 3,
            responsiveness_boost: 1.5,
            emergency_threshold: 1.5,
            emergency_max_change: 0.5,
            initial_target_utilization: 1.0,
            utilization_tolerance: 0.05,
        }
    }
}

impl TacticalConfig {
    pub fn validate(&self) -> Result<(), FeeMarketError> {
        validate_core(self.target_block_size, self.burst_multiplier)?;
        validate_gains("tactical", self.kp, self.ki, self.kd)?;
        validate_integral("tactical", self.min_integral, self.max_integral)?;
        validate_fraction("tactical max fee change", self.max_fee_change)?;
        validate_fraction("emergency max change", self.emergency_max_change)?;
        ensure(self.window_size > 0, || {
            format!("tactical window size ({}) must be positive", self.window_size)
        })?;
        ensure(self.responsiveness_boost > 0.0, || {
            format!(
                "responsiveness boost ({:.3}) must be positive",
                self.responsiveness_boost
            )
        })?;
        ensure(self.emergency_threshold > 0.0, || {
            format!(
                "emergency threshold ({:.3}) must be positive",
                self.emergency_threshold
            )
        })?;
        ensure(self.initial_target_utilization > 0.0, || {
            format!(
                "initial target utilization ({:.3}) must be positive",
                self.initial_target_utilization
            )
        })?;
        ensure(self.utilization_tolerance >= 0.0, || {
            format!(
                "utilization tolerance ({:.3}) must not be negative",
                self.utilization_tolerance
            )
        })
    }
}

/// Two-layer controller settings.
///
/// The shared fields are copied into both layer configs at construction,
/// overriding whatever the layer configs carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct HierarchicalConfig {
    pub target_block_size: u64,
    pub burst_multiplier: f64,
    pub initial_base_fee: u64,
    pub min_base_fee: u64,

    pub strategic: StrategicConfig,
    pub tactical: TacticalConfig,

    /// Forward strategic updates to the tactical layer at all.
    pub enable_coordination: bool,

    /// Wall-clock interval between coordination passes.
    pub update_interval_ms: u64,
}

impl Default for HierarchicalConfig {
    fn default() -> Self {
        Self {
            target_block_size: DEFAULT_TARGET_BLOCK_SIZE,
            burst_multiplier: DEFAULT_BURST_MULTIPLIER,
            initial_base_fee: DEFAULT_INITIAL_BASE_FEE,
            min_base_fee: 0,
            strategic: StrategicConfig::default(),
            tactical: TacticalConfig::default(),
            enable_coordination: true,
            update_interval_ms: 30_000,
        }
    }
}

impl HierarchicalConfig {
    /// Layer configs with the shared fields applied.
    pub fn layer_configs(&self) -> (StrategicConfig, TacticalConfig) {
        let mut strategic = self.strategic.clone();
        strategic.target_block_size = self.target_block_size;
        strategic.burst_multiplier = self.burst_multiplier;
        strategic.initial_base_fee = self.initial_base_fee;
        strategic.min_base_fee = self.min_base_fee;

        let mut tactical = self.tactical.clone();
        tactical.target_block_size = self.target_block_size;
        tactical.burst_multiplier = self.burst_multiplier;
        tactical.initial_base_fee = self.initial_base_fee;
        tactical.min_base_fee = self.min_base_fee;

        (strategic, tactical)
    }

    pub fn validate(&self) -> Result<(), FeeMarketError> {
        let (strategic, tactical) = self.layer_configs();
        strategic.validate()?;
        tactical.validate()
    }
}

macro_rules! impl_with_market_for_layers {
    ($($ty:ty),*) => {$(
        impl $ty {
            pub(crate) fn with_market(mut self, market: &MarketConfig) -> Self {
                self.target_block_size = market.target_block_size;
                self.burst_multiplier = market.burst_multiplier;
                self.initial_base_fee = market.initial_base_fee;
                self.min_base_fee = market.min_base_fee;
                self
            }
        }
    )*};
}

impl_with_market_for_layers!(StrategicConfig, TacticalConfig, HierarchicalConfig);

fn ensure(condition: bool, reason: impl FnOnce() -> String) -> Result<(), FeeMarketError> {
    if condition {
        Ok(())
    } else {
        Err(FeeMarketError::invalid(reason()))
    }
}

fn validate_core(target_block_size: u64, burst_multiplier: f64) -> Result<(), FeeMarketError> {
    ensure(target_block_size > 0, || {
        "target_block_size must be > 0".to_string()
    })?;
    ensure(burst_multiplier > 1.0, || {
        format!("burst multiplier ({burst_multiplier:.3}) must be greater than 1.0")
    })
}

fn validate_fraction(name: &str, value: f64) -> Result<(), FeeMarketError> {
    ensure(value > 0.0 && value <= 1.0, || {
        format!("{name} ({value:.3}) must be between 0 and 1.0")
    })
}

fn validate_gains(layer: &str, kp: f64, ki: f64, kd: f64) -> Result<(), FeeMarketError> {
    for (name, gain) in [("Kp", kp), ("Ki", ki), ("Kd", kd)] {
        ensure(gain >= 0.0, || {
            format!("{layer} {name} ({gain:.6}) must not be negative")
        })?;
    }
    Ok(())
}

fn validate_integral(layer: &str, min: f64, max: f64) -> Result<(), FeeMarketError> {
    ensure(max > min, || {
        format!("{layer} max integral ({max:.3}) must be greater than min integral ({min:.3})")
    })
}
