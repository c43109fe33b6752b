//! Construction of adjusters by algorithm type.

use {
    crate::{
        adjuster::FeeAdjuster,
        aimd::AimdAdjuster,
        clock::{Clock, SystemClock},
        config::{
            AimdConfig, Eip1559Config, HierarchicalConfig, MarketConfig, PidConfig,
            StrategicConfig, TacticalConfig,
        },
        eip1559::Eip1559Adjuster,
        error::FeeMarketError,
        hierarchical::{HierarchicalAdjuster, StrategicLayer, TacticalLayer},
        pid::PidAdjuster,
        state::{Block, FeeState},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    std::{fmt, str::FromStr, sync::Arc},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum AdjusterType {
    Aimd,
    Eip1559,
    Pid,
    /// Strategic layer on its own.
    BatcherSlowPid,
    /// Tactical layer on its own.
    SequencerFastPid,
    HierarchicalPid,
}

impl AdjusterType {
    pub const ALL: [AdjusterType; 6] = [
        AdjusterType::Aimd,
        AdjusterType::Eip1559,
        AdjusterType::Pid,
        AdjusterType::BatcherSlowPid,
        AdjusterType::SequencerFastPid,
        AdjusterType::HierarchicalPid,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aimd => "aimd",
            Self::Eip1559 => "eip1559",
            Self::Pid => "pid",
            Self::BatcherSlowPid => "batcher-slow-pid",
            Self::SequencerFastPid => "sequencer-fast-pid",
            Self::HierarchicalPid => "hierarchical-pid",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Self::Aimd => "Additive increase / multiplicative decrease with a windowed learning rate",
            Self::Eip1559 => "Standard EIP-1559 with a fixed 1/8 maximum change per block",
            Self::Pid => "PID controller with integral windup protection",
            Self::BatcherSlowPid => "Strategic batcher layer driven by simulated DA cost",
            Self::SequencerFastPid => "Tactical sequencer layer with emergency and throttling modes",
            Self::HierarchicalPid => "Strategic and tactical layers coordinated over a lossy link",
        }
    }
}

impl fmt::Display for AdjusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdjusterType {
    type Err = FeeMarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aimd" => Ok(Self::Aimd),
            "eip1559" | "eip-1559" => Ok(Self::Eip1559),
            "pid" => Ok(Self::Pid),
            "batcher-slow-pid" | "batcher_slow_pid" => Ok(Self::BatcherSlowPid),
            "sequencer-fast-pid" | "sequencer_fast_pid" => Ok(Self::SequencerFastPid),
            "hierarchical-pid" | "hierarchical_pid" => Ok(Self::HierarchicalPid),
            _ => Err(FeeMarketError::UnknownAdjusterType(s.to_string())),
        }
    }
}

/// A complete per-variant configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AdjusterConfig {
    Aimd(AimdConfig),
    Eip1559(Eip1559Config),
    Pid(PidConfig),
    BatcherSlowPid(StrategicConfig),
    SequencerFastPid(TacticalConfig),
    HierarchicalPid(HierarchicalConfig),
}

impl AdjusterConfig {
    /// Per-variant defaults.
    pub fn default_for(kind: AdjusterType) -> Self {
        match kind {
            AdjusterType::Aimd => Self::Aimd(AimdConfig::default()),
            AdjusterType::Eip1559 => Self::Eip1559(Eip1559Config::default()),
            AdjusterType::Pid => Self::Pid(PidConfig::default()),
            AdjusterType::BatcherSlowPid => Self::BatcherSlowPid(StrategicConfig::default()),
            AdjusterType::SequencerFastPid => Self::SequencerFastPid(TacticalConfig::default()),
            AdjusterType::HierarchicalPid => Self::HierarchicalPid(HierarchicalConfig::default()),
        }
    }

    /// Per-variant defaults with the shared market fields applied.
    pub fn from_market(kind: AdjusterType, market: &MarketConfig) -> Self {
        match Self::default_for(kind) {
            Self::Aimd(c) => Self::Aimd(c.with_market(market)),
            Self::Eip1559(c) => Self::Eip1559(c.with_market(market)),
            Self::Pid(c) => Self::Pid(c.with_market(market)),
            Self::BatcherSlowPid(c) => Self::BatcherSlowPid(c.with_market(market)),
            Self::SequencerFastPid(c) => Self::SequencerFastPid(c.with_market(market)),
            Self::HierarchicalPid(c) => Self::HierarchicalPid(c.with_market(market)),
        }
    }

    pub fn kind(&self) -> AdjusterType {
        match self {
            Self::Aimd(_) => AdjusterType::Aimd,
            Self::Eip1559(_) => AdjusterType::Eip1559,
            Self::Pid(_) => AdjusterType::Pid,
            Self::BatcherSlowPid(_) => AdjusterType::BatcherSlowPid,
            Self::SequencerFastPid(_) => AdjusterType::SequencerFastPid,
            Self::HierarchicalPid(_) => AdjusterType::HierarchicalPid,
        }
    }

    pub fn validate(&self) -> Result<(), FeeMarketError> {
        match self {
            Self::Aimd(c) => c.validate(),
            Self::Eip1559(c) => c.validate(),
            Self::Pid(c) => c.validate(),
            Self::BatcherSlowPid(c) => c.validate(),
            Self::SequencerFastPid(c) => c.validate(),
            Self::HierarchicalPid(c) => c.validate(),
        }
    }
}

/// Every concrete algorithm behind one type.
#[derive(Debug)]
pub enum Adjuster {
    Aimd(AimdAdjuster),
    Eip1559(Eip1559Adjuster),
    Pid(PidAdjuster),
    Strategic(StrategicLayer),
    Tactical(TacticalLayer),
    Hierarchical(HierarchicalAdjuster),
}

impl Adjuster {
    pub fn kind(&self) -> AdjusterType {
        match self {
            Self::Aimd(_) => AdjusterType::Aimd,
            Self::Eip1559(_) => AdjusterType::Eip1559,
            Self::Pid(_) => AdjusterType::Pid,
            Self::Strategic(_) => AdjusterType::BatcherSlowPid,
            Self::Tactical(_) => AdjusterType::SequencerFastPid,
            Self::Hierarchical(_) => AdjusterType::HierarchicalPid,
        }
    }

    fn inner(&self) -> &dyn FeeAdjuster {
        match self {
            Self::Aimd(a) => a,
            Self::Eip1559(a) => a,
            Self::Pid(a) => a,
            Self::Strategic(a) => a,
            Self::Tactical(a) => a,
            Self::Hierarchical(a) => a,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn FeeAdjuster {
        match self {
            Self::Aimd(a) => a,
            Self::Eip1559(a) => a,
            Self::Pid(a) => a,
            Self::Strategic(a) => a,
            Self::Tactical(a) => a,
            Self::Hierarchical(a) => a,
        }
    }
}

impl FeeAdjuster for Adjuster {
    fn process_block(&mut self, gas_used: u64) {
        self.inner_mut().process_block(gas_used)
    }

    fn current_state(&self) -> FeeState {
        self.inner().current_state()
    }

    fn max_block_size(&self) -> u64 {
        self.inner().max_block_size()
    }

    fn blocks(&self) -> Vec<Block> {
        self.inner().blocks()
    }

    fn reset(&mut self) {
        self.inner_mut().reset()
    }
}

/// Builds validated adjusters. Layers with wall-clock cadences share the
/// factory's clock.
#[derive(Debug, Clone)]
pub struct AdjusterFactory {
    clock: Arc<dyn Clock>,
}

impl Default for AdjusterFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AdjusterFactory {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Build `kind` from its defaults with the shared `market` fields applied.
    pub fn create(
        &self,
        kind: AdjusterType,
        market: &MarketConfig,
    ) -> Result<Adjuster, FeeMarketError> {
        market.validate()?;
        self.create_from_config(AdjusterConfig::from_market(kind, market))
    }

    pub fn create_from_config(&self, config: AdjusterConfig) -> Result<Adjuster, FeeMarketError> {
        config.validate()?;
        let clock = self.clock.clone();
        Ok(match config {
            AdjusterConfig::Aimd(c) => Adjuster::Aimd(AimdAdjuster::new(c)),
            AdjusterConfig::Eip1559(c) => Adjuster::Eip1559(Eip1559Adjuster::new(c)),
            AdjusterConfig::Pid(c) => Adjuster::Pid(PidAdjuster::new(c)),
            AdjusterConfig::BatcherSlowPid(c) => Adjuster::Strategic(StrategicLayer::new(c, clock)),
            AdjusterConfig::SequencerFastPid(c) => {
                Adjuster::Tactical(TacticalLayer::new(c, clock))
            }
            AdjusterConfig::HierarchicalPid(c) => {
                Adjuster::Hierarchical(HierarchicalAdjuster::new(c, clock))
            }
        })
    }
}
