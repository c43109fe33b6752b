//! Two-layer fee control.
//!
//! A [`StrategicLayer`] watches simulated DA cost and periodically proposes
//! tactical parameters; a [`TacticalLayer`] sets the fee every block using the
//! latest parameters it has received. [`HierarchicalAdjuster`] wires the two
//! together, forwarding at most one pending update per coordination interval,
//! and reports the tactical layer's state as its own.

pub mod link;
pub mod strategic;
pub mod tactical;
pub mod types;

pub use {
    link::{SendOutcome, UpdateLink, UPDATE_LINK_CAPACITY},
    strategic::{StrategicDiagnostics, StrategicLayer},
    tactical::{ParameterHandle, TacticalDiagnostics, TacticalLayer},
    types::{DaMetrics, SequencerParamUpdate, SequencerParams},
};

use {
    crate::{
        adjuster::FeeAdjuster,
        clock::Clock,
        config::HierarchicalConfig,
        state::{Block, FeeState},
    },
    log::*,
    serde::Serialize,
    std::{
        sync::Arc,
        time::{Duration, Instant},
    },
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchicalDiagnostics {
    pub strategic: StrategicDiagnostics,
    pub tactical: TacticalDiagnostics,
    pub coordination_enabled: bool,
    pub update_interval_ms: u64,
    pub updates_forwarded: u64,
}

#[derive(Debug)]
pub struct HierarchicalAdjuster {
    config: HierarchicalConfig,
    clock: Arc<dyn Clock>,
    strategic: StrategicLayer,
    tactical: TacticalLayer,
    last_coordination: Instant,
    updates_forwarded: u64,
}

impl HierarchicalAdjuster {
    pub fn new(config: HierarchicalConfig, clock: Arc<dyn Clock>) -> Self {
        let (strategic_config, tactical_config) = config.layer_configs();
        Self {
            strategic: StrategicLayer::new(strategic_config, clock.clone()),
            tactical: TacticalLayer::new(tactical_config, clock.clone()),
            last_coordination: clock.now(),
            updates_forwarded: 0,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &HierarchicalConfig {
        &self.config
    }

    pub fn strategic(&self) -> &StrategicLayer {
        &self.strategic
    }

    pub fn tactical(&self) -> &TacticalLayer {
        &self.tactical
    }

    pub fn updates_forwarded(&self) -> u64 {
        self.updates_forwarded
    }

    fn update_interval(&self) -> Duration {
        Duration::from_millis(self.config.update_interval_ms)
    }

    fn coordinate_layers(&mut self) {
        let Some(update) = self.strategic.updates().try_recv() else {
            return;
        };
        info!("hierarchical: forwarding parameter update: {}", update.reason);
        self.tactical.send_parameter_update(update);
        self.updates_forwarded += 1;
    }

    pub fn diagnostics(&self) -> HierarchicalDiagnostics {
        HierarchicalDiagnostics {
            strategic: self.strategic.diagnostics(),
            tactical: self.tactical.diagnostics(),
            coordination_enabled: self.config.enable_coordination,
            update_interval_ms: self.config.update_interval_ms,
            updates_forwarded: self.updates_forwarded,
        }
    }
}

impl FeeAdjuster for HierarchicalAdjuster {
    fn process_block(&mut self, gas_used: u64) {
        self.strategic.process_block(gas_used);

        if self.config.enable_coordination
            && self.clock.since(self.last_coordination) >= self.update_interval()
        {
            self.coordinate_layers();
            self.last_coordination = self.clock.now();
        }

        self.tactical.process_block(gas_used);
    }

    fn current_state(&self) -> FeeState {
        self.tactical.current_state()
    }

    fn max_block_size(&self) -> u64 {
        self.tactical.max_block_size()
    }

    fn blocks(&self) -> Vec<Block> {
        self.tactical.blocks()
    }

    fn reset(&mut self) {
        self.strategic.reset();
        self.tactical.reset();
        self.last_coordination = self.clock.now();
        self.updates_forwarded = 0;
    }
}
