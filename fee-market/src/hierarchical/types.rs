use {
    serde::{Deserialize, Serialize},
    std::time::Instant,
};

/// Wei per gwei, for diagnostics.
pub const WEI_PER_GWEI: f64 = 1e9;
/// Wei per ether, for diagnostics.
pub const WEI_PER_ETH: f64 = 1e18;

/// One simulated L1 data-availability observation, derived from a block's gas
/// usage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DaMetrics {
    /// Simulated L1 gas price in wei.
    pub l1_gas_price: u64,
    /// Blob gas price in wei.
    pub blob_price: u64,
    /// DA bytes consumed by the block.
    pub da_usage: u64,
    /// DA bytes available per blob.
    pub da_capacity: u64,
    /// Cost of submitting a batch, in wei.
    pub batch_cost: u64,
    /// `da_usage / da_capacity`, capped at 1.0.
    pub batch_efficiency: f64,
}

impl DaMetrics {
    /// Unclamped `da_usage / da_capacity`; zero for zero capacity.
    pub fn utilization(&self) -> f64 {
        if self.da_capacity == 0 {
            return 0.0;
        }
        self.da_usage as f64 / self.da_capacity as f64
    }
}

/// A bundle of tactical-layer parameters pushed by the strategic layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerParamUpdate {
    pub issued_at: Instant,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub target_utilization: f64,
    pub max_fee_change: f64,
    pub throttling_active: bool,
    /// In `[0, 0.5]` when produced by the strategic layer.
    pub throttling_intensity: f64,
    pub reason: String,
}

impl SequencerParamUpdate {
    /// Parameters the strategic layer assumes the tactical layer starts with.
    pub fn initial(issued_at: Instant) -> Self {
        Self {
            issued_at,
            kp: 0.8,
            ki: 0.15,
            kd: 0.05,
            target_utilization: 1.0,
            max_fee_change: 0.25,
            throttling_active: false,
            throttling_intensity: 0.0,
            reason: "Initial configuration".to_string(),
        }
    }

    pub fn params(&self) -> SequencerParams {
        SequencerParams {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
            target_utilization: self.target_utilization,
            max_fee_change: self.max_fee_change,
            throttling_active: self.throttling_active,
            throttling_intensity: self.throttling_intensity,
        }
    }
}

/// The tactical layer's active, externally updatable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequencerParams {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub target_utilization: f64,
    pub max_fee_change: f64,
    pub throttling_active: bool,
    pub throttling_intensity: f64,
}
