//! Summary statistics for a single adjuster run over a scenario.

use {
    fms_fee_market::{FeeAdjuster, FeeState, MarketConfig},
    log::*,
    serde::{Deserialize, Serialize},
};

/// Relative demand change (in units of the target) that counts as a shift.
pub const DEMAND_CHANGE_THRESHOLD: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub scenario_name: String,
    pub total_blocks: usize,
    pub avg_gas_used: f64,
    /// Average gas as a percentage of the burst capacity.
    pub avg_gas_used_percent: f64,
    /// Average burst utilization once the window has filled.
    pub avg_burst_utilization: f64,
    pub initial_base_fee: u64,
    pub final_base_fee: u64,
    pub min_base_fee: u64,
    pub max_base_fee: u64,
    pub base_fee_volatility: f64,
    pub avg_learning_rate: f64,
    pub min_learning_rate: f64,
    pub max_learning_rate: f64,
    pub learning_rate_volatility: f64,
    /// Mean of `|gas - target| / target`.
    pub target_deviation: f64,
    /// Mean `|Δfee / fee|` per unit of demand change, over significant shifts.
    pub responsiveness_score: f64,
}

impl RunSummary {
    pub fn fee_change_ratio(&self) -> f64 {
        ratio(self.final_base_fee, self.initial_base_fee)
    }

    pub fn fee_range_ratio(&self) -> f64 {
        ratio(self.max_base_fee, self.min_base_fee)
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[derive(Debug, Clone)]
pub struct Analyzer {
    target_block_size: u64,
    max_block_size: u64,
    window_size: usize,
}

impl Analyzer {
    pub fn new(market: &MarketConfig) -> Self {
        Self {
            target_block_size: market.target_block_size,
            max_block_size: market.max_block_size(),
            window_size: market.window_size,
        }
    }

    /// Feed `blocks` through `adjuster` and summarize the states it reports.
    ///
    /// The adjuster is used as-is; callers that want a clean run should
    /// [`reset`](FeeAdjuster::reset) it first.
    pub fn run_scenario<A: FeeAdjuster + ?Sized>(
        &self,
        scenario_name: &str,
        adjuster: &mut A,
        blocks: &[u64],
    ) -> RunSummary {
        let initial_base_fee = adjuster.current_state().base_fee;
        let states: Vec<FeeState> = blocks
            .iter()
            .map(|&gas_used| {
                adjuster.process_block(gas_used);
                adjuster.current_state()
            })
            .collect();

        let summary = self.summarize(scenario_name, initial_base_fee, blocks, &states);
        debug!(
            "{scenario_name}: {} blocks, final fee {} ({:.2}x), responsiveness {:.3}",
            summary.total_blocks,
            summary.final_base_fee,
            summary.fee_change_ratio(),
            summary.responsiveness_score
        );
        summary
    }

    fn summarize(
        &self,
        scenario_name: &str,
        initial_base_fee: u64,
        blocks: &[u64],
        states: &[FeeState],
    ) -> RunSummary {
        if states.is_empty() {
            return RunSummary {
                scenario_name: scenario_name.to_string(),
                initial_base_fee,
                final_base_fee: initial_base_fee,
                min_base_fee: initial_base_fee,
                max_base_fee: initial_base_fee,
                ..RunSummary::default()
            };
        }

        let target = self.target_block_size as f64;
        let gas: Vec<f64> = blocks.iter().map(|&g| g as f64).collect();
        let fees: Vec<f64> = states.iter().map(|s| s.base_fee as f64).collect();
        let learning_rates: Vec<f64> = states.iter().map(|s| s.learning_rate).collect();
        let burst_utilizations: Vec<f64> = states.iter().map(|s| s.burst_utilization).collect();
        let deviations: Vec<f64> = gas
            .iter()
            .map(|g| if target > 0.0 { (g - target).abs() / target } else { 0.0 })
            .collect();

        let avg_gas_used = mean(&gas);
        let avg_gas_used_percent = if self.max_block_size > 0 {
            avg_gas_used / self.max_block_size as f64 * 100.0
        } else {
            0.0
        };
        let filled = self.window_size.saturating_sub(1);
        let avg_burst_utilization = if states.len() >= self.window_size && self.window_size > 0 {
            mean(&burst_utilizations[filled..])
        } else {
            mean(&burst_utilizations)
        };

        RunSummary {
            scenario_name: scenario_name.to_string(),
            total_blocks: blocks.len(),
            avg_gas_used,
            avg_gas_used_percent,
            avg_burst_utilization,
            initial_base_fee,
            final_base_fee: states.last().map_or(initial_base_fee, |s| s.base_fee),
            min_base_fee: states.iter().map(|s| s.base_fee).min().unwrap_or(initial_base_fee),
            max_base_fee: states.iter().map(|s| s.base_fee).max().unwrap_or(initial_base_fee),
            base_fee_volatility: sample_std_dev(&fees),
            avg_learning_rate: mean(&learning_rates),
            min_learning_rate: learning_rates.iter().copied().fold(f64::INFINITY, f64::min),
            max_learning_rate: learning_rates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            learning_rate_volatility: sample_std_dev(&learning_rates),
            target_deviation: mean(&deviations),
            responsiveness_score: self.responsiveness(blocks, states),
        }
    }

    fn responsiveness(&self, blocks: &[u64], states: &[FeeState]) -> f64 {
        let target = self.target_block_size as f64;
        if blocks.len() <= self.window_size || target == 0.0 {
            return 0.0;
        }

        let (total, count) = (self.window_size.max(1)..blocks.len() - 1)
            .filter_map(|i| {
                let demand_change = (blocks[i] as f64 - blocks[i - 1] as f64).abs() / target;
                let previous_fee = states[i - 1].base_fee as f64;
                (demand_change > DEMAND_CHANGE_THRESHOLD && previous_fee > 0.0).then(|| {
                    let fee_response =
                        ((states[i].base_fee as f64 - previous_fee) / previous_fee).abs();
                    fee_response / demand_change
                })
            })
            .fold((0.0, 0usize), |(sum, n), score| (sum + score, n + 1));

        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Bessel-corrected standard deviation; zero below two samples.
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
