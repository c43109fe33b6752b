//! Replay of recorded chain data through an adjuster.
//!
//! Each recorded block is re-priced at the simulated base fee: transactions
//! whose fee cap is below it are dropped, and only the surviving gas is fed
//! to the adjuster. The dataset's own base fees are kept for comparison.

use {
    crate::{
        analysis::{Analyzer, RunSummary},
        error::SimError,
    },
    fms_fee_market::{AdjusterFactory, AdjusterType, FeeAdjuster, MarketConfig},
    log::*,
    serde::{Deserialize, Serialize},
};

/// Headroom assumed for transactions that carry no fee information (1 gwei).
pub const MISSING_FEE_BUFFER: u64 = 1_000_000_000;

/// Simulated/actual average ratio band treated as comparable.
pub const COMPARABLE_BAND: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    pub hash: String,
    /// Gas limit.
    pub gas: u64,
    /// Gas actually consumed, from the receipt.
    pub gas_used: u64,
    /// Legacy gas price; zero when absent.
    pub gas_price: u64,
    /// EIP-1559 fee cap; zero when absent.
    pub max_fee_per_gas: u64,
    pub max_priority_fee_per_gas: u64,
    #[serde(rename = "type")]
    pub tx_type: String,
    /// 1 on success, 0 on failure.
    pub status: u64,
}

impl Transaction {
    /// Highest base fee this transaction would still pay.
    ///
    /// The fee cap wins over the legacy gas price. With neither present the
    /// transaction is assumed to clear `current_base_fee` by
    /// [`MISSING_FEE_BUFFER`].
    pub fn max_fee(&self, current_base_fee: u64) -> u64 {
        if self.max_fee_per_gas > 0 {
            self.max_fee_per_gas
        } else if self.gas_price > 0 {
            self.gas_price
        } else {
            current_base_fee.saturating_add(MISSING_FEE_BUFFER)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockData {
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub base_fee_per_gas: u64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub timestamp: u64,
}

impl BlockData {
    /// Gas that survives at `base_fee`, and the number of dropped transactions.
    pub fn effective_gas(&self, base_fee: u64) -> (u64, usize) {
        self.transactions
            .iter()
            .fold((0u64, 0usize), |(gas, dropped), tx| {
                if tx.max_fee(base_fee) >= base_fee {
                    (gas.saturating_add(tx.gas_used), dropped)
                } else {
                    (gas, dropped + 1)
                }
            })
    }
}

/// A contiguous run of recorded blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSet {
    pub start_block: u64,
    pub end_block: u64,
    pub initial_base_fee: u64,
    pub initial_gas_limit: u64,
    pub blocks: Vec<BlockData>,
    #[serde(default)]
    pub fetched_at: i64,
}

impl DataSet {
    /// Checks that the blocks are non-empty and exactly cover
    /// `start_block..=end_block` in order.
    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |reason: String| Err(SimError::InvalidDataSet { reason });

        if self.blocks.is_empty() {
            return invalid("dataset contains no blocks".to_string());
        }
        let Some(span) = self.end_block.checked_sub(self.start_block) else {
            return invalid(format!(
                "end block {} precedes start block {}",
                self.end_block, self.start_block
            ));
        };
        if span.checked_add(1) != Some(self.blocks.len() as u64) {
            return invalid(format!(
                "dataset block count mismatch: expected {}, got {}",
                u128::from(span) + 1,
                self.blocks.len()
            ));
        }
        for (expected, (index, block)) in (self.start_block..).zip(self.blocks.iter().enumerate()) {
            if block.number != expected {
                return invalid(format!(
                    "block number gap detected: expected {expected}, got {} at index {index}",
                    block.number
                ));
            }
        }
        Ok(())
    }

    /// Market settings for replaying this dataset: the recorded starting fee
    /// and half the starting gas limit as target, over `market`'s other fields.
    pub fn market(&self, market: &MarketConfig) -> MarketConfig {
        MarketConfig {
            initial_base_fee: self.initial_base_fee,
            target_block_size: self.initial_gas_limit / 2,
            ..market.clone()
        }
    }
}

/// Per-block record of a replay, kept when tracing is requested.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplayPoint {
    pub block_number: u64,
    pub actual_base_fee: u64,
    pub simulated_base_fee: u64,
    pub dropped_percent: f64,
    pub actual_gas_used: u64,
    pub effective_gas_used: u64,
    pub learning_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplayResult {
    pub total_transactions: usize,
    pub dropped_transactions: usize,
    pub dropped_percent: f64,
    pub avg_base_fee: u64,
    pub max_base_fee: u64,
    pub min_base_fee: u64,
    pub total_gas_used: u64,
    /// Surviving gas over the replay's total target capacity.
    pub effective_utilization: f64,
    /// Effective gas per block, in replay order.
    pub gas_used: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<ReplayPoint>>,
}

/// How the simulated fees sit relative to the recorded ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeeRelation {
    /// Simulated average is higher by this many percent.
    Higher(f64),
    /// Simulated average is lower by this many percent.
    Lower(f64),
    Comparable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeComparison {
    pub actual_avg: f64,
    pub actual_min: u64,
    pub actual_max: u64,
    pub simulated_avg: u64,
    pub simulated_min: u64,
    pub simulated_max: u64,
    /// Simulated over actual average; zero when the actual average is zero.
    pub avg_ratio: f64,
}

impl FeeComparison {
    pub fn relation(&self) -> FeeRelation {
        if self.avg_ratio > 1.0 + COMPARABLE_BAND {
            FeeRelation::Higher((self.avg_ratio - 1.0) * 100.0)
        } else if self.avg_ratio < 1.0 - COMPARABLE_BAND {
            FeeRelation::Lower((1.0 - self.avg_ratio) * 100.0)
        } else {
            FeeRelation::Comparable
        }
    }
}

/// Replays datasets through freshly built adjusters of one kind.
#[derive(Debug, Clone)]
pub struct Replayer {
    kind: AdjusterType,
    market: MarketConfig,
    factory: AdjusterFactory,
}

impl Replayer {
    pub fn new(kind: AdjusterType, market: MarketConfig) -> Self {
        Self::with_factory(kind, market, AdjusterFactory::new())
    }

    pub fn with_factory(kind: AdjusterType, market: MarketConfig, factory: AdjusterFactory) -> Self {
        Self {
            kind,
            market,
            factory,
        }
    }

    pub fn kind(&self) -> AdjusterType {
        self.kind
    }

    /// Replay `dataset` and summarize the effective demand it produced.
    pub fn replay(&self, dataset: &DataSet) -> Result<(ReplayResult, RunSummary), SimError> {
        self.replay_with_trace(dataset, false)
    }

    /// As [`replay`](Self::replay), additionally recording a [`ReplayPoint`]
    /// per block when `trace` is set.
    pub fn replay_with_trace(
        &self,
        dataset: &DataSet,
        trace: bool,
    ) -> Result<(ReplayResult, RunSummary), SimError> {
        dataset.validate()?;
        let market = dataset.market(&self.market);
        let mut adjuster = self.factory.create(self.kind, &market)?;

        info!(
            "replay: {} over blocks {}-{} ({} blocks), initial fee {:.3} gwei, gas limit {:.1}M",
            self.kind,
            dataset.start_block,
            dataset.end_block,
            dataset.blocks.len(),
            dataset.initial_base_fee as f64 / 1e9,
            dataset.initial_gas_limit as f64 / 1e6
        );

        let mut total_transactions = 0usize;
        let mut dropped_transactions = 0usize;
        let mut base_fees = Vec::with_capacity(dataset.blocks.len());
        let mut gas_used = Vec::with_capacity(dataset.blocks.len());
        let mut points = trace.then(|| Vec::with_capacity(dataset.blocks.len()));

        for (i, block) in dataset.blocks.iter().enumerate() {
            let current_fee = adjuster.current_state().base_fee;
            let (effective_gas, dropped) = block.effective_gas(current_fee);
            total_transactions += block.transactions.len();
            dropped_transactions += dropped;

            adjuster.process_block(effective_gas);
            let state = adjuster.current_state();
            base_fees.push(state.base_fee);
            gas_used.push(effective_gas);

            if let Some(points) = points.as_mut() {
                points.push(ReplayPoint {
                    block_number: block.number,
                    actual_base_fee: block.base_fee_per_gas,
                    simulated_base_fee: state.base_fee,
                    dropped_percent: percent(dropped, block.transactions.len()),
                    actual_gas_used: block.gas_used,
                    effective_gas_used: effective_gas,
                    learning_rate: state.learning_rate,
                });
            }
            if i < 10 || i % 50 == 0 {
                debug!(
                    "replay: block {} gas {} fee {:.3} gwei dropped {}",
                    block.number,
                    effective_gas,
                    state.base_fee as f64 / 1e9,
                    dropped
                );
            }
        }

        let total_gas_used = gas_used.iter().fold(0u64, |sum, &g| sum.saturating_add(g));
        let capacity = gas_used.len() as f64 * market.target_block_size as f64;
        let result = ReplayResult {
            total_transactions,
            dropped_transactions,
            dropped_percent: percent(dropped_transactions, total_transactions),
            avg_base_fee: average(&base_fees) as u64,
            max_base_fee: base_fees.iter().copied().max().unwrap_or_default(),
            min_base_fee: base_fees.iter().copied().min().unwrap_or_default(),
            total_gas_used,
            effective_utilization: if capacity > 0.0 {
                total_gas_used as f64 / capacity
            } else {
                0.0
            },
            gas_used,
            trace: points,
        };

        let mut fresh = self.factory.create(self.kind, &market)?;
        let summary = Analyzer::new(&market).run_scenario(
            &format!("replay of blocks {}-{}", dataset.start_block, dataset.end_block),
            &mut fresh,
            &result.gas_used,
        );

        info!(
            "replay: {} of {} transactions dropped ({:.2}%), effective utilization {:.2}%",
            result.dropped_transactions,
            result.total_transactions,
            result.dropped_percent,
            result.effective_utilization * 100.0
        );
        Ok((result, summary))
    }
}

/// Set the replayed fees against the base fees recorded in `dataset`.
pub fn compare_with_actual(dataset: &DataSet, result: &ReplayResult) -> FeeComparison {
    let actual: Vec<u64> = dataset.blocks.iter().map(|b| b.base_fee_per_gas).collect();
    let actual_avg = average(&actual);
    let comparison = FeeComparison {
        actual_avg,
        actual_min: actual.iter().copied().min().unwrap_or_default(),
        actual_max: actual.iter().copied().max().unwrap_or_default(),
        simulated_avg: result.avg_base_fee,
        simulated_min: result.min_base_fee,
        simulated_max: result.max_base_fee,
        avg_ratio: if actual_avg > 0.0 {
            result.avg_base_fee as f64 / actual_avg
        } else {
            0.0
        },
    };
    match comparison.relation() {
        FeeRelation::Higher(pct) => info!("replay: simulated fees {pct:.1}% higher than actual"),
        FeeRelation::Lower(pct) => info!("replay: simulated fees {pct:.1}% lower than actual"),
        FeeRelation::Comparable => info!("replay: simulated fees comparable to actual"),
    }
    comparison
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn average(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}
