//! Driving harness for the fee market engine: canned demand
//! [`scenario`]s, seeded [`randomizer`]s that perturb them, an
//! [`analysis`] pass that condenses a run into a [`RunSummary`], and a
//! [`replay`] of recorded chain data that prices out transactions whose fee
//! cap falls below the simulated base fee.
//!
//! ```rust
//! use {
//!     fms_fee_market::{AdjusterFactory, AdjusterType, MarketConfig},
//!     fms_sim::{Analyzer, RandomizerConfig, Scenario, ScenarioKind},
//! };
//!
//! let market = MarketConfig::default();
//! let mut randomizer = RandomizerConfig { seed: 7, gaussian_noise: 0.05, ..RandomizerConfig::default() }
//!     .build()
//!     .unwrap();
//! let scenario = Scenario::generate(ScenarioKind::Stable, market.target_block_size)
//!     .with_randomness(&mut randomizer, market.max_block_size());
//!
//! let mut adjuster = AdjusterFactory::new().create(AdjusterType::Aimd, &market).unwrap();
//! let summary = Analyzer::new(&market).run_scenario(&scenario.name, &mut adjuster, &scenario.blocks);
//! assert_eq!(summary.total_blocks, 40);
//! ```

pub mod analysis;
pub mod error;
pub mod randomizer;
pub mod replay;
pub mod scenario;

pub use {
    analysis::{Analyzer, RunSummary},
    error::SimError,
    randomizer::{BurstRandomizer, CompoundRandomizer, GaussianNoise, Randomizer, RandomizerConfig},
    replay::{
        compare_with_actual, BlockData, DataSet, FeeComparison, FeeRelation, ReplayPoint,
        ReplayResult, Replayer, Transaction,
    },
    scenario::{Scenario, ScenarioKind},
};
