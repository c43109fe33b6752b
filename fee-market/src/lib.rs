//! # Fee market simulation engine
//!
//! Interchangeable **base-fee controllers** driven by a stream of per-block
//! gas observations:
//!
//! - [`aimd`]: additive-increase / multiplicative-decrease with a windowed
//!   learning rate.
//! - [`eip1559`]: the textbook single-block corrector with a 1/8 step.
//! - [`pid`]: a PID loop with anti-windup and a regression-smoothed
//!   derivative.
//! - [`hierarchical`]: a slow strategic layer tuning a fast tactical layer
//!   over a lossy, non-blocking parameter link.
//!
//! Every controller implements [`FeeAdjuster`]. Build them through
//! [`AdjusterFactory`], which validates configuration up front; after that no
//! call can fail.
//!
//! ## Quick start
//!
//! ```rust
//! use fms_fee_market::{AdjusterFactory, AdjusterType, FeeAdjuster, MarketConfig};
//!
//! let factory = AdjusterFactory::new();
//! let mut adjuster = factory
//!     .create(AdjusterType::Eip1559, &MarketConfig::default())
//!     .unwrap();
//!
//! // A completely full block (2 × the 15 M target) raises the fee by 1/8.
//! adjuster.process_block(30_000_000);
//! assert_eq!(adjuster.current_state().base_fee, 1_125_000_000);
//! ```
//!
//! See [`config`] for every tunable and [`calculator`] for the shared math.

pub mod adjuster;
pub mod aimd;
pub mod calculator;
pub mod clock;
pub mod config;
pub mod eip1559;
pub mod error;
pub mod factory;
pub mod hierarchical;
pub mod pid;
pub mod state;


// Re-exports for convenience.
pub use {
    adjuster::FeeAdjuster,
    aimd::AimdAdjuster,
    clock::{Clock, ManualClock, SystemClock},
    config::{
        AimdConfig, Eip1559Config, HierarchicalConfig, MarketConfig, ParamRange, PidConfig,
        StrategicConfig, TacticalConfig,
    },
    eip1559::Eip1559Adjuster,
    error::FeeMarketError,
    factory::{Adjuster, AdjusterConfig, AdjusterFactory, AdjusterType},
    hierarchical::{HierarchicalAdjuster, StrategicLayer, TacticalLayer},
    pid::PidAdjuster,
    state::{Block, FeeState},
};
