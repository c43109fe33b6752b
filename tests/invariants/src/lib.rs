//! Property-based invariant tests for the fee market engine.
//!
//! Uses proptest to verify properties that must hold for any demand stream:
//! - Base fee floors and per-algorithm step bounds
//! - Learning-rate and integral bounds
//! - Reset/replay determinism
//! - Strategic parameter ranges and update-link capacity
//! - Scenario and randomizer reproducibility

pub mod controller_invariants;
pub mod hierarchical_invariants;
pub mod sim_invariants;
