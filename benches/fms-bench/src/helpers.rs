//! Shared helpers for fee market benchmarks.

use {
    fms_fee_market::{Adjuster, AdjusterFactory, AdjusterType, ManualClock, MarketConfig},
    rand::{Rng, SeedableRng},
    rand_chacha::ChaCha8Rng,
    std::sync::Arc,
};

/// `n` blocks of uniformly random gas in `[0, max_block_size]`.
pub fn random_demand(n: usize, market: &MarketConfig, seed: u64) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let max_block_size = market.max_block_size();
    (0..n).map(|_| rng.random_range(0..=max_block_size)).collect()
}

/// Alternating busy (150 %) and light (33 %) blocks.
pub fn alternating_demand(n: usize, market: &MarketConfig) -> Vec<u64> {
    let target = market.target_block_size;
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                target.saturating_mul(3) / 2
            } else {
                target / 3
            }
        })
        .collect()
}

/// An adjuster driven by a manual clock so timing-gated layers are reproducible.
pub fn make_adjuster(kind: AdjusterType, market: &MarketConfig) -> (Adjuster, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let adjuster = AdjusterFactory::with_clock(clock.clone())
        .create(kind, market)
        .unwrap();
    (adjuster, clock)
}
