//! Stress Test: Long Randomized Run
//!
//! Replays the mixed traffic scenario many times over with seeded noise and
//! bursts, for every controller, and checks that the run is reproducible
//! from its seed and that summaries stay sane over a long horizon.
//!
//! Run: `cargo test -p fms-stress-tests --test long_run -- --nocapture`

use {
    fms_fee_market::{AdjusterFactory, AdjusterType, FeeAdjuster, ManualClock, MarketConfig},
    fms_sim::{Analyzer, RandomizerConfig, RunSummary, Scenario, ScenarioKind},
    std::{sync::Arc, time::Instant},
};

const REPEATS: usize = 50;
const FLOOR: u64 = 1_000_000;

fn randomized_blocks(market: &MarketConfig, seed: u64) -> Vec<u64> {
    let mut randomizer = RandomizerConfig {
        seed,
        gaussian_noise: 0.1,
        burst_probability: 0.05,
        burst_duration_min: 3,
        burst_duration_max: 12,
        burst_intensity: 1.8,
    }
    .build()
    .unwrap();
    let base = Scenario::generate(ScenarioKind::Mixed, market.target_block_size);
    let mut blocks = Vec::with_capacity(base.blocks.len() * REPEATS);
    for _ in 0..REPEATS {
        let scenario = base.clone().with_randomness(&mut randomizer, market.max_block_size());
        blocks.extend(scenario.blocks);
    }
    blocks
}

fn run(kind: AdjusterType, market: &MarketConfig, blocks: &[u64]) -> RunSummary {
    let clock = Arc::new(ManualClock::new());
    let mut adjuster = AdjusterFactory::with_clock(clock.clone())
        .create(kind, market)
        .unwrap();

    // Step the clock alongside the blocks so the hierarchical layers coordinate.
    struct Clocked<'a, A> {
        inner: &'a mut A,
        clock: &'a ManualClock,
    }
    impl<A: FeeAdjuster> FeeAdjuster for Clocked<'_, A> {
        fn process_block(&mut self, gas_used: u64) {
            self.clock.advance_ms(2_000);
            self.inner.process_block(gas_used);
        }
        fn current_state(&self) -> fms_fee_market::FeeState {
            self.inner.current_state()
        }
        fn max_block_size(&self) -> u64 {
            self.inner.max_block_size()
        }
        fn blocks(&self) -> Vec<fms_fee_market::Block> {
            self.inner.blocks()
        }
        fn reset(&mut self) {
            self.inner.reset()
        }
    }

    let mut clocked = Clocked {
        inner: &mut adjuster,
        clock: &clock,
    };
    Analyzer::new(market).run_scenario(kind.as_str(), &mut clocked, blocks)
}

#[test]
fn stress_long_randomized_run() {
    println!("\n=== Long Randomized Run ===\n");

    let market = MarketConfig {
        min_base_fee: FLOOR,
        ..MarketConfig::default()
    };
    let blocks = randomized_blocks(&market, 0xfee);
    println!("Blocks per run: {}\n", blocks.len());

    for kind in AdjusterType::ALL {
        let start = Instant::now();
        let summary = run(kind, &market, &blocks);
        let elapsed = start.elapsed();

        println!(
            "{:<18} final {:>22}  range {:>10.2}x  volatility {:>14.3} Gwei  responsiveness {:.3}  ({elapsed:?})",
            kind.as_str(),
            summary.final_base_fee,
            summary.fee_range_ratio(),
            summary.base_fee_volatility / 1e9,
            summary.responsiveness_score,
        );

        assert_eq!(summary.total_blocks, blocks.len());
        assert!(summary.min_base_fee >= FLOOR, "{kind}: fell below floor");
        assert!(summary.base_fee_volatility.is_finite(), "{kind}");
        assert!(summary.avg_learning_rate.is_finite(), "{kind}");
        assert!(
            (summary.avg_gas_used_percent - 100.0 * summary.avg_gas_used / market.max_block_size() as f64).abs()
                < 1e-6
        );
    }
}

#[test]
fn stress_seeded_runs_are_reproducible() {
    let market = MarketConfig::default();
    let first = randomized_blocks(&market, 42);
    let second = randomized_blocks(&market, 42);
    let other = randomized_blocks(&market, 43);
    assert_eq!(first, second);
    assert_ne!(first, other);

    for kind in AdjusterType::ALL {
        assert_eq!(run(kind, &market, &first), run(kind, &market, &second), "{kind}");
    }
}
