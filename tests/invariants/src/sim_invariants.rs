//! Property-based tests for the simulation harness.
//!
//! Properties tested:
//! 1. Randomizers never exceed the max block size
//! 2. A seed fully determines a randomized scenario
//! 3. Run summaries are internally consistent

#[cfg(test)]
mod tests {
    use {
        fms_fee_market::{AdjusterFactory, AdjusterType, MarketConfig},
        fms_sim::{Analyzer, Randomizer, RandomizerConfig, Scenario, ScenarioKind},
        proptest::prelude::*,
    };

    fn randomizer_config() -> impl Strategy<Value = RandomizerConfig> {
        (
            any::<u64>(),
            0.0..=1.0f64,
            0.0..=1.0f64,
            1..=10u32,
            0..=10u32,
            0.1..=5.0f64,
        )
            .prop_map(|(seed, noise, probability, min, extra, intensity)| RandomizerConfig {
                seed,
                gaussian_noise: noise,
                burst_probability: probability,
                burst_duration_min: min,
                burst_duration_max: min + extra,
                burst_intensity: intensity,
            })
    }

    fn any_scenario() -> impl Strategy<Value = ScenarioKind> {
        prop::sample::select(ScenarioKind::ALL.to_vec())
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1. Capacity cap
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn randomized_blocks_within_capacity(
            config in randomizer_config(),
            kind in any_scenario(),
        ) {
            let market = MarketConfig::default();
            let max_block_size = market.max_block_size();
            let mut randomizer = config.build().unwrap();
            let scenario = Scenario::generate(kind, market.target_block_size)
                .with_randomness(&mut randomizer, max_block_size);
            for gas in scenario.blocks {
                prop_assert!(gas <= max_block_size);
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 2. Seed determinism
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn seed_determines_scenario(config in randomizer_config(), kind in any_scenario()) {
            let target = MarketConfig::default().target_block_size;
            let max_block_size = MarketConfig::default().max_block_size();

            let mut first = config.build().unwrap();
            let a = Scenario::generate(kind, target).with_randomness(&mut first, max_block_size);
            let mut second = config.build().unwrap();
            let b = Scenario::generate(kind, target).with_randomness(&mut second, max_block_size);
            prop_assert_eq!(&a, &b);

            first.reset();
            let c = Scenario::generate(kind, target).with_randomness(&mut first, max_block_size);
            prop_assert_eq!(a, c);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 3. Summary consistency
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn summary_is_consistent(
            kind in any_scenario(),
            adjuster_kind in prop::sample::select(vec![
                AdjusterType::Aimd,
                AdjusterType::Eip1559,
                AdjusterType::Pid,
            ]),
            blocks in prop::collection::vec(0..=30_000_000u64, 0..200),
        ) {
            let market = MarketConfig::default();
            let mut adjuster = AdjusterFactory::new().create(adjuster_kind, &market).unwrap();
            let summary = Analyzer::new(&market).run_scenario(kind.as_str(), &mut adjuster, &blocks);

            prop_assert_eq!(summary.total_blocks, blocks.len());
            prop_assert!(summary.min_base_fee <= summary.final_base_fee);
            prop_assert!(summary.final_base_fee <= summary.max_base_fee);
            prop_assert!(summary.base_fee_volatility >= 0.0);
            prop_assert!(summary.target_deviation >= 0.0);
            prop_assert!(summary.responsiveness_score >= 0.0);
            if !blocks.is_empty() {
                prop_assert!(summary.min_learning_rate <= summary.avg_learning_rate + 1e-12);
                prop_assert!(summary.avg_learning_rate <= summary.max_learning_rate + 1e-12);
            }
        }
    }
}
