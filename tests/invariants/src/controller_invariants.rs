//! Property-based tests for single-controller invariants.
//!
//! Properties tested:
//! 1. Base fee never drops below the configured minimum
//! 2. EIP-1559 moves at most 1/8 per block within burst capacity
//! 3. AIMD learning rate stays within [min, max] once adjusting
//! 4. PID output and integral stay within their clamps
//! 5. Reset followed by replay reproduces a fresh run
//! 6. Windowed utilization is zero until the window fills

#[cfg(test)]
mod tests {
    use {
        fms_fee_market::{
            calculator, eip1559::next_base_fee, AdjusterConfig, AdjusterFactory, AdjusterType,
            AimdConfig, FeeAdjuster, FeeState, ManualClock, MarketConfig, PidAdjuster, PidConfig,
        },
        proptest::prelude::*,
        std::sync::Arc,
    };

    const TARGET: u64 = 15_000_000;
    const INITIAL_FEE: u64 = 1_000_000_000;

    fn demand(max_len: usize) -> impl Strategy<Value = Vec<u64>> {
        prop::collection::vec(0..=3 * TARGET, 1..max_len)
    }

    fn any_kind() -> impl Strategy<Value = AdjusterType> {
        prop::sample::select(AdjusterType::ALL.to_vec())
    }

    fn drive<A: FeeAdjuster>(
        adjuster: &mut A,
        clock: &ManualClock,
        step_ms: u64,
        demand: &[u64],
    ) -> Vec<FeeState> {
        demand
            .iter()
            .map(|&gas| {
                clock.advance_ms(step_ms);
                adjuster.process_block(gas);
                adjuster.current_state()
            })
            .collect()
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1. Minimum base fee
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn base_fee_never_below_minimum(
            kind in any_kind(),
            min_base_fee in 0..=INITIAL_FEE,
            step_ms in 0..=20_000u64,
            demand in demand(150),
        ) {
            let clock = Arc::new(ManualClock::new());
            let factory = AdjusterFactory::with_clock(clock.clone());
            let market = MarketConfig { min_base_fee, ..MarketConfig::default() };
            let mut adjuster = factory.create(kind, &market).unwrap();

            for (i, state) in drive(&mut adjuster, &clock, step_ms, &demand).iter().enumerate() {
                prop_assert!(
                    state.base_fee >= min_base_fee,
                    "{kind}: block {i} fee {} below floor {min_base_fee}",
                    state.base_fee
                );
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 2. EIP-1559 step bound
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn eip1559_step_at_most_one_eighth(
            base_fee in 0..=1_000_000_000_000u64,
            gas_used in 0..=2 * TARGET,
            floor_fraction in 0.0..=1.0f64,
        ) {
            let min_base_fee = (base_fee as f64 * floor_fraction) as u64;
            let next = next_base_fee(base_fee, gas_used, TARGET, min_base_fee);

            prop_assert!(next >= min_base_fee);
            prop_assert!(
                next.abs_diff(base_fee) <= base_fee / 8,
                "{base_fee} -> {next} for gas {gas_used}"
            );
            if gas_used > TARGET {
                prop_assert!(next >= base_fee);
            }
        }

        #[test]
        fn eip1559_never_panics_on_extremes(
            base_fee in any::<u64>(),
            gas_used in any::<u64>(),
            target in any::<u64>(),
            min_base_fee in any::<u64>(),
        ) {
            let next = next_base_fee(base_fee, gas_used, target, min_base_fee);
            prop_assert!(next >= min_base_fee || target == 0 || gas_used == target);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 3. AIMD learning-rate bounds
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn aimd_learning_rate_within_bounds(
            window_size in 1..=20usize,
            gamma in 0.0..=1.0f64,
            alpha in 0.0..=0.1f64,
            beta in 0.1..1.0f64,
            min_learning_rate in 0.0..=0.1f64,
            lr_span in 0.0..=1.0f64,
            lr_position in 0.0..=1.0f64,
            demand in demand(120),
        ) {
            let max_learning_rate = min_learning_rate + lr_span;
            let config = AimdConfig {
                window_size,
                gamma,
                alpha,
                beta,
                min_learning_rate,
                max_learning_rate,
                initial_learning_rate: min_learning_rate + lr_span * lr_position,
                ..AimdConfig::default()
            };
            let factory = AdjusterFactory::new();
            let mut adjuster = factory
                .create_from_config(AdjusterConfig::Aimd(config.clone()))
                .unwrap();

            for &gas in &demand {
                adjuster.process_block(gas);
                let lr = adjuster.current_state().learning_rate;
                prop_assert!(lr >= config.min_learning_rate && lr <= config.max_learning_rate);
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 4. PID clamps
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn pid_output_and_integral_clamped(
            kp in 0.0..=5.0f64,
            ki in 0.0..=5.0f64,
            kd in 0.0..=5.0f64,
            max_fee_change in 0.01..=1.0f64,
            integral_bound in 0.1..=20.0f64,
            demand in demand(120),
        ) {
            let config = PidConfig {
                kp,
                ki,
                kd,
                max_fee_change,
                max_integral: integral_bound,
                min_integral: -integral_bound,
                ..PidConfig::default()
            };
            prop_assert!(config.validate().is_ok());
            let mut pid = PidAdjuster::new(config);

            for &gas in &demand {
                pid.process_block(gas);
                prop_assert!(pid.last_output().abs() <= max_fee_change + f64::EPSILON);
                prop_assert!(pid.integral().abs() <= integral_bound + f64::EPSILON);
                prop_assert!(pid.current_state().learning_rate >= 0.0);
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 5. Reset determinism
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn reset_then_replay_matches_fresh(
            kind in any_kind(),
            step_ms in 1_000..=15_000u64,
            warmup in demand(80),
            demand in demand(80),
        ) {
            let clock = Arc::new(ManualClock::new());
            let factory = AdjusterFactory::with_clock(clock.clone());

            let mut fresh = factory.create(kind, &MarketConfig::default()).unwrap();
            let expected = drive(&mut fresh, &clock, step_ms, &demand);

            let mut reused = factory.create(kind, &MarketConfig::default()).unwrap();
            drive(&mut reused, &clock, step_ms, &warmup);
            reused.reset();
            prop_assert!(reused.blocks().is_empty());
            prop_assert_eq!(reused.current_state().base_fee, INITIAL_FEE);
            let replayed = drive(&mut reused, &clock, step_ms, &demand);

            prop_assert_eq!(expected, replayed, "{} diverged after reset", kind);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 6. Windowed utilization
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn utilization_zero_until_window_full(
            window_size in 1..=30usize,
            demand in demand(60),
        ) {
            let blocks: Vec<_> = {
                let mut log = fms_fee_market::state::BlockLog::new();
                demand.iter().for_each(|&gas| { log.record(gas, INITIAL_FEE); });
                log.to_vec()
            };
            let target = calculator::target_utilization(&blocks, window_size, TARGET);
            let burst = calculator::burst_utilization(&blocks, window_size, 2 * TARGET);

            if blocks.len() < window_size {
                prop_assert_eq!(target, 0.0);
                prop_assert_eq!(burst, 0.0);
            } else {
                prop_assert!(target >= 0.0);
                prop_assert!((target - 2.0 * burst).abs() < 1e-9);
            }
        }
    }
}
