//! Property-based tests for the two-layer controller.
//!
//! Properties tested:
//! 1. Strategic parameters stay within the configured sequencer ranges
//! 2. Each strategic step moves kp by at most `max_parameter_change`
//! 3. The update link keeps the newest updates when saturated
//! 4. The coordinator never forwards more than the strategic layer issued

#[cfg(test)]
mod tests {
    use {
        fms_fee_market::{
            hierarchical::{SequencerParamUpdate, UpdateLink},
            FeeAdjuster, HierarchicalAdjuster, HierarchicalConfig, ManualClock,
        },
        proptest::prelude::*,
        std::{sync::Arc, time::Instant},
    };

    const TARGET: u64 = 15_000_000;

    /// Blocks large enough to push the simulated DA usage past its ceiling.
    const MAX_GAS: u64 = 150_000_000;

    fn demand() -> impl Strategy<Value = Vec<(u64, u64)>> {
        prop::collection::vec((0..=MAX_GAS, 0..=40_000u64), 1..120)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1-2. Strategic parameter bounds
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn strategic_params_within_ranges(blocks in demand()) {
            let config = HierarchicalConfig::default();
            let ranges = config.strategic.clone();
            let clock = Arc::new(ManualClock::new());
            let mut adjuster = HierarchicalAdjuster::new(config, clock.clone());
            let mut previous_kp = adjuster.strategic().sequencer_params().kp;

            for (gas, step_ms) in blocks {
                clock.advance_ms(step_ms);
                adjuster.process_block(gas);

                let params = adjuster.strategic().sequencer_params();
                prop_assert!(ranges.sequencer_kp_range.contains(params.kp), "kp {}", params.kp);
                prop_assert!(ranges.sequencer_ki_range.contains(params.ki), "ki {}", params.ki);
                prop_assert!(ranges.sequencer_kd_range.contains(params.kd), "kd {}", params.kd);

                let max_step = previous_kp * ranges.max_parameter_change + 1e-12;
                prop_assert!(
                    (params.kp - previous_kp).abs() <= max_step,
                    "kp jumped {previous_kp} -> {}",
                    params.kp
                );
                previous_kp = params.kp;
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 3. Drop-oldest link
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn link_keeps_newest_updates(capacity in 1..=16usize, sent in 0..=64usize) {
            let link = UpdateLink::with_capacity(capacity);
            let now = Instant::now();
            for i in 0..sent {
                link.send(SequencerParamUpdate {
                    kp: i as f64,
                    ..SequencerParamUpdate::initial(now)
                });
                prop_assert!(link.len() <= capacity);
            }

            let received: Vec<usize> = std::iter::from_fn(|| link.try_recv())
                .map(|update| update.kp as usize)
                .collect();
            let expected: Vec<usize> = (sent.saturating_sub(capacity)..sent).collect();
            prop_assert_eq!(received, expected);
            prop_assert!(link.is_empty());
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 4. Forwarding accounting
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn forwarded_never_exceeds_issued(
            blocks in demand(),
            update_interval_ms in 0..=60_000u64,
        ) {
            let config = HierarchicalConfig { update_interval_ms, ..HierarchicalConfig::default() };
            let clock = Arc::new(ManualClock::new());
            let mut adjuster = HierarchicalAdjuster::new(config, clock.clone());

            for (gas, step_ms) in blocks {
                clock.advance_ms(step_ms);
                adjuster.process_block(gas.min(2 * TARGET));
                let diagnostics = adjuster.diagnostics();
                prop_assert!(diagnostics.updates_forwarded <= diagnostics.strategic.updates_sent);
                prop_assert!(
                    diagnostics.tactical.parameter_updates_applied <= diagnostics.updates_forwarded
                );
            }
        }
    }
}
