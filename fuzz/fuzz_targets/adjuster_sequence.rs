//! Fuzz every controller with arbitrary market settings and demand streams.
//!
//! Goals:
//! - Any configuration that passes validation never panics while running.
//! - The base fee never drops below `min_base_fee` once it starts at or above it.
//! - Reset returns the controller to its initial fee with an empty block log.

#![no_main]

use {
    arbitrary::{Arbitrary, Unstructured},
    fms_fee_market::{AdjusterFactory, AdjusterType, FeeAdjuster, ManualClock, MarketConfig},
    libfuzzer_sys::fuzz_target,
    std::sync::Arc,
};

#[derive(Debug)]
struct FuzzInput {
    kind: AdjusterType,
    market: MarketConfig,
    blocks: Vec<(u64, u16)>,
}

impl<'a> Arbitrary<'a> for FuzzInput {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let kind = *u.choose(&AdjusterType::ALL)?;
        let initial_base_fee: u64 = u.arbitrary()?;
        let market = MarketConfig {
            target_block_size: u.arbitrary()?,
            burst_multiplier: u.arbitrary()?,
            initial_base_fee,
            min_base_fee: u.int_in_range(0..=initial_base_fee)?,
            window_size: u.int_in_range(0..=64)?,
        };
        let len = u.int_in_range(0..=256)?;
        let blocks = (0..len)
            .map(|_| Ok((u.arbitrary()?, u.arbitrary()?)))
            .collect::<arbitrary::Result<_>>()?;
        Ok(FuzzInput { kind, market, blocks })
    }
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let input: FuzzInput = match u.arbitrary() {
        Ok(i) => i,
        Err(_) => return,
    };

    let clock = Arc::new(ManualClock::new());
    let factory = AdjusterFactory::with_clock(clock.clone());
    // Rejected configurations are fine; they just must not panic.
    let Ok(mut adjuster) = factory.create(input.kind, &input.market) else {
        return;
    };

    for &(gas_used, step_ms) in &input.blocks {
        clock.advance_ms(u64::from(step_ms));
        adjuster.process_block(gas_used);
        let state = adjuster.current_state();
        assert!(
            state.base_fee >= input.market.min_base_fee,
            "{}: fee {} below floor {}",
            input.kind,
            state.base_fee,
            input.market.min_base_fee
        );
        assert!(!state.learning_rate.is_nan(), "{}: NaN learning rate", input.kind);
    }
    assert_eq!(adjuster.blocks().len(), input.blocks.len());

    adjuster.reset();
    assert!(adjuster.blocks().is_empty());
    assert_eq!(adjuster.current_state().base_fee, input.market.initial_base_fee);
});
