//! Fuzz the EIP-1559 step function with random and extreme inputs.
//!
//! Goals:
//! - Find panics, overflows, or division-by-zero.
//! - Verify the output never drops below `min_base_fee`.
//! - Verify the 1/8 step bound while gas stays within twice the target.
//! - Verify monotonicity: more gas never yields a lower next fee.

#![no_main]

use {
    arbitrary::{Arbitrary, Unstructured},
    fms_fee_market::eip1559::next_base_fee,
    libfuzzer_sys::fuzz_target,
};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    base_fee: u64,
    gas_used: u64,
    extra_gas: u64,
    target: u64,
    min_base_fee: u64,
    sequence_len: u8,
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let input: FuzzInput = match u.arbitrary() {
        Ok(i) => i,
        Err(_) => return,
    };

    // ── Test 1: must not panic ──
    let next = next_base_fee(input.base_fee, input.gas_used, input.target, input.min_base_fee);

    // ── Invariant: floor holds whenever the fee actually moved ──
    if input.target != 0 && input.gas_used != input.target {
        assert!(
            next >= input.min_base_fee,
            "next ({next}) < min_base_fee ({})",
            input.min_base_fee
        );
    }

    // ── Test 2: step bound within burst capacity ──
    if input.target != 0
        && input.gas_used <= input.target.saturating_mul(2)
        && input.min_base_fee <= input.base_fee
    {
        assert!(
            next.abs_diff(input.base_fee) <= input.base_fee / 8,
            "{} -> {next} moved more than 1/8",
            input.base_fee
        );
    }

    // ── Test 3: monotonicity (a block exactly at target leaves the fee as is) ──
    if input.min_base_fee <= input.base_fee {
        let more_gas = input.gas_used.saturating_add(input.extra_gas);
        let next_high = next_base_fee(input.base_fee, more_gas, input.target, input.min_base_fee);
        assert!(
            next_high >= next,
            "monotonicity violation: gas {} -> {next}, gas {more_gas} -> {next_high}",
            input.gas_used
        );
    }

    // ── Test 4: repeated steps stay above the floor ──
    let mut fee = next.max(input.min_base_fee);
    for i in 0..input.sequence_len {
        fee = next_base_fee(fee, input.gas_used, input.target, input.min_base_fee);
        assert!(fee >= input.min_base_fee, "step {i}: fee {fee} below floor");
    }
});
