//! Fuzz randomizer configuration and application.
//!
//! Goals:
//! - `validate` and `build` never panic on arbitrary floats (NaN, inf).
//! - A built randomizer never exceeds the max block size it is given.
//! - Reset replays the exact same sequence.

#![no_main]

use {
    arbitrary::{Arbitrary, Unstructured},
    fms_sim::{Randomizer, RandomizerConfig},
    libfuzzer_sys::fuzz_target,
};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    seed: u64,
    gaussian_noise: f64,
    burst_probability: f64,
    burst_duration_min: u8,
    burst_duration_max: u8,
    burst_intensity: f64,
    max_block_size: u64,
    blocks: Vec<u64>,
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let input: FuzzInput = match u.arbitrary() {
        Ok(i) => i,
        Err(_) => return,
    };

    let config = RandomizerConfig {
        seed: input.seed,
        gaussian_noise: input.gaussian_noise,
        burst_probability: input.burst_probability,
        burst_duration_min: input.burst_duration_min.into(),
        burst_duration_max: input.burst_duration_max.into(),
        burst_intensity: input.burst_intensity,
    };
    let Ok(mut randomizer) = config.build() else {
        return;
    };

    let first: Vec<u64> = input
        .blocks
        .iter()
        .map(|&gas| randomizer.add_randomness(gas.min(input.max_block_size), input.max_block_size))
        .collect();
    for &gas in &first {
        assert!(gas <= input.max_block_size, "{gas} exceeds {}", input.max_block_size);
    }

    randomizer.reset();
    let replay: Vec<u64> = input
        .blocks
        .iter()
        .map(|&gas| randomizer.add_randomness(gas.min(input.max_block_size), input.max_block_size))
        .collect();
    assert_eq!(first, replay);
});
