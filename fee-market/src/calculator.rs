//! Pure numeric helpers shared by every adjuster.
//!
//! None of these functions panic. Degenerate inputs (zero target, empty or
//! unfilled window, inverted clamp bounds) resolve to zero or to a neutral
//! value instead.

use crate::state::Block;

/// Maximum block size: `target_block_size × burst_multiplier`, truncated.
///
/// ```text
/// 15_000_000 × 2.0 = 30_000_000
/// ```
#[inline]
pub fn max_block_size(target_block_size: u64, burst_multiplier: f64) -> u64 {
    (target_block_size as f64 * burst_multiplier) as u64
}

#[inline]
fn window(blocks: &[Block], window_size: usize) -> &[Block] {
    &blocks[blocks.len().saturating_sub(window_size)..]
}

/// Sum of gas used over the last `window_size` blocks (or all blocks if
/// fewer exist). Saturates at `u64::MAX`.
pub fn sum_gas_in_window(blocks: &[Block], window_size: usize) -> u64 {
    window(blocks, window_size)
        .iter()
        .fold(0u64, |acc, block| acc.saturating_add(block.gas_used))
}

/// Signed sum of `gas_used − target` over the last `window_size` blocks.
pub fn net_gas_delta(blocks: &[Block], window_size: usize, target_block_size: u64) -> i128 {
    window(blocks, window_size)
        .iter()
        .map(|block| block.gas_used as i128 - target_block_size as i128)
        .sum()
}

fn windowed_ratio(blocks: &[Block], window_size: usize, capacity: u64) -> f64 {
    if window_size == 0 || capacity == 0 || blocks.len() < window_size {
        return 0.0;
    }
    sum_gas_in_window(blocks, window_size) as f64 / (window_size as f64 * capacity as f64)
}

/// Windowed gas usage relative to the nominal target.
///
/// Zero until `window_size` blocks exist.
pub fn target_utilization(blocks: &[Block], window_size: usize, target_block_size: u64) -> f64 {
    windowed_ratio(blocks, window_size, target_block_size)
}

/// Windowed gas usage relative to the maximum block size.
///
/// Zero until `window_size` blocks exist.
pub fn burst_utilization(blocks: &[Block], window_size: usize, max_block_size: u64) -> f64 {
    windowed_ratio(blocks, window_size, max_block_size)
}

/// Single-block utilization `gas_used / target`, zero when the target is zero.
#[inline]
pub fn block_utilization(gas_used: u64, target_block_size: u64) -> f64 {
    if target_block_size == 0 {
        return 0.0;
    }
    gas_used as f64 / target_block_size as f64
}

#[inline]
pub fn clamp_u64(value: u64, min: u64, max: u64) -> u64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Unlike [`f64::clamp`] this never panics. With inverted bounds a value
/// below `min` resolves to `min` and any other value to `max`.
#[inline]
pub fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Apply a fractional change to a fee and floor the result at `min_base_fee`.
///
/// ```text
/// next = max(fee × (1 + change), min_base_fee)   (truncated to an integer)
/// ```
#[inline]
pub fn scale_fee(base_fee: u64, change: f64, min_base_fee: u64) -> u64 {
    floor_fee(base_fee as f64 * (1.0 + change), min_base_fee)
}

/// Truncate a real-valued fee to an integer no smaller than `min_base_fee`.
/// NaN and negative inputs land on the floor.
#[inline]
pub fn floor_fee(fee: f64, min_base_fee: u64) -> u64 {
    if fee.is_nan() || fee < min_base_fee as f64 {
        min_base_fee
    } else {
        (fee as u64).max(min_base_fee)
    }
}

/// Most recent minus previous sample; zero with fewer than two samples.
pub fn simple_difference<'a, I>(history: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
    I::IntoIter: DoubleEndedIterator,
{
    let mut rev = history.into_iter().rev();
    match (rev.next(), rev.next()) {
        (Some(last), Some(prev)) => last - prev,
        _ => 0.0,
    }
}

/// Least-squares slope of `samples` against their index `0..n`.
///
/// ```text
/// slope = (n·Σxy − Σx·Σy) / (n·Σx² − (Σx)²)
/// ```
///
/// Returns zero for fewer than two samples or a vanishing denominator.
pub fn regression_slope<'a, I>(samples: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    let (mut n, mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (i, y) in samples.into_iter().enumerate() {
        let x = i as f64;
        n += 1.0;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }
    if n < 2.0 {
        return 0.0;
    }
    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator.abs() < 1e-10 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}
