//! Stress Test: Fee Spike
//!
//! Simulates a sudden demand spike (token launch, mint rush) against every
//! controller to verify fees rise under load and recover afterwards, and
//! that alternating full/empty blocks do not cause runaway oscillation.
//!
//! Run: `cargo test -p fms-stress-tests --test fee_spike -- --nocapture`

use {
    fms_fee_market::{Adjuster, AdjusterFactory, AdjusterType, FeeAdjuster, ManualClock, MarketConfig},
    std::{sync::Arc, time::Instant},
};

const FLOOR: u64 = 100_000_000;
const BLOCK_TIME_MS: u64 = 2_000;

/// Describes a demand phase.
struct DemandPhase {
    name: &'static str,
    blocks: u64,
    utilization_pct: u64, // percent of target, up to the 200 % burst limit
}

fn market() -> MarketConfig {
    MarketConfig {
        min_base_fee: FLOOR,
        ..MarketConfig::default()
    }
}

fn build(kind: AdjusterType) -> (Adjuster, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let adjuster = AdjusterFactory::with_clock(clock.clone())
        .create(kind, &market())
        .unwrap();
    (adjuster, clock)
}

#[test]
fn stress_fee_spike_and_recovery() {
    println!("\n=== Fee Spike Stress Test ===\n");

    let phases = [
        DemandPhase { name: "Quiet",           blocks: 100, utilization_pct: 50 },
        DemandPhase { name: "Ramp-up",         blocks: 20,  utilization_pct: 120 },
        DemandPhase { name: "Spike (launch)",  blocks: 50,  utilization_pct: 200 },
        DemandPhase { name: "Sustained high",  blocks: 100, utilization_pct: 150 },
        DemandPhase { name: "Cool-down",       blocks: 30,  utilization_pct: 80 },
        DemandPhase { name: "Recovery",        blocks: 400, utilization_pct: 30 },
    ];
    let target = market().target_block_size;

    for kind in AdjusterType::ALL {
        println!("--- {kind} ---");
        let (mut adjuster, clock) = build(kind);
        let start = Instant::now();

        let mut pre_spike_fee = adjuster.current_state().base_fee;
        let mut peak_fee = 0u64;
        let mut block_num = 0u64;

        for phase in &phases {
            let phase_start_fee = adjuster.current_state().base_fee;
            let gas_used = target * phase.utilization_pct / 100;

            for _ in 0..phase.blocks {
                clock.advance_ms(BLOCK_TIME_MS);
                adjuster.process_block(gas_used);
                let fee = adjuster.current_state().base_fee;
                assert!(fee >= FLOOR, "{kind}: fee {fee} below floor at block {block_num}");
                peak_fee = peak_fee.max(fee);
                block_num += 1;
            }

            let phase_end_fee = adjuster.current_state().base_fee;
            println!(
                "  {:<16} {:>4} blocks @ {:>3}%  base_fee: {} → {} ({})",
                phase.name,
                phase.blocks,
                phase.utilization_pct,
                phase_start_fee,
                phase_end_fee,
                if phase_end_fee > phase_start_fee { "↑" } else { "↓" }
            );

            if phase.name == "Quiet" {
                pre_spike_fee = phase_end_fee;
            }
        }

        let final_fee = adjuster.current_state().base_fee;
        println!("  Pre-spike: {pre_spike_fee}  Peak: {peak_fee}  Final: {final_fee}");
        println!(
            "  Peak / Pre-spike: {:.1}x  Elapsed: {:?}\n",
            peak_fee as f64 / pre_spike_fee as f64,
            start.elapsed()
        );

        assert_eq!(adjuster.blocks().len() as u64, block_num);
        assert!(
            peak_fee > pre_spike_fee,
            "{kind}: fee should rise during the spike: peak={peak_fee}, pre_spike={pre_spike_fee}"
        );
        assert!(
            final_fee < peak_fee,
            "{kind}: fee should recover below peak: final={final_fee}, peak={peak_fee}"
        );
    }
}

#[test]
fn stress_fee_oscillation_stability() {
    println!("\n=== Fee Oscillation Stability Test ===\n");

    let max_block_size = market().max_block_size();

    for kind in AdjusterType::ALL {
        let (mut adjuster, clock) = build(kind);

        // Alternate between full and empty blocks for 1000 blocks
        let fees: Vec<u64> = (0..1000u64)
            .map(|i| {
                clock.advance_ms(BLOCK_TIME_MS);
                adjuster.process_block(if i % 2 == 0 { max_block_size } else { 0 });
                adjuster.current_state().base_fee
            })
            .collect();

        let last_100 = &fees[900..];
        let max_fee = *last_100.iter().max().unwrap();
        let min_fee = *last_100.iter().min().unwrap();
        let ratio = max_fee as f64 / min_fee as f64;

        println!("{kind}: last 100 blocks {min_fee}..{max_fee} ({ratio:.2}x)");

        assert!(
            ratio < 3.0,
            "{kind}: fee oscillation is too volatile: ratio={ratio:.2}x"
        );
    }
}

#[test]
fn stress_sustained_congestion_then_drain() {
    println!("\n=== Sustained Congestion Test ===\n");

    let max_block_size = market().max_block_size();

    for kind in [AdjusterType::Eip1559, AdjusterType::Aimd] {
        let (mut adjuster, clock) = build(kind);

        for _ in 0..300 {
            clock.advance_ms(BLOCK_TIME_MS);
            adjuster.process_block(max_block_size);
        }
        let congested_fee = adjuster.current_state().base_fee;
        println!("{kind}: after 300 full blocks base_fee = {congested_fee}");

        let mut blocks_to_floor = 0u64;
        while adjuster.current_state().base_fee > FLOOR {
            clock.advance_ms(BLOCK_TIME_MS);
            adjuster.process_block(0);
            blocks_to_floor += 1;
            if blocks_to_floor > 100_000 {
                break;
            }
        }

        println!("{kind}: blocks to drain back to floor: {blocks_to_floor}");
        assert!(
            blocks_to_floor < 100_000,
            "{kind}: recovery should complete within reasonable time"
        );
        assert_eq!(adjuster.current_state().base_fee, FLOOR);
    }
}
