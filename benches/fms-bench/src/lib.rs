//! Fee Market Benchmark Suite
//!
//! Run all benchmarks:
//! ```bash
//! cargo bench -p fms-bench
//! ```
//!
//! Run a specific benchmark group:
//! ```bash
//! cargo bench -p fms-bench --bench adjuster_bench
//! cargo bench -p fms-bench --bench sim_bench
//! ```

pub mod helpers;
