//! Fee Market Stress Test Suite
//!
//! Standalone stress tests for the fee adjustment engine.
//! Each test file can be run independently.
//!
//! ```bash
//! cargo test -p fms-stress-tests --test fee_spike -- --nocapture
//! cargo test -p fms-stress-tests --test concurrent_params -- --nocapture
//! cargo test -p fms-stress-tests --test long_run -- --nocapture
//! ```
