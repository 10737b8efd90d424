//! # Quorum-Node Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # criterion benchmarks of the hot paths
//! └── src/integration/  # cross-subsystem scenarios on real node runtimes
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qn-tests
//!
//! # By scenario
//! cargo test -p qn-tests integration::pbft_follower::
//! cargo test -p qn-tests integration::multi_node::
//!
//! # Benchmarks
//! cargo bench -p qn-tests
//! ```

pub mod integration;
