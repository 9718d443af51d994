//! # Quantum-Chain Test Suite
//!
//! Cross-crate tests for genesis construction and export.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── fixtures.rs        # Shared genesis builders
//! │   └── integration/       # Builder → export → reader flows
//! │       ├── reference_network.rs
//! │       ├── determinism.rs
//! │       └── artifact.rs
//! └── benches/
//!     └── genesis_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qc-tests
//! cargo test -p qc-tests integration::artifact
//! cargo bench -p qc-tests
//! ```

pub mod fixtures;
pub mod integration;
