//! # State Proofs Test Suite
//!
//! End-to-end tests exercising the public API of `state-proofs`.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (proof generation, verification)
//! └── src/integration/  # Proof flows, persistent stores, cache scoping
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p state-proofs-tests
//!
//! # With logs
//! RUST_LOG=state_proofs=debug cargo test -p state-proofs-tests -- --nocapture
//!
//! # Benchmarks
//! cargo bench -p state-proofs-tests
//! ```

pub mod integration;

use tracing_subscriber::EnvFilter;

/// Install a test log subscriber honouring `RUST_LOG`. Safe to call from
/// every test; only the first call takes effect.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
