//! # Passport Verification Test Suite
//!
//! Cross-crate tests that the per-crate unit tests cannot cover.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/           # Criterion benchmarks (signing hot paths)
//! └── src/integration/
//!     ├── flows.rs       # HTTP API over the service container, mock upstreams
//!     └── live_stack.rs  # Real server and adapters against fake upstreams
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pp-tests
//! cargo test -p pp-tests integration::live_stack::
//!
//! # Benchmarks
//! cargo bench -p pp-tests
//! ```

pub mod integration;
