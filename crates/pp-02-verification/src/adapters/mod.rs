//! # Adapters
//!
//! In-process implementations of the outbound ports, used by tests and the
//! `memory` storage backend.

pub mod memory;
pub mod mock;
