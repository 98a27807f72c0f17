//! # Shared Types Crate
//!
//! Primitive types shared across the verification subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: addresses, hashes, chain ids and the
//!   verification status enum are defined once and reused by every crate.
//! - **Wire-Friendly**: every type serializes the way the HTTP API and the
//!   storage layer expect (0x-prefixed hex, decimal chain ids).
//! - **Injectable Time**: anything that depends on "now" takes a
//!   [`TimeSource`] so tests can drive the clock.

pub mod entities;
pub mod errors;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
