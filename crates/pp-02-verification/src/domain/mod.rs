//! # Domain Layer
//!
//! Pure verification logic with no I/O dependencies.

pub mod config;
pub mod cooldown;
pub mod disclosure;
pub mod errors;
pub mod record;
pub mod report;
pub mod transitions;
pub mod views;
