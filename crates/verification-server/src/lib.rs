//! # Verification Server Library
//!
//! Production adapters and the service container behind the
//! `verification-server` binary, exposed for integration tests.
//!
//! ## Layout
//!
//! - `adapters/` - Identity provider client, fee ledger client, record stores
//! - `container/` - Configuration and dependency wiring

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;

pub use container::{ConfigError, ServerConfig, ServiceContainer};
