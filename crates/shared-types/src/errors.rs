//! # Error Types
//!
//! Parsing errors for the shared primitives.

use thiserror::Error;

/// Errors raised while parsing shared primitive values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    /// Not a 20-byte hex address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Not a number, hex string or decimal string.
    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),

    /// Malformed hex string.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Hex decoded to the wrong number of bytes.
    #[error("Invalid length: expected {expected} bytes")]
    InvalidLength { expected: usize },

    /// Status string the provider never emits.
    #[error("Unknown verification status: {0}")]
    UnknownStatus(String),
}
