//! Gateway domain: configuration, chain registry, request schemas,
//! response shapes and the error mapping.

pub mod chains;
pub mod config;
pub mod error;
pub mod requests;
pub mod responses;
