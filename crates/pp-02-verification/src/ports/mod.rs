//! # Ports Layer
//!
//! - `inbound`: APIs this subsystem exposes to the HTTP gateway
//! - `outbound`: store, identity provider and fee ledger it depends on

pub mod inbound;
pub mod outbound;
