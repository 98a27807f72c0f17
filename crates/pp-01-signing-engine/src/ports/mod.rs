//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that the verification services call
//!
//! The engine has no outbound dependencies; keys are injected at construction.

pub mod inbound;
