//! # Service Container
//!
//! Central container holding the verification services with their
//! production adapters, built once at startup.

pub mod config;
pub mod services;

pub use config::{ConfigError, ServerConfig};
pub use services::{ContainerError, ServiceContainer, ServicePorts};
