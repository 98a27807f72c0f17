//! # Signing Engine Subsystem (PP-01)
//!
//! Produces the server's attestations and recovers the signers of user
//! ownership proofs.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): ABI encoding, Keccak-256, secp256k1, no I/O
//! - **Ports Layer** (`ports/`): The [`SigningApi`] consumed by the verification services
//! - **Service Layer** (`service.rs`): [`SigningEngine`], backed by a per-chain keyring
//!
//! ## Signed Facts
//!
//! | Fact | ABI tuple |
//! |------|-----------|
//! | Full verification | `(address, uint256 expiration, bytes32 countryAndDocNumberHash)` |
//! | Over 18 / over 21 | `(address, string tag)` |
//! | Country | `(address, uint256 countryCodeInt)` |
//!
//! Each tuple is ABI-encoded, hashed with Keccak-256 and signed as an
//! Ethereum personal message over that 32-byte hash, so `ecrecover` on the
//! prefixed hash yields the chain's signer address on-chain.
//!
//! ## Security Notes
//!
//! - **Deterministic**: RFC 6979 nonces, identical inputs give identical signatures
//! - **Malleability**: emitted signatures always carry a low S value (EIP-2)
//! - **Key Isolation**: one key per chain; a chain without a key cannot sign

pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use domain::abi::{encode, AbiToken};
pub use domain::ecdsa::{
    address_from_pubkey, keccak256, personal_message_hash, recover_personal_signer,
    sign_personal_message,
};
pub use domain::entities::{AgeThreshold, EcdsaSignature};
pub use domain::errors::SignatureError;
pub use domain::keyring::SignerKeyring;
pub use ports::inbound::SigningApi;
pub use service::SigningEngine;
