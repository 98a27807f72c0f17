//! # Domain Entities
//!
//! Signature value type and the disclosure thresholds the engine signs.

use super::errors::SignatureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// ECDSA Types (secp256k1)
// =============================================================================

/// Recoverable ECDSA signature on the secp256k1 curve.
///
/// Wire form is the 65-byte `r || s || v` string used by wallets and
/// `ecrecover`, hex encoded with a `0x` prefix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
}

impl EcdsaSignature {
    pub const LEN: usize = 65;

    /// Parse the 65-byte `r || s || v` form.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != Self::LEN {
            return Err(SignatureError::InvalidFormat);
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

impl FromStr for EcdsaSignature {
    type Err = SignatureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = value.trim();
        let raw = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes = hex::decode(raw).map_err(|_| SignatureError::InvalidFormat)?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for EcdsaSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// =============================================================================
// Disclosure Thresholds
// =============================================================================

/// Age thresholds that can be attested independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgeThreshold {
    Over18,
    Over21,
}

impl AgeThreshold {
    pub fn years(&self) -> u32 {
        match self {
            Self::Over18 => 18,
            Self::Over21 => 21,
        }
    }

    /// Literal tag string embedded in the signed tuple.
    pub fn tag(&self, satisfied: bool) -> &'static str {
        match (self, satisfied) {
            (Self::Over18, true) => "over18",
            (Self::Over18, false) => "notOver18",
            (Self::Over21, true) => "over21",
            (Self::Over21, false) => "notOver21",
        }
    }
}
