//! # Core Domain Entities
//!
//! Primitive values that flow between the signing engine, the verification
//! subsystem and the HTTP surface.
//!
//! ## Clusters
//!
//! - **Identity**: [`Address`], [`Hash`]
//! - **Chain Context**: [`ChainId`]
//! - **Verification Lifecycle**: [`VerificationStatus`]

use crate::errors::TypeError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte Keccak-256 digest.
pub type Hash = [u8; 32];

/// Render bytes as a 0x-prefixed lowercase hex string.
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a 0x-prefixed (or bare) hex string into a 32-byte hash.
pub fn parse_hash(value: &str) -> Result<Hash, TypeError> {
    let raw = strip_hex_prefix(value);
    let bytes = hex::decode(raw).map_err(|_| TypeError::InvalidHex(value.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| TypeError::InvalidLength { expected: 32 })
}

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// A 20-byte Ethereum account address.
///
/// Serialized as a 0x-prefixed lowercase hex string. Parsing accepts any
/// letter case, so EIP-55 checksummed input compares equal to its lowercase
/// form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Wrap raw address bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase 0x-prefixed hex form.
    pub fn to_hex(&self) -> String {
        to_hex_prefixed(&self.0)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = strip_hex_prefix(value.trim());
        if raw.len() != 40 {
            return Err(TypeError::InvalidAddress(value.to_string()));
        }
        let bytes = hex::decode(raw).map_err(|_| TypeError::InvalidAddress(value.to_string()))?;
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// CLUSTER B: CHAIN CONTEXT
// =============================================================================

/// EIP-155 chain identifier.
///
/// Clients send it either as a JSON number, a hex string (`"0x539"`, the form
/// wallets report) or a decimal string. All three name the same chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Local development chain (Ganache / Hardhat default).
    pub const DEV: ChainId = ChainId(0x539);

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Hex form as wallets report it, e.g. `0x539`.
    pub fn to_hex(&self) -> String {
        format!("{:#x}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for ChainId {
    type Err = TypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex_digits) => u64::from_str_radix(hex_digits, 16),
            None => trimmed.parse::<u64>(),
        };
        parsed
            .map(ChainId)
            .map_err(|_| TypeError::InvalidChainId(value.to_string()))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChainIdVisitor;

        impl<'de> Visitor<'de> for ChainIdVisitor {
            type Value = ChainId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a chain id as a number, hex string or decimal string")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<ChainId, E> {
                Ok(ChainId(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<ChainId, E> {
                u64::try_from(value)
                    .map(ChainId)
                    .map_err(|_| E::custom("chain id cannot be negative"))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<ChainId, E> {
                value.parse().map_err(E::custom)
            }
        }

        // Binary formats (bincode) cannot drive `deserialize_any`.
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(ChainIdVisitor)
        } else {
            u64::deserialize(deserializer).map(ChainId)
        }
    }
}

// =============================================================================
// CLUSTER C: VERIFICATION LIFECYCLE
// =============================================================================

/// Provider-reported status of a verification session.
///
/// A record that has not yet been attached to a session carries no status
/// at all (`Option::None`), which is why there is no `None` variant here.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Waiting for the user to complete document capture.
    RequiresInput,
    /// Documents submitted, provider checks in progress.
    Processing,
    /// Terminal: identity confirmed.
    Verified,
    /// Terminal: session abandoned or rejected.
    Canceled,
}

impl VerificationStatus {
    /// `verified` and `canceled` never change once stored.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Canceled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiresInput => "requires_input",
            Self::Processing => "processing",
            Self::Verified => "verified",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = TypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "requires_input" => Ok(Self::RequiresInput),
            "processing" => Ok(Self::Processing),
            "verified" => Ok(Self::Verified),
            "canceled" => Ok(Self::Canceled),
            other => Err(TypeError::UnknownStatus(other.to_string())),
        }
    }
}
