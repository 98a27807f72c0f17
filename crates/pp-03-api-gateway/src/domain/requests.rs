//! # Endpoint Request Schemas
//!
//! Each endpoint declares the parameters it requires. A body is accepted
//! only if it is a JSON object holding every required parameter with a
//! non-null value; then each parameter is parsed into its domain type.

use super::error::ApiError;
use pp_01_signing_engine::EcdsaSignature;
use serde_json::{Map, Value};
use shared_types::{Address, ChainId};

/// Typed request for one endpoint.
pub trait EndpointRequest: Sized {
    /// Parameters that must be present, in the order they are reported.
    const REQUIRED: &'static [&'static str];

    fn parse(params: &Params) -> Result<Self, ApiError>;
}

/// Raw JSON parameters of a request body.
#[derive(Debug, Clone, Default)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        match serde_json::from_slice(body) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            _ => Err(ApiError::bad_request("Invalid JSON body")),
        }
    }

    /// Fail with the first missing (or null) parameter.
    pub fn require(&self, required: &[&str]) -> Result<(), ApiError> {
        match required.iter().find(|name| self.get(name).is_none()) {
            Some(name) => Err(ApiError::missing_parameter(name)),
            None => Ok(()),
        }
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    fn value(&self, name: &str) -> Result<&Value, ApiError> {
        self.get(name).ok_or_else(|| ApiError::missing_parameter(name))
    }

    fn str(&self, name: &str) -> Result<&str, ApiError> {
        self.value(name)?
            .as_str()
            .ok_or_else(|| ApiError::invalid_parameter(name))
    }

    pub fn address(&self, name: &str) -> Result<Address, ApiError> {
        self.str(name)?
            .parse()
            .map_err(|_| ApiError::invalid_parameter(name))
    }

    /// 65-byte `r‖s‖v` hex signature.
    pub fn signature(&self, name: &str) -> Result<EcdsaSignature, ApiError> {
        self.str(name)?
            .parse()
            .map_err(|_| ApiError::bad_request("Invalid signature provided"))
    }

    /// Block number as a JSON number or a decimal/hex string.
    pub fn block(&self, name: &str) -> Result<u64, ApiError> {
        let invalid = || ApiError::invalid_parameter(name);
        match self.value(name)? {
            Value::Number(n) => n.as_u64().ok_or_else(invalid),
            Value::String(s) => parse_u64(s).ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }

    /// `chainId` as a JSON number or a decimal/hex string.
    pub fn chain_id(&self) -> Result<ChainId, ApiError> {
        match self.value("chainId")? {
            Value::Number(n) => n.as_u64().map(ChainId),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
        .ok_or_else(ApiError::invalid_chain)
    }
}

fn parse_u64(s: &str) -> Option<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

// =============================================================================
// PER-ENDPOINT SCHEMAS
// =============================================================================

/// `/verify`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRequest {
    pub account: Address,
    /// Personal-message signature over the decimal fee-payment block.
    pub signature: EcdsaSignature,
    pub chain_id: ChainId,
}

impl EndpointRequest for VerifyRequest {
    const REQUIRED: &'static [&'static str] = &["account", "signature", "chainId"];

    fn parse(params: &Params) -> Result<Self, ApiError> {
        Ok(Self {
            account: params.address("account")?,
            signature: params.signature("signature")?,
            chain_id: params.chain_id()?,
        })
    }
}

/// `/account-status`, `/get-account-details`, `/has-redacted`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRequest {
    pub account: Address,
    pub chain_id: ChainId,
}

impl EndpointRequest for AccountRequest {
    const REQUIRED: &'static [&'static str] = &["account", "chainId"];

    fn parse(params: &Params) -> Result<Self, ApiError> {
        Ok(Self {
            account: params.address("account")?,
            chain_id: params.chain_id()?,
        })
    }
}

/// `/check-verification-status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStatusRequest {
    pub account: Address,
    pub fee_paid_block: u64,
    pub chain_id: ChainId,
}

impl EndpointRequest for BlockStatusRequest {
    const REQUIRED: &'static [&'static str] = &["account", "feePaidBlock", "chainId"];

    fn parse(params: &Params) -> Result<Self, ApiError> {
        Ok(Self {
            account: params.address("account")?,
            fee_paid_block: params.block("feePaidBlock")?,
            chain_id: params.chain_id()?,
        })
    }
}

/// `/fetch-personal-data`, `/redact-personal-data`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Personal-message signature over the endpoint's fixed challenge.
    pub signature: EcdsaSignature,
    pub chain_id: ChainId,
}

impl EndpointRequest for SignedRequest {
    const REQUIRED: &'static [&'static str] = &["signature", "chainId"];

    fn parse(params: &Params) -> Result<Self, ApiError> {
        Ok(Self {
            signature: params.signature("signature")?,
            chain_id: params.chain_id()?,
        })
    }
}

/// `/verification-limit`, `/dev-contracts`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRequest {
    pub chain_id: ChainId,
}

impl EndpointRequest for ChainRequest {
    const REQUIRED: &'static [&'static str] = &["chainId"];

    fn parse(params: &Params) -> Result<Self, ApiError> {
        Ok(Self {
            chain_id: params.chain_id()?,
        })
    }
}
