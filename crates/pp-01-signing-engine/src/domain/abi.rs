//! # Solidity ABI Encoding
//!
//! Minimal `abi.encode` for the handful of types the attestations use.
//! Static values occupy one 32-byte word in the head; dynamic values
//! (strings) store an offset in the head and their length-prefixed,
//! zero-padded bytes in the tail.

use primitive_types::U256;
use shared_types::{Address, Hash};

const WORD: usize = 32;

/// A single ABI value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiToken {
    /// `address`, left-padded to 32 bytes.
    Address(Address),
    /// `uint256`, big-endian.
    Uint(U256),
    /// `bytes32`, verbatim.
    FixedBytes(Hash),
    /// `string`, dynamic.
    String(String),
}

impl AbiToken {
    fn is_dynamic(&self) -> bool {
        matches!(self, AbiToken::String(_))
    }
}

/// Encode a tuple of tokens exactly like `abi.encode(...)`.
pub fn encode(tokens: &[AbiToken]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&uint_word(U256::from(head_len + tail.len())));
            encode_dynamic(token, &mut tail);
        } else {
            head.extend_from_slice(&static_word(token));
        }
    }

    head.extend_from_slice(&tail);
    head
}

fn static_word(token: &AbiToken) -> [u8; WORD] {
    match token {
        AbiToken::Address(address) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(address.as_bytes());
            word
        }
        AbiToken::Uint(value) => uint_word(*value),
        AbiToken::FixedBytes(bytes) => *bytes,
        // Dynamic tokens never reach the static path.
        AbiToken::String(_) => [0u8; WORD],
    }
}

fn encode_dynamic(token: &AbiToken, tail: &mut Vec<u8>) {
    if let AbiToken::String(value) = token {
        let bytes = value.as_bytes();
        tail.extend_from_slice(&uint_word(U256::from(bytes.len())));
        tail.extend_from_slice(bytes);
        let padding = (WORD - bytes.len() % WORD) % WORD;
        tail.extend(std::iter::repeat(0u8).take(padding));
    }
}

fn uint_word(value: U256) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    word
}
