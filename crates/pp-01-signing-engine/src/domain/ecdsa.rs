//! # ECDSA Signing and Recovery (secp256k1)
//!
//! Pure domain logic for Ethereum-style signatures.
//!
//! ## Security Notes
//!
//! - **Deterministic Nonces**: k256 signs with RFC 6979, so the same key and
//!   hash always produce the same signature
//! - **Malleability Prevention (EIP-2)**: emitted signatures are normalized to
//!   low S with the recovery id flipped to match
//! - **Recovery Tolerance**: wallet signatures are accepted with `v` in
//!   {0, 1, 27, 28} and with either S half, since `ecrecover` accepts both

use super::entities::EcdsaSignature;
use super::errors::SignatureError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use shared_types::{Address, Hash};
use zeroize::Zeroize;

/// Prefix of an EIP-191 `personal_sign` message.
const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

// =============================================================================
// HASHING
// =============================================================================

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// EIP-191 personal message hash:
/// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`.
pub fn personal_message_hash(message: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Derive Ethereum address from public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);
    let pubkey_slice = pubkey_bytes.as_bytes();

    // Keccak256 hash of public key (without 0x04 prefix)
    let hash = keccak256(&pubkey_slice[1..]);

    // Take last 20 bytes as address
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Address::new(address)
}

// =============================================================================
// SIGNING
// =============================================================================

/// Sign a 32-byte prehash, returning a low-S signature with `v` in {27, 28}.
pub fn sign_prehash(key: &SigningKey, message_hash: &Hash) -> Result<EcdsaSignature, SignatureError> {
    let (sig, recid) = key
        .sign_prehash_recoverable(message_hash)
        .map_err(|_| SignatureError::SigningFailed)?;

    // Normalize S to low value (EIP-2); the recovery id flips with it
    let (sig, recid) = match sig.normalize_s() {
        Some(normalized) => (normalized, flip_parity(recid)),
        None => (sig, recid),
    };

    let sig_bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&sig_bytes[..32]);
    s.copy_from_slice(&sig_bytes[32..]);

    Ok(EcdsaSignature {
        r,
        s,
        v: recid.to_byte() + 27,
    })
}

/// Sign `message` the way a wallet's `personal_sign` does.
pub fn sign_personal_message(
    key: &SigningKey,
    message: &[u8],
) -> Result<EcdsaSignature, SignatureError> {
    sign_prehash(key, &personal_message_hash(message))
}

// =============================================================================
// RECOVERY
// =============================================================================

/// Recover the signer's Ethereum address from a signature over a prehash.
pub fn recover_address(
    message_hash: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let parsed = Signature::from_slice(&sig_bytes);
    sig_bytes.zeroize();
    let sig = parsed.map_err(|_| SignatureError::InvalidFormat)?;

    // (r, s, id) and (r, n - s, !id) name the same key
    let (sig, recovery_id) = match sig.normalize_s() {
        Some(normalized) => (normalized, flip_parity(recovery_id)),
        None => (sig, recovery_id),
    };

    let recovered_key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered_key))
}

/// Recover the signer of an EIP-191 personal message.
pub fn recover_personal_signer(
    message: &[u8],
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    recover_address(&personal_message_hash(message), signature)
}

/// Parse recovery ID from v value.
///
/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };

    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}

fn flip_parity(recid: RecoveryId) -> RecoveryId {
    RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced())
}

// =============================================================================
// TEST HELPERS
// =============================================================================


// =============================================================================
// UNIT TESTS
// =============================================================================
