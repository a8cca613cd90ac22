//! ECDSA key management for the ledger
//!
//! Key pairs, signing and verification on secp256k1. All operations share
//! the library's global context.

use rand::rngs::OsRng;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
use std::fmt;
use thiserror::Error;

use super::hash::sha256;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature encoding")]
    InvalidSignature,
}

/// A secp256k1 signing key and the public key that doubles as its address
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from(SecretKey::new(&mut OsRng))
    }

    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        SecretKey::from_slice(&bytes)
            .map(Self::from)
            .map_err(|_| KeyError::InvalidPrivateKey)
    }

    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Ledger address: hex of the 33-byte compressed public key
    pub fn address(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        sign_message(&self.secret_key, message)
    }
}

impl From<SecretKey> for KeyPair {
    fn from(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(SECP256K1, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Parse an address.
///
/// Only the exact form `KeyPair::address` produces is accepted: lowercase hex
/// of the 33-byte compressed key. Balances are keyed by the address string,
/// so any other spelling of the same key would be a separate account.
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    let public_key = PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
    if hex::encode(public_key.serialize()) != hex_key {
        return Err(KeyError::InvalidPublicKey);
    }
    Ok(public_key)
}

/// Sign the SHA-256 digest of `message`, returning a 64-byte compact signature.
///
/// Fresh nonce data is mixed in, so signing the same message twice yields two
/// different signatures that both verify.
pub fn sign_message(secret_key: &SecretKey, message: &[u8]) -> Vec<u8> {
    let digest = Message::from_digest(sha256(message));
    let noncedata: [u8; 32] = rand::random();
    SECP256K1
        .sign_ecdsa_with_noncedata(&digest, secret_key, &noncedata)
        .serialize_compact()
        .to_vec()
}

/// Verify a compact signature over `message`.
///
/// `Ok(false)` means the signature is well-formed but does not verify.
pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<bool, KeyError> {
    let digest = Message::from_digest(sha256(message));
    let signature = Signature::from_compact(signature).map_err(|_| KeyError::InvalidSignature)?;
    Ok(SECP256K1.verify_ecdsa(&digest, &signature, public_key).is_ok())
}
