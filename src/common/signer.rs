use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::common::verify::{address_from_key, hash_personal_message};

/// Default location of the wallet key written by `keygen`
pub const KEY_FILE: &str = "wallet_key.hex";

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("failed to read key file: {0}")]
    Io(#[from] std::io::Error),

    #[error("private key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid secp256k1 private key")]
    InvalidKey,

    #[error("signing failed: {0}")]
    Signing(#[from] k256::ecdsa::Error),
}

/// Generate a fresh random wallet key
pub fn generate_signing_key() -> SigningKey {
    SigningKey::random(&mut OsRng)
}

/// Parse a hex private key, with or without `0x`
pub fn signing_key_from_hex(hex_key: &str) -> Result<SigningKey, SignerError> {
    let hex_key = hex_key.trim();
    let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
    let bytes = hex::decode(hex_key)?;
    SigningKey::from_slice(&bytes).map_err(|_| SignerError::InvalidKey)
}

pub fn signing_key_to_hex(key: &SigningKey) -> String {
    format!("0x{}", hex::encode(key.to_bytes()))
}

/// Loads the wallet key from `WALLET_PRIVATE_KEY` or the given file
pub fn load_signing_key(path: &Path) -> Result<SigningKey, SignerError> {
    let hex_key = match env::var("WALLET_PRIVATE_KEY") {
        Ok(key) => key,
        Err(_) => fs::read_to_string(path)?,
    };

    signing_key_from_hex(&hex_key)
}

/// Checksummed address of a wallet key
pub fn address_of(key: &SigningKey) -> String {
    address_from_key(key.verifying_key())
}

/// Sign `message` the way `personal_sign` does.
///
/// Returns `0x` + 130 hex chars with `v` in {27, 28}.
pub fn sign_message(key: &SigningKey, message: &str) -> Result<String, SignerError> {
    let digest = hash_personal_message(message);
    let (signature, recovery_id) = key.sign_prehash_recoverable(&digest)?;

    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(27 + recovery_id.to_byte());

    Ok(format!("0x{}", hex::encode(bytes)))
}
