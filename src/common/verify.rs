//! Recovery of the signer behind an Ethereum `personal_sign` signature.
//!
//! The digest is keccak256 over `"\x19Ethereum Signed Message:\n" + len + message`,
//! the signature is the usual 65 byte `r || s || v` encoding.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::common::types::VerificationResult;

/// The only failure reason ever returned to callers
pub const INVALID_SIGNATURE_MESSAGE: &str = "Invalid signature or message";

/// Byte length of an `r || s || v` signature
pub const SIGNATURE_LENGTH: usize = 65;

const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignatureError {
    #[error("signature is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("signature must be 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("r or s is out of range")]
    InvalidComponents,

    #[error("public key recovery failed")]
    RecoveryFailed,
}

/// Compute Keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash a message the way wallets do for `personal_sign`
pub fn hash_personal_message(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Split a hex signature into its ECDSA part and recovery id.
///
/// Accepts `v` as 27/28 (what wallets emit) or as the raw recovery id 0/1.
pub fn parse_signature(signature: &str) -> Result<(Signature, RecoveryId), SignatureError> {
    let hex_str = signature
        .strip_prefix("0x")
        .or_else(|| signature.strip_prefix("0X"))
        .unwrap_or(signature);

    let bytes = hex::decode(hex_str)?;
    if bytes.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidLength(bytes.len()));
    }

    let v = bytes[64];
    let recovery_byte = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        other => return Err(SignatureError::InvalidRecoveryId(other)),
    };
    let recovery_id =
        RecoveryId::from_byte(recovery_byte).ok_or(SignatureError::InvalidRecoveryId(v))?;

    let sig = Signature::from_slice(&bytes[..64]).map_err(|_| SignatureError::InvalidComponents)?;

    Ok((sig, recovery_id))
}

/// Derive the checksummed address of a public key
pub fn address_from_key(key: &VerifyingKey) -> String {
    // Uncompressed point is 0x04 || x || y; the address hashes x || y only
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    to_checksum_address(&address)
}

/// EIP-55 mixed-case formatting
pub fn to_checksum_address(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Recover the checksummed address that produced `signature` over `message`
pub fn recover_signer(message: &str, signature: &str) -> Result<String, SignatureError> {
    let (sig, recovery_id) = parse_signature(signature)?;
    let digest = hash_personal_message(message);

    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_key(&key))
}

/// Verify a signed message.
///
/// Pure function of its inputs: never panics on bad input, never touches
/// shared state, and always echoes `message` back unchanged.
pub fn verify(message: &str, signature: &str) -> VerificationResult {
    match recover_signer(message, signature) {
        Ok(signer) => VerificationResult::valid(message, signer),
        Err(e) => {
            tracing::debug!(error = %e, "signature recovery failed");
            VerificationResult::invalid(message, INVALID_SIGNATURE_MESSAGE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::signer::sign_message;
    use crate::test_utils;
    use assert_matches::assert_matches;

    #[test]
    fn test_keccak256() {
        let hash = keccak256(b"hello world");

        let expected =
            hex::decode("47173285a8d7341e5e972fc677286384f802f8ef42a5ec5f03bbfa254cb01fad")
                .unwrap();
        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_personal_message_prefix() {
        let message = "Hello, Ethereum!";
        let expected = keccak256(b"\x19Ethereum Signed Message:\n16Hello, Ethereum!");

        assert_eq!(hash_personal_message(message), expected);
    }

    #[test]
    fn test_personal_message_length_counts_bytes() {
        // "é" is two bytes in UTF-8
        let expected = keccak256("\x19Ethereum Signed Message:\n2é".as_bytes());
        assert_eq!(hash_personal_message("é"), expected);
    }

    #[test]
    fn test_checksum_known_vectors() {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let bytes = hex::decode(expected[2..].to_lowercase()).unwrap();
            let mut address = [0u8; 20];
            address.copy_from_slice(&bytes);
            assert_eq!(to_checksum_address(&address), expected);
        }
    }

    #[test]
    fn test_round_trip() {
        let (message, signature, address) = test_utils::create_signed_message("Hello, Web3 World!");

        let result = verify(&message, &signature);

        assert!(result.is_valid);
        assert_eq!(result.signer.as_deref(), Some(address.as_str()));
        assert_eq!(result.original_message, message);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_deterministic() {
        let (message, signature, _) = test_utils::create_signed_message("same input twice");

        assert_eq!(verify(&message, &signature), verify(&message, &signature));
        assert_eq!(verify(&message, "0xdead"), verify(&message, "0xdead"));
    }

    #[test]
    fn test_tampered_message_recovers_other_signer() {
        let (message, signature, address) = test_utils::create_signed_message("pay alice 1 eth");

        let result = verify("pay mallory 1 eth", &signature);

        assert_eq!(result.original_message, "pay mallory 1 eth");
        assert!(!(result.is_valid && result.signer.as_deref() == Some(address.as_str())));
        assert!(verify(&message, &signature).is_valid);
    }

    #[test]
    fn test_raw_recovery_id_accepted() {
        let key = test_utils::test_signing_key();
        let signature = sign_message(&key, "raw v").unwrap();

        // 27/28 -> 0/1
        let mut bytes = hex::decode(&signature[2..]).unwrap();
        bytes[64] -= 27;
        let raw = format!("0x{}", hex::encode(&bytes));

        assert_eq!(
            recover_signer("raw v", &raw).unwrap(),
            recover_signer("raw v", &signature).unwrap()
        );
    }

    #[test]
    fn test_invalid_hex() {
        let result = verify("Hello, Web3 e2e test!", "0xinvalidsignature");

        assert!(!result.is_valid);
        assert!(result.signer.is_none());
        assert_eq!(result.original_message, "Hello, Web3 e2e test!");
        assert_eq!(result.error.as_deref(), Some(INVALID_SIGNATURE_MESSAGE));
        assert_matches!(
            recover_signer("x", "0xinvalidsignature"),
            Err(SignatureError::InvalidHex(_))
        );
    }

    #[test]
    fn test_wrong_length() {
        let short = format!("0x{}", "ab".repeat(64));
        let long = format!("0x{}", "ab".repeat(66));

        assert_matches!(recover_signer("x", &short), Err(SignatureError::InvalidLength(64)));
        assert_matches!(recover_signer("x", &long), Err(SignatureError::InvalidLength(66)));
        assert!(!verify("x", &short).is_valid);
    }

    #[test]
    fn test_invalid_recovery_id() {
        let (message, signature, _) = test_utils::create_signed_message("bad v");
        let mut bytes = hex::decode(&signature[2..]).unwrap();
        bytes[64] = 29;
        let tampered = format!("0x{}", hex::encode(&bytes));

        assert_matches!(
            recover_signer(&message, &tampered),
            Err(SignatureError::InvalidRecoveryId(29))
        );
    }

    #[test]
    fn test_zero_components_rejected() {
        let zero = format!("0x{}1b", "00".repeat(64));

        assert_matches!(recover_signer("x", &zero), Err(SignatureError::InvalidComponents));
        assert_eq!(verify("x", &zero).error.as_deref(), Some(INVALID_SIGNATURE_MESSAGE));
    }

    /// secp256k1 group order, big-endian
    const CURVE_ORDER: [u8; 32] = [
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36,
        0x41, 0x41,
    ];

    fn negate_scalar(s: &[u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let mut diff = CURVE_ORDER[i] as i16 - s[i] as i16 - borrow;
            borrow = if diff < 0 {
                diff += 256;
                1
            } else {
                0
            };
            out[i] = diff as u8;
        }
        out
    }

    #[test]
    fn test_high_s_rejected() {
        let (message, signature, _) = test_utils::create_signed_message("malleable");
        let mut bytes = hex::decode(&signature[2..]).unwrap();

        // (r, n - s) with the other parity is the same curve point, but non-canonical
        let high_s = negate_scalar(&bytes[32..64]);
        bytes[32..64].copy_from_slice(&high_s);
        bytes[64] = if bytes[64] == 27 { 28 } else { 27 };
        let malleated = format!("0x{}", hex::encode(&bytes));

        assert!(recover_signer(&message, &malleated).is_err());
        let result = verify(&message, &malleated);
        assert!(!result.is_valid);
        assert!(result.signer.is_none());
        assert_eq!(result.error.as_deref(), Some(INVALID_SIGNATURE_MESSAGE));
    }

    #[test]
    fn test_uppercase_prefix_accepted() {
        let (message, signature, address) = test_utils::create_signed_message("upper");
        let upper = format!("0X{}", &signature[2..]);

        assert_eq!(verify(&message, &upper).signer.as_deref(), Some(address.as_str()));
    }

    #[test]
    fn test_empty_signature_is_invalid() {
        let result = verify("test", "");

        assert!(!result.is_valid);
        assert_eq!(result.original_message, "test");
    }
}
