use thiserror::Error;

use crate::common::types::VerificationRequest;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message is required")]
    MissingMessage,

    #[error("message must not be empty")]
    EmptyMessage,

    #[error("signature is required")]
    MissingSignature,

    #[error("signature must not be empty")]
    EmptySignature,

    #[error("signature must be a hex string starting with 0x")]
    MissingHexPrefix,
}

/// A request that passed boundary checks and may be handed to the verifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub message: String,
    pub signature: String,
}

/// Boundary checks for a verify-signature body.
///
/// Only structural problems are rejected here; bad hex, wrong length and
/// unrecoverable signatures are left to the verifier.
pub fn validate_request(request: VerificationRequest) -> Result<ValidatedRequest, ValidationError> {
    let message = request.message.ok_or(ValidationError::MissingMessage)?;
    if message.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }

    let signature = request.signature.ok_or(ValidationError::MissingSignature)?;
    if signature.is_empty() {
        return Err(ValidationError::EmptySignature);
    }
    if !(signature.starts_with("0x") || signature.starts_with("0X")) {
        return Err(ValidationError::MissingHexPrefix);
    }

    Ok(ValidatedRequest { message, signature })
}
