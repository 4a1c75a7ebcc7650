use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of a verify-signature call.
///
/// Both fields are optional at the wire level so a missing field is reported
/// by validation instead of by the JSON extractor.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VerificationRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl VerificationRequest {
    pub fn new(message: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            signature: Some(signature.into()),
        }
    }
}

/// Outcome of a verification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    pub signer: Option<String>,
    pub original_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationResult {
    pub fn valid(message: &str, signer: String) -> Self {
        Self {
            is_valid: true,
            signer: Some(signer),
            original_message: message.to_string(),
            error: None,
        }
    }

    pub fn invalid(message: &str, reason: &str) -> Self {
        Self {
            is_valid: false,
            signer: None,
            original_message: message.to_string(),
            error: Some(reason.to_string()),
        }
    }
}

/// A verification kept in the server-side per-user history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub id: Uuid,
    pub message: String,
    pub signature: String,
    pub is_valid: bool,
    pub signer: Option<String>,
    pub verified_at: DateTime<Utc>,
}

impl VerificationRecord {
    pub fn from_result(signature: &str, result: &VerificationResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: result.original_message.clone(),
            signature: signature.to_string(),
            is_valid: result.is_valid,
            signer: result.signer.clone(),
            verified_at: Utc::now(),
        }
    }
}

/// A sign + verify round trip as remembered by the wallet client
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessageHistoryEntry {
    pub message: String,
    pub signature: String,
    /// Wallet address at signing time
    pub address: String,
    pub timestamp: DateTime<Utc>,
    pub verified: bool,
    pub signer: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_wire_format() {
        let result = VerificationResult::invalid("hi", "Invalid signature or message");
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(
            value,
            json!({
                "isValid": false,
                "signer": null,
                "originalMessage": "hi",
                "error": "Invalid signature or message"
            })
        );
    }

    #[test]
    fn test_valid_result_omits_error() {
        let result = VerificationResult::valid("hi", "0xabc".to_string());
        let value = serde_json::to_value(&result).unwrap();

        assert!(value.get("error").is_none());
        assert_eq!(value["isValid"], true);
    }

    #[test]
    fn test_request_missing_fields() {
        let request: VerificationRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();

        assert_eq!(request.message.as_deref(), Some("hi"));
        assert!(request.signature.is_none());
    }
}
