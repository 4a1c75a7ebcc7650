use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use k256::ecdsa::SigningKey;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::auth::Claims;
use crate::common::signer::{address_of, generate_signing_key, sign_message};

/// A fresh wallet key
pub fn test_signing_key() -> SigningKey {
    generate_signing_key()
}

/// Signs `message` with a fresh key; returns (message, signature, address)
pub fn create_signed_message(message: &str) -> (String, String, String) {
    let key = test_signing_key();
    let signature = sign_message(&key, message).expect("signing with a valid key");

    (message.to_string(), signature, address_of(&key))
}

/// Stand-in identity provider: one RSA key published under one `kid`
#[derive(Clone)]
pub struct TestIdentityProvider {
    pub kid: String,
    encoding_key: EncodingKey,
    modulus: String,
    exponent: String,
}

impl TestIdentityProvider {
    fn generate(kid: &str) -> Self {
        let mut rng = rand::rngs::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("RSA key generation");
        let pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("PEM encoding");

        Self {
            kid: kid.to_string(),
            encoding_key: EncodingKey::from_rsa_pem(pem.as_bytes()).expect("RSA PEM"),
            modulus: BASE64_URL.encode(private_key.n().to_bytes_be()),
            exponent: BASE64_URL.encode(private_key.e().to_bytes_be()),
        }
    }

    /// Same key material published under another `kid`
    pub fn rotated(&self, kid: &str) -> Self {
        Self {
            kid: kid.to_string(),
            ..self.clone()
        }
    }

    /// The JWKS document an identity provider would serve
    pub fn jwks(&self) -> Value {
        json!({
            "keys": [{
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": self.kid,
                "n": self.modulus,
                "e": self.exponent,
            }]
        })
    }

    fn sign<T: Serialize>(&self, claims: &T) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        encode(&header, claims, &self.encoding_key).expect("JWT encoding")
    }

    /// A token valid for an hour
    pub fn mint(&self, sub: &str, email: Option<&str>) -> String {
        self.sign(&Claims {
            sub: sub.to_string(),
            email: email.map(str::to_string),
            exp: (Utc::now().timestamp() + 3600) as u64,
        })
    }

    /// A token with arbitrary claims; `exp` defaults to an hour from now
    pub fn mint_with(&self, mut claims: Value) -> String {
        if let Some(map) = claims.as_object_mut() {
            map.entry("exp")
                .or_insert_with(|| json!(Utc::now().timestamp() + 3600));
        }
        self.sign(&claims)
    }

    pub fn mint_expired(&self, sub: &str) -> String {
        self.sign(&Claims {
            sub: sub.to_string(),
            email: None,
            exp: (Utc::now().timestamp() - 3600) as u64,
        })
    }
}

/// Shared provider; RSA generation is too slow to repeat per test
pub fn identity_provider() -> &'static TestIdentityProvider {
    static PROVIDER: OnceLock<TestIdentityProvider> = OnceLock::new();
    PROVIDER.get_or_init(|| TestIdentityProvider::generate("test-key-1"))
}
