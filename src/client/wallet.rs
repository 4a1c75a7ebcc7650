use chrono::Utc;
use clap::{Parser, Subcommand};
use reqwest::Client;
use std::path::PathBuf;
use web3_signature_verifier::common::signer::{address_of, load_signing_key, sign_message, KEY_FILE};
use web3_signature_verifier::common::types::{
    SignedMessageHistoryEntry, VerificationRequest, VerificationResult,
};
use web3_signature_verifier::store::local::{LocalHistoryStore, HISTORY_FILE};

#[derive(Parser)]
#[command(name = "wallet")]
#[command(about = "Sign messages and check them against the verifier service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Hex private key file (WALLET_PRIVATE_KEY takes precedence)
    #[arg(long, default_value = KEY_FILE)]
    key_file: PathBuf,

    /// Local signing history
    #[arg(long, default_value = HISTORY_FILE)]
    history: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign a message and have the service verify it
    Sign {
        #[arg(short, long)]
        message: String,

        /// Verifier service base URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        server: String,

        /// Bearer token for services behind a JWKS guard
        #[arg(long, env = "VERIFIER_TOKEN")]
        token: Option<String>,
    },
    /// Print the wallet address
    Address,
    /// Show past sign/verify round trips
    History,
    /// Forget the local history
    Clear,
}

/// POST a signed message to the verifier.
///
/// Transport failures and non-2xx answers are errors; a signature that does
/// not verify is a normal result.
async fn submit(
    client: &Client,
    server: &str,
    token: Option<&str>,
    message: &str,
    signature: &str,
) -> Result<VerificationResult, Box<dyn std::error::Error>> {
    let url = format!("{}/api/verify-signature", server.trim_end_matches('/'));

    let mut request = client
        .post(&url)
        .json(&VerificationRequest::new(message, signature));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await?;
        return Err(format!("Server returned status {} with body: {}", status, text).into());
    }

    Ok(response.json().await?)
}

/// A round trip only counts as verified when the service recovered our own address
fn history_entry(
    message: &str,
    signature: &str,
    address: &str,
    result: &VerificationResult,
) -> SignedMessageHistoryEntry {
    let verified = result.is_valid
        && result
            .signer
            .as_deref()
            .is_some_and(|signer| signer.eq_ignore_ascii_case(address));

    SignedMessageHistoryEntry {
        message: message.to_string(),
        signature: signature.to_string(),
        address: address.to_string(),
        timestamp: Utc::now(),
        verified,
        signer: result.signer.clone(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let store = LocalHistoryStore::new(&cli.history);

    match cli.command {
        Commands::Sign {
            message,
            server,
            token,
        } => {
            let key = load_signing_key(&cli.key_file)?;
            let address = address_of(&key);
            let signature = sign_message(&key, &message)?;
            println!("Signed as {}", address);
            println!("Signature: {}", signature);

            let client = Client::new();
            let result = match submit(&client, &server, token.as_deref(), &message, &signature).await {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("Could not reach the verifier at {}: {}", server, e);
                    return Err(e);
                }
            };

            let entry = history_entry(&message, &signature, &address, &result);
            if entry.verified {
                println!("Verified: signer {}", address);
            } else {
                println!(
                    "Verification failed: {}",
                    result.error.as_deref().unwrap_or("signer does not match wallet")
                );
            }
            store.append(entry)?;
        }
        Commands::Address => {
            let key = load_signing_key(&cli.key_file)?;
            println!("{}", address_of(&key));
        }
        Commands::History => {
            let entries = store.load()?;
            if entries.is_empty() {
                println!("No signed messages yet");
            }
            for entry in entries {
                let status = if entry.verified { "verified" } else { "failed" };
                println!(
                    "[{}] {:<8} {} {:?}",
                    entry.timestamp.to_rfc3339(),
                    status,
                    entry.address,
                    entry.message
                );
            }
        }
        Commands::Clear => {
            store.clear()?;
            println!("Cleared {}", store.path().display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use web3_signature_verifier::common::verify::INVALID_SIGNATURE_MESSAGE;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_submit_parses_result() -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/verify-signature"))
            .and(header("authorization", "Bearer t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isValid": true,
                "signer": "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf",
                "originalMessage": "hi"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = submit(&Client::new(), &server.uri(), Some("t0ken"), "hi", "0x00").await?;

        assert!(result.is_valid);
        assert_eq!(result.original_message, "hi");
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_reports_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad"))
            .mount(&server)
            .await;

        let result = submit(&Client::new(), &server.uri(), None, "hi", "").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_history_entry_verified_only_for_own_address() {
        let address = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

        let ok = VerificationResult::valid("m", address.to_lowercase());
        assert!(history_entry("m", "0x00", address, &ok).verified);

        let other = VerificationResult::valid("m", "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23".to_string());
        let entry = history_entry("m", "0x00", address, &other);
        assert!(!entry.verified);
        assert!(entry.signer.is_some());

        let failed = VerificationResult::invalid("m", INVALID_SIGNATURE_MESSAGE);
        assert!(!history_entry("m", "0x00", address, &failed).verified);
    }
}
