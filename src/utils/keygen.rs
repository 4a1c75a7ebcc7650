use std::fs;
use web3_signature_verifier::common::signer::{
    address_of, generate_signing_key, signing_key_to_hex, KEY_FILE,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate a new secp256k1 wallet key
    let key = generate_signing_key();

    // Save the private key to a file
    fs::write(KEY_FILE, signing_key_to_hex(&key))?;
    println!("Private key saved to {}", KEY_FILE);
    println!("Address: {}", address_of(&key));

    Ok(())
}
