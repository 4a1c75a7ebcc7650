pub mod signer;
pub mod types;
pub mod validation;
pub mod verify;
