//! Verification of Ethereum `personal_sign` signatures behind a small HTTP API.

pub mod api;
pub mod auth;
pub mod common;
pub mod config;
pub mod store;
pub mod telemetry;
pub mod test_utils;
