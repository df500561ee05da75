//! HTTP client for the managed-PKI provider REST API.
//!
//! This crate provides [`MpkiClient`], which talks to the provider's
//! `/mpki/api/v1` endpoints and implements [`mpki_core::MpkiTransport`] so the
//! gateway engine can drive it.
//!
//! # Example
//!
//! ```rust,ignore
//! use mpki_client::{MpkiClient, RateLimitConfig};
//!
//! let client = MpkiClient::builder("https://pki.example.com", api_key)
//!     .rate_limit(RateLimitConfig::new().requests_per_second(5))
//!     .build()?;
//! let profiles = client.profiles().list().await?;
//! ```

mod client;
mod config;
mod transport;
pub mod api;

pub use api::DEFAULT_PAGE_SIZE;
pub use client::{MpkiClient, MpkiClientBuilder};
pub use config::*;
pub use mpki_core::{MpkiError, Result};
