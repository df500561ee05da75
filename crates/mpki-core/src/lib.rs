//! Core types and traits for the managed-PKI gateway.
//!
//! This crate provides the foundational types shared by the client and the
//! gateway engine:
//!
//! - **Types**: Strongly-typed provider profiles, enrollment requests,
//!   certificate records and the caller-facing status enumerations
//! - **Errors**: The gateway error taxonomy, [`MpkiError`]
//! - **Transport**: The [`MpkiTransport`] trait implemented by the REST client
//!
//! # Example
//!
//! ```rust,ignore
//! use mpki_core::{CertificateProfile, Result};
//!
//! fn dns_slots(profile: &CertificateProfile) -> Result<usize> {
//!     Ok(profile
//!         .san_attributes()
//!         .iter()
//!         .filter(|a| a.attribute_type == "dns_name")
//!         .count())
//! }
//! ```

mod error;
mod transport;
pub mod types;

pub use error::{MpkiError, Result};
pub use transport::MpkiTransport;
pub use types::*;
