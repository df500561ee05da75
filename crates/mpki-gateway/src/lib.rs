//! Enrollment translation and certificate synchronization for managed-PKI
//! providers.
//!
//! The engine turns generic lifecycle operations into the profile-driven
//! request shapes the provider expects, and normalizes what comes back:
//!
//! - **CSR parsing**: [`ParsedCsr`] extracts subject attributes and the
//!   organizational-unit chain
//! - **Profile index**: [`ProfileAttributeIndex`] resolves semantic attribute
//!   types to provider attribute ids
//! - **Templates**: [`TemplateCatalog`] discovers JSON templates and
//!   [`template::substitute`] fills their placeholders
//! - **Requests**: [`EnrollmentRequestBuilder`] assembles SAN and OU sections
//! - **Mapping**: [`mapper`] translates statuses and revocation reasons
//! - **Sync**: [`SyncPaginator`] streams paged search results into a bounded
//!   channel
//!
//! [`Gateway`] ties these together over any [`MpkiTransport`].
//!
//! # Example
//!
//! ```rust,ignore
//! use mpki_gateway::{Gateway, GatewayConfig, SanMap};
//! use mpki_core::EnrollmentProductInfo;
//!
//! let config = GatewayConfig::load(&path)?;
//! let gateway = Gateway::from_config(&config)?;
//!
//! let mut san = SanMap::new();
//! san.insert("dnsname".into(), vec!["www.example.com".into()]);
//! let product = EnrollmentProductInfo::new(profile_id).param("Seat", "ops");
//!
//! let result = gateway.enroll(&csr_pem, &san, &product).await?;
//! println!("{}", result.message);
//! ```

pub mod builder;
pub mod catalog;
pub mod config;
pub mod csr;
mod gateway;
pub mod index;
pub mod mapper;
pub mod sync;
pub mod template;

pub use builder::{EnrollmentRequestBuilder, SanMap};
pub use catalog::{ParamKind, TemplateCatalog};
pub use config::GatewayConfig;
pub use csr::{pemify, ParsedCsr, SubjectAttribute};
pub use gateway::{Gateway, PRIOR_CERT_SN};
pub use index::{AttributeKey, ProfileAttributeIndex};
pub use sync::{SyncPaginator, SyncSummary, DEFAULT_PAGE_SIZE};

pub use mpki_core::{MpkiError, MpkiTransport, Result};
