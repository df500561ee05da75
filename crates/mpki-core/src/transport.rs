//! The seam between the gateway engine and the provider's API.

use crate::{
    CertificateLookup, CertificateProfile, EnrollmentOutcome, EnrollmentRequest, Result,
    RevokeOutcome, RevokeRequest, SyncPage,
};
use async_trait::async_trait;

/// Operations the gateway needs from the managed-PKI provider
///
/// Provider-side rejections are values ([`EnrollmentOutcome::Rejected`] and
/// friends); `Err` is reserved for transport failures, which are never
/// retried here.
#[async_trait]
pub trait MpkiTransport: Send + Sync {
    /// List every certificate profile visible to the account
    async fn list_profiles(&self) -> Result<Vec<CertificateProfile>>;

    /// Submit a new enrollment
    async fn enroll(&self, request: &EnrollmentRequest) -> Result<EnrollmentOutcome>;

    /// Renew the certificate identified by `serial`
    async fn renew(&self, serial: &str, request: &EnrollmentRequest) -> Result<EnrollmentOutcome>;

    /// Revoke the certificate identified by `serial`
    async fn revoke(&self, serial: &str, request: &RevokeRequest) -> Result<RevokeOutcome>;

    /// Fetch a single certificate
    async fn get_certificate(&self, serial: &str) -> Result<CertificateLookup>;

    /// Fetch one page of certificates issued under `profile_id`
    async fn search_certificates(
        &self,
        profile_id: &str,
        start_index: u64,
        page_size: u32,
    ) -> Result<SyncPage>;
}
