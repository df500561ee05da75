//! [`MpkiTransport`] implementation backed by the REST API.

use crate::MpkiClient;
use async_trait::async_trait;
use mpki_core::{
    CertificateLookup, CertificateProfile, EnrollmentOutcome, EnrollmentRequest, MpkiTransport,
    Result, RevokeOutcome, RevokeRequest, SyncPage,
};
use tracing::instrument;

#[async_trait]
impl MpkiTransport for MpkiClient {
    #[instrument(skip(self), fields(provider = "mpki"))]
    async fn list_profiles(&self) -> Result<Vec<CertificateProfile>> {
        self.profiles().list().await
    }

    #[instrument(skip(self, request), fields(provider = "mpki"))]
    async fn enroll(&self, request: &EnrollmentRequest) -> Result<EnrollmentOutcome> {
        self.certificates().enroll(request).await
    }

    #[instrument(skip(self, request), fields(provider = "mpki"))]
    async fn renew(&self, serial: &str, request: &EnrollmentRequest) -> Result<EnrollmentOutcome> {
        self.certificates().renew(serial, request).await
    }

    #[instrument(skip(self), fields(provider = "mpki"))]
    async fn revoke(&self, serial: &str, request: &RevokeRequest) -> Result<RevokeOutcome> {
        self.certificates().revoke(serial, request).await
    }

    #[instrument(skip(self), fields(provider = "mpki"))]
    async fn get_certificate(&self, serial: &str) -> Result<CertificateLookup> {
        self.certificates().get(serial).await
    }

    #[instrument(skip(self), fields(provider = "mpki"))]
    async fn search_certificates(
        &self,
        profile_id: &str,
        start_index: u64,
        page_size: u32,
    ) -> Result<SyncPage> {
        self.search()
            .profile(profile_id)
            .start_index(start_index)
            .page_size(page_size)
            .send()
            .await
    }
}
