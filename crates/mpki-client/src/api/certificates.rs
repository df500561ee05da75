//! Certificate lifecycle endpoints.

use crate::MpkiClient;
use mpki_core::{
    CertificateDetails, CertificateLookup, EnrollmentOutcome, EnrollmentRequest,
    EnrollmentSuccess, Result, RevokeOutcome, RevokeRequest,
};

const CERTIFICATE_PATH: [&str; 4] = ["mpki", "api", "v1", "certificate"];

/// Certificate lifecycle endpoints
///
/// A 400 response is the provider refusing the request; it comes back as the
/// `Rejected` variant of each outcome rather than as an error.
pub struct CertificateApi<'a> {
    client: &'a MpkiClient,
}

impl<'a> CertificateApi<'a> {
    pub(crate) const fn new(client: &'a MpkiClient) -> Self {
        Self { client }
    }

    /// Submit a new enrollment
    pub async fn enroll(&self, request: &EnrollmentRequest) -> Result<EnrollmentOutcome> {
        let response = self
            .client
            .post_or_reject::<EnrollmentSuccess, _>(&CERTIFICATE_PATH, request)
            .await?;
        Ok(response.map_or_else(EnrollmentOutcome::Rejected, EnrollmentOutcome::Accepted))
    }

    /// Renew the certificate identified by `serial`
    pub async fn renew(&self, serial: &str, request: &EnrollmentRequest) -> Result<EnrollmentOutcome> {
        let path = certificate_path(&[serial, "renew"]);
        let response = self
            .client
            .post_or_reject::<EnrollmentSuccess, _>(&path, request)
            .await?;
        Ok(response.map_or_else(EnrollmentOutcome::Rejected, EnrollmentOutcome::Accepted))
    }

    /// Revoke the certificate identified by `serial`
    pub async fn revoke(&self, serial: &str, request: &RevokeRequest) -> Result<RevokeOutcome> {
        let path = certificate_path(&[serial, "revoke"]);
        let response = self.client.put_or_reject(&path, request).await?;
        Ok(response.map_or_else(RevokeOutcome::Rejected, RevokeOutcome::Revoked))
    }

    /// Fetch a single certificate
    pub async fn get(&self, serial: &str) -> Result<CertificateLookup> {
        let path = certificate_path(&[serial]);
        let response = self
            .client
            .get_or_reject::<CertificateDetails>(&path)
            .await?;
        Ok(response.map_or_else(CertificateLookup::Rejected, CertificateLookup::Found))
    }
}

/// Certificate endpoint path followed by `rest`; the URL builder encodes each part
fn certificate_path<'s>(rest: &[&'s str]) -> Vec<&'s str> {
    let mut path: Vec<&'s str> = CERTIFICATE_PATH.to_vec();
    path.extend_from_slice(rest);
    path
}
