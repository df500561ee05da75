use super::{CertificateStatus, ErrorList, ProfileRef};
use serde::{Deserialize, Serialize};

/// Certificate details from GET /mpki/api/v1/certificate/{serial}
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateDetails {
    /// Serial number
    #[serde(default)]
    pub serial_number: Option<String>,

    /// Provider status (`VALID`, `PENDING`, `REVOKED`, ...)
    #[serde(default)]
    pub status: Option<String>,

    /// Issued certificate (base64 or PEM)
    #[serde(default)]
    pub certificate: Option<String>,
}

/// Provider answer to a certificate lookup
#[derive(Debug, Clone)]
pub enum CertificateLookup {
    /// Certificate found
    Found(CertificateDetails),
    /// Lookup rejected with structured errors
    Rejected(ErrorList),
}

/// Caller-facing view of a single certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Provider request id (serial number)
    pub request_id: String,

    /// Certificate, when the provider returned one
    #[serde(default)]
    pub certificate: Option<String>,

    /// Mapped status
    pub status: CertificateStatus,
}

/// One page of POST /mpki/api/v1/searchcert results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncPage {
    /// Total number of certificates matching the search, across all pages
    #[serde(rename = "count", default)]
    pub total_count: u64,

    /// Whether the provider reports further pages
    #[serde(rename = "more_certs_available", default)]
    pub more_available: bool,

    /// Start index of this page
    #[serde(default)]
    pub index: u64,

    /// Certificates on this page; the provider may emit `null` entries
    #[serde(rename = "certificates", default)]
    pub records: Vec<Option<SearchRecord>>,
}

impl SyncPage {
    /// Returns true if the page carries no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.iter().all(Option::is_none)
    }
}

/// A certificate as returned by the search endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRecord {
    /// Serial number; empty if the provider omitted it
    #[serde(default)]
    pub serial_number: String,

    /// Provider status
    #[serde(default)]
    pub status: Option<String>,

    /// Provider revocation reason, only present on revoked certificates
    #[serde(default)]
    pub revocation_reason: Option<String>,

    /// Base64 DER certificate, exactly as the provider sent it
    #[serde(default)]
    pub certificate: Option<String>,

    /// Profile the certificate was issued under
    #[serde(default)]
    pub profile: Option<ProfileRef>,
}

impl SearchRecord {
    /// Profile id, or an empty string if the provider omitted it
    #[must_use]
    pub fn profile_id(&self) -> &str {
        self.profile.as_ref().map_or("", |p| p.id.as_str())
    }
}

/// Normalized record handed to the synchronization consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// Provider request id (serial number)
    pub request_id: String,

    /// Base64 DER certificate
    pub certificate_base64: String,

    /// Mapped status
    pub status: CertificateStatus,

    /// Product (profile) id
    pub product_id: String,

    /// Caller revocation reason code, if revoked
    #[serde(default)]
    pub revocation_reason: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_page_keeps_null_entries() {
        let json = r#"{
            "count": 2,
            "more_certs_available": false,
            "index": 0,
            "certificates": [
                {"serial_number": "1A", "status": "VALID", "certificate": "AQID", "profile": {"id": "p1"}},
                null
            ]
        }"#;
        let page: SyncPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.records.len(), 2);

        let record = page.records[0].as_ref().unwrap();
        assert_eq!(record.certificate.as_deref(), Some("AQID"));
        assert_eq!(record.profile_id(), "p1");
        assert!(page.records[1].is_none());
    }

    #[test]
    fn malformed_record_does_not_fail_the_page() {
        let json = r#"{
            "count": 2,
            "certificates": [
                {"status": "VALID", "certificate": "AQID"},
                {"serial_number": "2B", "certificate": "-----BEGIN CERTIFICATE-----"}
            ]
        }"#;
        let page: SyncPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.records.len(), 2);
        assert!(page.records[0].as_ref().unwrap().serial_number.is_empty());
        assert_eq!(
            page.records[1].as_ref().unwrap().certificate.as_deref(),
            Some("-----BEGIN CERTIFICATE-----")
        );
    }
}
