use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-facing certificate status
///
/// Discriminants follow the host's end-entity status numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    /// Request accepted, certificate not yet issued
    InProcess,
    /// Certificate issued
    Generated,
    /// Certificate revoked
    Revoked,
    /// Request failed or status unknown
    Failed,
}

impl CertificateStatus {
    /// Numeric status code
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Failed => 11,
            Self::InProcess => 30,
            Self::Generated => 40,
            Self::Revoked => 50,
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProcess => write!(f, "in process"),
            Self::Generated => write!(f, "generated"),
            Self::Revoked => write!(f, "revoked"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Caller-facing revocation reason
///
/// Only four reasons are supported; code 2 (CA compromise) and everything
/// else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevokeReason {
    /// Key compromised (1)
    KeyCompromised,
    /// Affiliation changed (3)
    AffiliationChanged,
    /// Superseded (4)
    Superseded,
    /// Cessation of operation (5)
    CessationOfOperation,
}

impl RevokeReason {
    /// Every supported reason
    pub const ALL: [Self; 4] = [
        Self::KeyCompromised,
        Self::AffiliationChanged,
        Self::Superseded,
        Self::CessationOfOperation,
    ];

    /// Numeric reason code used by the caller
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::KeyCompromised => 1,
            Self::AffiliationChanged => 3,
            Self::Superseded => 4,
            Self::CessationOfOperation => 5,
        }
    }

    /// Reason string used by the provider
    #[must_use]
    pub const fn provider_code(self) -> &'static str {
        match self {
            Self::KeyCompromised => "key_compromise",
            Self::AffiliationChanged => "affiliation_changed",
            Self::Superseded => "superseded",
            Self::CessationOfOperation => "cessation_of_operation",
        }
    }
}

/// Disposition of a revocation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestDisposition {
    /// Request failed
    Failed,
    /// Certificate issued
    Issued,
    /// Certificate revoked
    Revoked,
}

impl RequestDisposition {
    /// Numeric disposition code
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Failed => 1,
            Self::Issued => 3,
            Self::Revoked => 6,
        }
    }
}

/// Body of PUT /mpki/api/v1/certificate/{serial}/revoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeRequest {
    /// Provider reason code
    pub revocation_reason: String,
}

/// Provider answer to a revocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// Certificate revoked; raw response body
    Revoked(String),
    /// Revocation rejected with structured errors
    Rejected(super::ErrorList),
}
