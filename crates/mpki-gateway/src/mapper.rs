//! Translation between provider vocabularies and caller-facing enumerations.

use mpki_core::{CertificateStatus, MpkiError, Result, RevokeReason};

/// Map a provider certificate status. Unknown values map to `Failed`.
#[must_use]
pub fn map_status(provider_status: &str) -> CertificateStatus {
    match provider_status {
        "VALID" => CertificateStatus::Generated,
        "Initial" | "PENDING" => CertificateStatus::InProcess,
        "REVOKED" => CertificateStatus::Revoked,
        _ => CertificateStatus::Failed,
    }
}

/// Map a caller revocation reason code to the provider's reason string
pub fn revoke_reason_to_provider(code: u32) -> Result<&'static str> {
    RevokeReason::ALL
        .iter()
        .find(|r| r.code() == code)
        .map(|r| r.provider_code())
        .ok_or_else(|| MpkiError::UnsupportedRevokeReason(code.to_string()))
}

/// Map a provider reason string back to the caller revocation reason code
pub fn revoke_reason_from_provider(provider_code: &str) -> Result<u32> {
    RevokeReason::ALL
        .iter()
        .find(|r| r.provider_code() == provider_code)
        .map(|r| r.code())
        .ok_or_else(|| MpkiError::UnsupportedRevokeReason(provider_code.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_total() {
        assert_eq!(map_status("VALID"), CertificateStatus::Generated);
        assert_eq!(map_status("Initial"), CertificateStatus::InProcess);
        assert_eq!(map_status("PENDING"), CertificateStatus::InProcess);
        assert_eq!(map_status("REVOKED"), CertificateStatus::Revoked);
        for other in ["", "valid", "EXPIRED", "SUSPENDED", "whatever"] {
            assert_eq!(map_status(other), CertificateStatus::Failed, "{other}");
        }
    }

    #[test]
    fn reason_mapping_round_trips_over_supported_set() {
        for reason in RevokeReason::ALL {
            let provider = revoke_reason_to_provider(reason.code()).unwrap();
            assert_eq!(revoke_reason_from_provider(provider).unwrap(), reason.code());
        }
        assert_eq!(revoke_reason_to_provider(1).unwrap(), "key_compromise");
        assert_eq!(revoke_reason_to_provider(5).unwrap(), "cessation_of_operation");
    }

    #[test]
    fn unsupported_reasons_are_rejected_both_ways() {
        for code in [0, 2, 6, 9] {
            assert!(matches!(
                revoke_reason_to_provider(code),
                Err(MpkiError::UnsupportedRevokeReason(_))
            ));
        }
        for provider in ["ca_compromise", "unspecified", "KEY_COMPROMISE", ""] {
            assert!(matches!(
                revoke_reason_from_provider(provider),
                Err(MpkiError::UnsupportedRevokeReason(_))
            ));
        }
    }
}
