use super::CertificateStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Caller-supplied product information for an enrollment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrollmentProductInfo {
    /// Product id, which is the provider profile id
    pub product_id: String,

    /// Named parameters substituted into `EnrollmentParam|<name>` tokens
    #[serde(default)]
    pub product_parameters: BTreeMap<String, String>,
}

impl EnrollmentProductInfo {
    /// Create product info with no parameters
    #[must_use]
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            product_parameters: BTreeMap::new(),
        }
    }

    /// Add a product parameter
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.product_parameters.insert(name.into(), value.into());
        self
    }
}

/// Kind of enrollment requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentType {
    /// First issuance
    New,
    /// Renewal of an existing certificate
    Renew,
    /// Renewal or reissue, handled as renewal
    RenewOrReissue,
}

/// Enrollment request body for POST /mpki/api/v1/certificate
///
/// Only the parts the gateway rewrites are typed; every other template
/// field is carried through `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    /// Target profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileRef>,

    /// PEM encoded certification request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csr: Option<String>,

    /// Subject, SAN and OU attributes
    #[serde(default)]
    pub attributes: RequestAttributes,

    /// Template fields the gateway does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Reference to a profile by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRef {
    /// Profile identifier
    pub id: String,
}

/// Attribute block of an enrollment request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestAttributes {
    /// Subject common name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,

    /// Organizational units keyed by provider attribute id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_unit: Option<Vec<AttributeValue>>,

    /// Subject Alternative Names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub san: Option<San>,

    /// Remaining subject attributes from the template
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RequestAttributes {
    /// The common name, treating an empty string as absent
    #[must_use]
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref().filter(|cn| !cn.trim().is_empty())
    }
}

/// SAN section of an enrollment request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct San {
    /// DNS names: one canonical entry plus an optional multi-value entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_name: Vec<AttributeValue>,

    /// User principal names (at most one)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_principal_name: Vec<AttributeValue>,

    /// IP addresses (at most one)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_address: Vec<AttributeValue>,

    /// RFC 822 names (at most one)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rfc822_name: Vec<AttributeValue>,
}

impl San {
    /// Returns true if no SAN entry is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dns_name.is_empty()
            && self.user_principal_name.is_empty()
            && self.ip_address.is_empty()
            && self.rfc822_name.is_empty()
    }
}

/// A value bound to a provider attribute id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    /// Provider attribute id
    pub id: String,

    /// Attribute value
    pub value: String,
}

impl AttributeValue {
    /// Create an attribute value
    #[must_use]
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// Single error entry returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    /// Provider error code
    #[serde(default)]
    pub code: Option<String>,

    /// Human readable message
    #[serde(default)]
    pub message: Option<String>,

    /// Request field the error refers to
    #[serde(default)]
    pub field: Option<String>,
}

/// Error list carried by HTTP 400 responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorList {
    /// Individual errors
    #[serde(default)]
    pub errors: Vec<ProviderError>,
}

impl ErrorList {
    /// Flatten every error into one human readable message, one line each
    #[must_use]
    pub fn flatten(&self) -> String {
        if self.errors.is_empty() {
            return "provider rejected the request without error details".to_string();
        }

        self.errors
            .iter()
            .map(|e| {
                format!(
                    "Code: {}, Message: {}, Field: {}",
                    e.code.as_deref().unwrap_or_default(),
                    e.message.as_deref().unwrap_or_default(),
                    e.field.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Success body of an enrollment or renewal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentSuccess {
    /// Provider-assigned serial number
    pub serial_number: String,

    /// Issued certificate, when returned inline
    #[serde(default)]
    pub certificate: Option<String>,
}

/// Provider answer to an enrollment or renewal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    /// Request accepted
    Accepted(EnrollmentSuccess),
    /// Request rejected with structured errors
    Rejected(ErrorList),
}

/// Caller-facing result of an enrollment or renewal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentResult {
    /// Resulting certificate status
    pub status: CertificateStatus,

    /// Provider request id (the serial number) on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Issued certificate, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,

    /// Status message for the caller
    pub message: String,
}

impl EnrollmentResult {
    /// A failed result carrying the given message
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: CertificateStatus::Failed,
            request_id: None,
            certificate: None,
            message: message.into(),
        }
    }

    /// Returns true if the enrollment failed
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == CertificateStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_joins_each_error_on_its_own_line() {
        let errors: ErrorList = serde_json::from_str(
            r#"{"errors": [
                {"code": "entity_invalid", "message": "CN is required", "field": "common_name"},
                {"code": "seat_invalid", "message": "Unknown seat"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            errors.flatten(),
            "Code: entity_invalid, Message: CN is required, Field: common_name\n\
             Code: seat_invalid, Message: Unknown seat, Field: "
        );
    }

    #[test]
    fn request_keeps_unknown_template_fields() {
        let json = r#"{
            "profile": {"id": "p1"},
            "seat": {"seat_id": "ops"},
            "validity": {"unit": "years", "duration": 2},
            "attributes": {"common_name": "a.com", "country": "US"}
        }"#;
        let request: EnrollmentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.attributes.common_name(), Some("a.com"));
        assert_eq!(request.attributes.extra["country"], "US");
        assert_eq!(request.extra["validity"]["duration"], 2);

        let back = serde_json::to_value(&request).unwrap();
        assert_eq!(back["seat"]["seat_id"], "ops");
        assert!(back["attributes"].get("san").is_none());
    }

    #[test]
    fn blank_common_name_is_absent() {
        let attrs = RequestAttributes {
            common_name: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(attrs.common_name(), None);
    }
}
