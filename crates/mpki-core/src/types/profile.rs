use serde::{Deserialize, Serialize};

/// Certificate profile from /mpki/api/v1/profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateProfile {
    /// Profile identifier (the product id on the caller side)
    pub id: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Profile status (e.g. "Active")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Signature algorithm used for issued certificates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,

    /// Shape of the certificates issued under this profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<ProfileCertificate>,

    /// Key policy, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_attributes: Option<serde_json::Value>,
}

impl CertificateProfile {
    /// Subject attributes declared by the profile, in provider order
    #[must_use]
    pub fn subject_attributes(&self) -> &[ProfileAttribute] {
        self.certificate
            .as_ref()
            .and_then(|c| c.subject.as_ref())
            .map_or(&[], |s| s.attributes.as_slice())
    }

    /// SAN attributes declared by the profile, in provider order
    #[must_use]
    pub fn san_attributes(&self) -> &[ProfileAttribute] {
        self.certificate
            .as_ref()
            .and_then(|c| c.extensions.as_ref())
            .and_then(|e| e.san.as_ref())
            .map_or(&[], |s| s.attributes.as_slice())
    }
}

/// Certificate section of a profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileCertificate {
    /// Subject attribute definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<AttributeSet>,

    /// Validity policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<Validity>,

    /// Extension definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ProfileExtensions>,
}

/// Extension section of a profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileExtensions {
    /// Subject Alternative Name attribute definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub san: Option<AttributeSet>,
}

/// A list of attribute definitions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeSet {
    /// Whether the extension is marked critical (SAN only)
    #[serde(default)]
    pub critical: bool,

    /// Attribute definitions
    #[serde(default)]
    pub attributes: Vec<ProfileAttribute>,
}

/// One attribute definition: semantic type, provider id, mandatory flag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAttribute {
    /// Semantic attribute type (e.g. `dns_name`, `common_name`)
    #[serde(rename = "type", default)]
    pub attribute_type: String,

    /// Provider-specific attribute identifier
    #[serde(default)]
    pub id: String,

    /// Whether the attribute must be present
    #[serde(default)]
    pub mandatory: bool,
}

impl ProfileAttribute {
    /// Create an attribute definition
    #[must_use]
    pub fn new(attribute_type: impl Into<String>, id: impl Into<String>, mandatory: bool) -> Self {
        Self {
            attribute_type: attribute_type.into(),
            id: id.into(),
            mandatory,
        }
    }
}

/// Validity policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Validity {
    /// Unit of `duration` (e.g. "years")
    #[serde(default)]
    pub unit: Option<String>,

    /// Validity length
    #[serde(default)]
    pub duration: Option<u32>,
}
