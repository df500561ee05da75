use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, MpkiError>;

/// Errors that can occur while translating or submitting certificate operations
#[derive(Error, Debug)]
pub enum MpkiError {
    /// The certification request could not be decoded
    #[error("malformed certificate request: {0}")]
    MalformedRequest(String),

    /// A template token survived every substitution pass
    #[error("unresolved template placeholder: {token}")]
    UnresolvedPlaceholder {
        /// The offending token as it appears in the template
        token: String,
    },

    /// Supplied SAN values are incompatible with the request's common name
    #[error("SAN mismatch: {0}")]
    SanMismatch(String),

    /// The CSR carries more organizational units than the profile has slots for
    #[error("organizational unit chain has {segments} segments but the profile exposes {slots} slots")]
    OuOverflow {
        /// Number of OU segments in the CSR
        segments: usize,
        /// Number of OU attribute slots registered for the profile
        slots: usize,
    },

    /// Revocation reason outside the supported set
    #[error("unsupported revocation reason: {0}")]
    UnsupportedRevokeReason(String),

    /// The profile exposes no attribute id for a required attribute type
    #[error("profile {profile} has no attribute of type {attribute_type}")]
    UnknownProfileAttribute {
        /// Profile identifier
        profile: String,
        /// Semantic attribute type that was looked up
        attribute_type: String,
    },

    /// No template is registered for the product
    #[error("no enrollment template registered for product {product}")]
    TemplateNotFound {
        /// Product (profile) identifier
        product: String,
    },

    /// Substituted template is not a valid request document
    #[error("template error: {0}")]
    Template(String),

    /// Only full synchronization is supported
    #[error("partial synchronization is not supported")]
    PartialSyncUnsupported,

    /// The synchronization consumer went away
    #[error("synchronization consumer closed the record buffer")]
    SinkClosed,

    /// Authentication failed - invalid or missing API key
    #[error("authentication failed: invalid API key")]
    Unauthorized,

    /// Resource not found
    #[error("resource not found: {resource}")]
    NotFound {
        /// Description of the resource that wasn't found
        resource: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimited,

    /// API returned an unexpected error response
    #[error("API error ({code}): {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error body from the API
        message: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection settings failed validation
    #[error("validation errors:\n{}", .0.join("\n"))]
    Validation(Vec<String>),
}

impl MpkiError {
    /// Returns true if the error describes a defect in one enrollment or
    /// renewal request rather than a transport or configuration failure.
    ///
    /// These are reported to the caller as a failed result.
    #[must_use]
    pub const fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedRequest(_)
                | Self::UnresolvedPlaceholder { .. }
                | Self::Template(_)
                | Self::SanMismatch(_)
                | Self::OuOverflow { .. }
                | Self::UnknownProfileAttribute { .. }
        )
    }

    /// Returns true if the error is due to authentication
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns the HTTP status code if this is an API error
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::RateLimited => Some(429),
            Self::NotFound { .. } => Some(404),
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
