//! Certification request parsing.
//!
//! Decodes a PKCS#10 request (PEM-armored or bare base64) into the ordered
//! subject attributes the template engine substitutes and the
//! organizational-unit chain the request builder distributes over profile
//! slots.

use mpki_core::{MpkiError, Result};
use tracing::debug;
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::objects::{oid2abbrev, oid_registry};
use x509_parser::prelude::FromDer;

/// PEM tags accepted for certification requests
const CSR_TAGS: [&str; 2] = ["CERTIFICATE REQUEST", "NEW CERTIFICATE REQUEST"];

/// Line width of base64 bodies in PEM documents
const PEM_LINE_WIDTH: usize = 64;

/// Names that differ from the registry abbreviation, keyed by dotted OID.
/// PKCS#9 emailAddress is written `E` in subject strings.
const NAME_OVERRIDES: [(&str, &str); 1] = [("1.2.840.113549.1.9.1", "E")];

/// One subject attribute, named by its conventional short form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAttribute {
    /// Short name (`CN`, `O`, `OU`, `E`, ...) or dotted OID when unknown
    pub name: String,
    /// Attribute value
    pub value: String,
}

/// A decoded certification request
#[derive(Debug, Clone)]
pub struct ParsedCsr {
    subject: Vec<SubjectAttribute>,
    ou_chain: Vec<String>,
    raw: String,
}

impl ParsedCsr {
    /// Parse a certification request.
    ///
    /// A request with an empty subject is accepted; its identity comes from
    /// the SAN data supplied alongside it.
    pub fn parse(text: &str) -> Result<Self> {
        let der = decode_pem(text)?;
        let (_, request) = X509CertificationRequest::from_der(&der)
            .map_err(|e| MpkiError::MalformedRequest(format!("invalid PKCS#10 structure: {e}")))?;

        let mut subject = Vec::new();
        for attr in request.certification_request_info.subject.iter_attributes() {
            let oid = attr.attr_type();
            let dotted = oid.to_id_string();
            let name = match NAME_OVERRIDES.iter().find(|(id, _)| *id == dotted) {
                Some((_, short)) => (*short).to_string(),
                None => oid2abbrev(oid, oid_registry()).map_or(dotted, ToString::to_string),
            };
            let value = attr.as_str().map_err(|e| {
                MpkiError::MalformedRequest(format!("subject attribute {name} is not a string: {e}"))
            })?;
            subject.push(SubjectAttribute {
                name,
                value: value.to_string(),
            });
        }

        let ou_chain = subject
            .iter()
            .filter(|a| a.name == "OU")
            .flat_map(|a| a.value.split('/'))
            .filter(|segment| !segment.is_empty())
            .map(ToString::to_string)
            .collect();

        debug!(attributes = subject.len(), "parsed certificate request");

        Ok(Self {
            subject,
            ou_chain,
            raw: text.to_string(),
        })
    }

    /// Subject attributes in encoding order
    #[must_use]
    pub fn subject(&self) -> &[SubjectAttribute] {
        &self.subject
    }

    /// Returns true if the subject carries at least one attribute
    #[must_use]
    pub fn has_subject(&self) -> bool {
        !self.subject.is_empty()
    }

    /// First value for the attribute `name` (exact, case-sensitive)
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.subject
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Subject common name
    #[must_use]
    pub fn common_name(&self) -> Option<&str> {
        self.get("CN")
    }

    /// Organizational-unit segments, split on `/`, in order
    #[must_use]
    pub fn ou_chain(&self) -> &[String] {
        &self.ou_chain
    }

    /// The request text exactly as supplied
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Wrap a base64 body at 64 columns.
#[must_use]
pub fn pemify(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH);
    for (i, c) in body.chars().enumerate() {
        if i > 0 && i % PEM_LINE_WIDTH == 0 {
            out.push('\n');
        }
        out.push(c);
    }
    out
}

fn decode_pem(text: &str) -> Result<Vec<u8>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MpkiError::MalformedRequest("empty certificate request".into()));
    }

    let armored = if trimmed.starts_with("-----BEGIN") {
        trimmed.to_string()
    } else {
        let body: String = trimmed.split_whitespace().collect();
        format!(
            "-----BEGIN CERTIFICATE REQUEST-----\n{}\n-----END CERTIFICATE REQUEST-----\n",
            pemify(&body)
        )
    };

    let doc = pem::parse(armored.as_bytes())
        .map_err(|e| MpkiError::MalformedRequest(format!("invalid PEM: {e}")))?;
    if !CSR_TAGS.iter().any(|tag| *tag == doc.tag()) {
        return Err(MpkiError::MalformedRequest(format!(
            "expected a certificate request, found {}",
            doc.tag()
        )));
    }

    Ok(doc.into_contents())
}
