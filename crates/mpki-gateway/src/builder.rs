//! Assembly of a complete enrollment request.

use crate::catalog::TemplateCatalog;
use crate::csr::ParsedCsr;
use crate::index::ProfileAttributeIndex;
use crate::template;
use mpki_core::{
    AttributeValue, EnrollmentProductInfo, EnrollmentRequest, MpkiError, ProfileRef, Result, San,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Caller SAN values keyed by category (`dnsname`, `upn`, `ipaddress`, `rfc822name`)
pub type SanMap = BTreeMap<String, Vec<String>>;

/// Profile attribute type of DNS names
const DNS_NAME: &str = "dns_name";

/// Single-value SAN categories and the profile attribute type each maps to
const SINGLE_VALUE_CATEGORIES: [(&str, &str); 3] = [
    ("upn", "user_principal_name"),
    ("ipaddress", "ip_address"),
    ("rfc822name", "rfc822_name"),
];

/// Builds one [`EnrollmentRequest`] from a template, a CSR and caller SANs.
///
/// Nothing is submitted if any step fails.
pub struct EnrollmentRequestBuilder<'a> {
    catalog: &'a TemplateCatalog,
    index: &'a ProfileAttributeIndex,
    csr: &'a ParsedCsr,
}

impl<'a> EnrollmentRequestBuilder<'a> {
    /// Create a builder over the per-call inputs
    #[must_use]
    pub const fn new(
        catalog: &'a TemplateCatalog,
        index: &'a ProfileAttributeIndex,
        csr: &'a ParsedCsr,
    ) -> Self {
        Self {
            catalog,
            index,
            csr,
        }
    }

    /// Build the request for `product` with the caller's SAN values
    pub fn build(&self, product: &EnrollmentProductInfo, san: &SanMap) -> Result<EnrollmentRequest> {
        let template = self.catalog.template(&product.product_id)?;
        let text = template::substitute(template, &product.product_parameters, self.csr)?;

        let mut request: EnrollmentRequest = serde_json::from_str(&text).map_err(|e| {
            MpkiError::Template(format!(
                "template for {} is not a valid request after substitution: {e}",
                product.product_id
            ))
        })?;

        if request.profile.is_none() {
            request.profile = Some(ProfileRef {
                id: product.product_id.clone(),
            });
        }

        self.apply_san(&mut request, san)?;
        self.apply_organization_units(&mut request)?;

        debug!(product = %product.product_id, "built enrollment request");
        Ok(request)
    }

    fn apply_san(&self, request: &mut EnrollmentRequest, san: &SanMap) -> Result<()> {
        let mut section = request.attributes.san.take().unwrap_or_default();

        for (category, values) in san {
            if values.is_empty() {
                continue;
            }

            if category == "dnsname" {
                self.apply_dns_names(request, &mut section, values)?;
            } else if let Some((_, attribute_type)) =
                SINGLE_VALUE_CATEGORIES.iter().find(|(c, _)| c == category)
            {
                if values.len() > 1 {
                    warn!(category = %category, dropped = values.len() - 1, "provider accepts one value per category, keeping the first");
                }
                let entry = vec![AttributeValue::new(self.require(attribute_type)?, values[0].as_str())];
                match *attribute_type {
                    "user_principal_name" => section.user_principal_name = entry,
                    "ip_address" => section.ip_address = entry,
                    _ => section.rfc822_name = entry,
                }
            } else {
                debug!(category = %category, "ignoring unknown SAN category");
            }
        }

        if !section.is_empty() {
            request.attributes.san = Some(section);
        }
        Ok(())
    }

    fn apply_dns_names(
        &self,
        request: &mut EnrollmentRequest,
        section: &mut San,
        values: &[String],
    ) -> Result<()> {
        let mut names: Vec<&str> = Vec::with_capacity(values.len());
        for value in values {
            if !names.contains(&value.as_str()) {
                names.push(value);
            }
        }

        let common_name = request
            .attributes
            .common_name()
            .or_else(|| self.csr.common_name())
            .filter(|cn| !cn.trim().is_empty())
            .map(ToString::to_string);

        let dns_id = self.require(DNS_NAME)?;

        if let [single] = names.as_slice() {
            match common_name {
                None => request.attributes.common_name = Some((*single).to_string()),
                Some(cn) if cn == *single => {}
                Some(cn) => {
                    return Err(MpkiError::SanMismatch(format!(
                        "DNS name {single} does not match common name {cn}"
                    )))
                }
            }
            section.dns_name = vec![AttributeValue::new(dns_id, *single)];
            return Ok(());
        }

        let Some(cn) = common_name.filter(|cn| names.contains(&cn.as_str())) else {
            return Err(MpkiError::SanMismatch(
                "none of the DNS names matches the common name".into(),
            ));
        };

        let rest = names
            .iter()
            .filter(|name| **name != cn)
            .copied()
            .collect::<Vec<_>>()
            .join(",");
        let multi_id = self.index.multi_id(DNS_NAME).ok_or_else(|| MpkiError::UnknownProfileAttribute {
            profile: self.index.profile_id().to_string(),
            attribute_type: format!("{DNS_NAME}{}", crate::index::MULTI_MARKER),
        })?;

        section.dns_name = vec![
            AttributeValue::new(dns_id, cn),
            AttributeValue::new(multi_id, rest),
        ];
        Ok(())
    }

    fn apply_organization_units(&self, request: &mut EnrollmentRequest) -> Result<()> {
        let chain = self.csr.ou_chain();
        if chain.is_empty() {
            return Ok(());
        }

        let slots = self.index.ou_slots();
        if chain.len() > slots.len() {
            return Err(MpkiError::OuOverflow {
                segments: chain.len(),
                slots: slots.len(),
            });
        }

        request.attributes.organization_unit = Some(
            chain
                .iter()
                .zip(slots)
                .map(|(segment, id)| AttributeValue::new(id.as_str(), segment.as_str()))
                .collect(),
        );
        Ok(())
    }

    fn require(&self, attribute_type: &str) -> Result<&'a str> {
        self.index
            .san_id(attribute_type)
            .ok_or_else(|| MpkiError::UnknownProfileAttribute {
                profile: self.index.profile_id().to_string(),
                attribute_type: attribute_type.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpki_core::{
        AttributeSet, CertificateProfile, ProfileAttribute, ProfileCertificate, ProfileExtensions,
    };
    use tempfile::TempDir;

    const CSR_FULL: &str = include_str!("testdata/csr_full.pem");
    const CSR_THREE_OU: &str = include_str!("testdata/csr_three_ou.pem");
    const CSR_NO_SUBJECT: &str = include_str!("testdata/csr_no_subject.pem");

    const TEMPLATE: &str = r#"{
        "profile": {"id": "p1"},
        "seat": {"seat_id": "EnrollmentParam|Seat"},
        "validity": {"unit": "years", "duration": "Numeric|EnrollmentParam|Years|Numeric"},
        "csr": "CSR|RAW",
        "attributes": {"common_name": "CSR|CN"}
    }"#;

    struct Fixture {
        _dir: TempDir,
        catalog: TemplateCatalog,
        index: ProfileAttributeIndex,
    }

    fn fixture(ou_slots: usize) -> Fixture {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("p1.json"), TEMPLATE).unwrap();
        let catalog = TemplateCatalog::discover(dir.path()).unwrap();

        let mut subject = vec![ProfileAttribute::new("common_name", "cert_cn", true)];
        for i in 1..=ou_slots {
            subject.push(ProfileAttribute::new("organization_unit", format!("cert_ou_{i}"), false));
        }
        let profile = CertificateProfile {
            id: "p1".into(),
            certificate: Some(ProfileCertificate {
                subject: Some(AttributeSet {
                    critical: false,
                    attributes: subject,
                }),
                validity: None,
                extensions: Some(ProfileExtensions {
                    san: Some(AttributeSet {
                        critical: false,
                        attributes: vec![
                            ProfileAttribute::new("dns_name", "custom_encode_dnsName", false),
                            ProfileAttribute::new("dns_name", "custom_encode_dnsName_multi", false),
                            ProfileAttribute::new("user_principal_name", "custom_encode_upn", false),
                            ProfileAttribute::new("ip_address", "custom_encode_ip", false),
                        ],
                    }),
                }),
            }),
            ..Default::default()
        };
        let index = ProfileAttributeIndex::build(&[profile], "p1");

        Fixture {
            _dir: dir,
            catalog,
            index,
        }
    }

    fn product() -> EnrollmentProductInfo {
        EnrollmentProductInfo::new("p1").param("Seat", "ops").param("Years", "1")
    }

    fn dns(values: &[&str]) -> SanMap {
        let mut map = SanMap::new();
        map.insert("dnsname".into(), values.iter().map(ToString::to_string).collect());
        map
    }

    fn build(fx: &Fixture, csr_text: &str, san: &SanMap) -> Result<EnrollmentRequest> {
        let csr = ParsedCsr::parse(csr_text).unwrap();
        EnrollmentRequestBuilder::new(&fx.catalog, &fx.index, &csr).build(&product(), san)
    }

    #[test]
    fn single_dns_matching_common_name() {
        let fx = fixture(2);
        let request = build(&fx, CSR_FULL, &dns(&["a.com"])).unwrap();

        let san = request.attributes.san.unwrap();
        assert_eq!(san.dns_name, vec![AttributeValue::new("custom_encode_dnsName", "a.com")]);
        assert_eq!(request.extra["seat"]["seat_id"], "ops");
        assert_eq!(request.extra["validity"]["duration"], 1);
        assert_eq!(request.csr.as_deref(), Some(CSR_FULL));
    }

    #[test]
    fn multiple_dns_names_split_into_canonical_and_multi() {
        let fx = fixture(2);
        let request = build(&fx, CSR_FULL, &dns(&["b.com", "a.com", "c.com"])).unwrap();

        let san = request.attributes.san.unwrap();
        assert_eq!(
            san.dns_name,
            vec![
                AttributeValue::new("custom_encode_dnsName", "a.com"),
                AttributeValue::new("custom_encode_dnsName_multi", "b.com,c.com"),
            ]
        );
    }

    #[test]
    fn dns_not_matching_common_name_fails() {
        let fx = fixture(2);
        assert!(matches!(
            build(&fx, CSR_FULL, &dns(&["b.com"])),
            Err(MpkiError::SanMismatch(_))
        ));
        assert!(matches!(
            build(&fx, CSR_FULL, &dns(&["b.com", "c.com"])),
            Err(MpkiError::SanMismatch(_))
        ));
    }

    #[test]
    fn empty_subject_takes_common_name_from_dns() {
        let fx = fixture(2);
        let request = build(&fx, CSR_NO_SUBJECT, &dns(&["a.com"])).unwrap();

        assert_eq!(request.attributes.common_name(), Some("a.com"));
        assert!(request.attributes.organization_unit.is_none());
        assert_eq!(request.attributes.san.unwrap().dns_name.len(), 1);
    }

    #[test]
    fn single_value_categories_keep_first() {
        let fx = fixture(2);
        let mut san = dns(&["a.com"]);
        san.insert("upn".into(), vec!["u1@example.com".into(), "u2@example.com".into()]);
        san.insert("ipaddress".into(), vec!["10.0.0.1".into()]);
        san.insert("othername".into(), vec!["ignored".into()]);

        let section = build(&fx, CSR_FULL, &san).unwrap().attributes.san.unwrap();
        assert_eq!(
            section.user_principal_name,
            vec![AttributeValue::new("custom_encode_upn", "u1@example.com")]
        );
        assert_eq!(section.ip_address, vec![AttributeValue::new("custom_encode_ip", "10.0.0.1")]);
        assert!(section.rfc822_name.is_empty());
    }

    #[test]
    fn category_without_profile_attribute_fails() {
        let fx = fixture(2);
        let mut san = SanMap::new();
        san.insert("rfc822name".into(), vec!["ops@example.com".into()]);

        assert!(matches!(
            build(&fx, CSR_FULL, &san),
            Err(MpkiError::UnknownProfileAttribute { attribute_type, .. }) if attribute_type == "rfc822_name"
        ));
    }

    #[test]
    fn organization_units_fill_slots_in_order() {
        let fx = fixture(2);
        let request = build(&fx, CSR_FULL, &SanMap::new()).unwrap();

        assert_eq!(
            request.attributes.organization_unit.unwrap(),
            vec![
                AttributeValue::new("cert_ou_1", "Eng"),
                AttributeValue::new("cert_ou_2", "Security"),
            ]
        );
        assert!(request.attributes.san.is_none());
    }

    #[test]
    fn organization_unit_overflow_fails() {
        let fx = fixture(2);
        assert!(matches!(
            build(&fx, CSR_THREE_OU, &SanMap::new()),
            Err(MpkiError::OuOverflow { segments: 3, slots: 2 })
        ));
    }

    #[test]
    fn unknown_product_has_no_template() {
        let fx = fixture(2);
        let csr = ParsedCsr::parse(CSR_FULL).unwrap();
        let result = EnrollmentRequestBuilder::new(&fx.catalog, &fx.index, &csr)
            .build(&EnrollmentProductInfo::new("p9"), &SanMap::new());
        assert!(matches!(result, Err(MpkiError::TemplateNotFound { .. })));
    }

    #[test]
    fn missing_parameter_is_unresolved() {
        let fx = fixture(2);
        let csr = ParsedCsr::parse(CSR_FULL).unwrap();
        let result = EnrollmentRequestBuilder::new(&fx.catalog, &fx.index, &csr)
            .build(&EnrollmentProductInfo::new("p1").param("Years", "1"), &SanMap::new());
        assert!(matches!(result, Err(MpkiError::UnresolvedPlaceholder { .. })));
    }
}
