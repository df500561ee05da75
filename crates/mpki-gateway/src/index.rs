//! Lookup from semantic attribute types to provider attribute ids.

use mpki_core::CertificateProfile;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Marker carried by the id of a multi-value attribute slot
pub const MULTI_MARKER: &str = "_multi";

/// Subject attribute type of organizational-unit slots
pub const ORGANIZATION_UNIT: &str = "organization_unit";

/// Composite key of the index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey {
    /// Profile identifier
    pub profile_id: String,
    /// Semantic attribute type, possibly suffixed with [`MULTI_MARKER`]
    pub attribute_type: String,
}

impl AttributeKey {
    /// Create a key
    #[must_use]
    pub fn new(profile_id: impl Into<String>, attribute_type: impl Into<String>) -> Self {
        Self {
            profile_id: profile_id.into(),
            attribute_type: attribute_type.into(),
        }
    }
}

/// Attribute ids of one profile, built once per operation and read-only after.
///
/// Attribute types are unique per profile except for one multi-value sibling:
/// when a type repeats and the repeated id carries [`MULTI_MARKER`], it is
/// stored under `type + "_multi"`. Any further repetition keeps the first
/// entry. Profiles are expected to declare at most one plain and one
/// multi-value attribute per type.
#[derive(Debug, Clone, Default)]
pub struct ProfileAttributeIndex {
    profile_id: String,
    san: HashMap<AttributeKey, String>,
    mandatory: HashMap<AttributeKey, bool>,
    ou_slots: Vec<String>,
}

impl ProfileAttributeIndex {
    /// Build the index for `profile_id` from the full profile listing.
    pub fn build(profiles: &[CertificateProfile], profile_id: &str) -> Self {
        let mut index = Self {
            profile_id: profile_id.to_string(),
            ..Self::default()
        };

        let Some(profile) = profiles.iter().find(|p| p.id == profile_id) else {
            warn!(profile = profile_id, "profile not found in provider listing");
            return index;
        };

        for attr in profile.san_attributes() {
            if attr.id.is_empty() {
                continue;
            }

            let key = AttributeKey::new(profile_id, attr.attribute_type.as_str());
            if !index.san.contains_key(&key) {
                index.san.insert(key, attr.id.clone());
                continue;
            }

            let multi = AttributeKey::new(profile_id, multi_type(&attr.attribute_type));
            if attr.id.contains(MULTI_MARKER) && !index.san.contains_key(&multi) {
                index.san.insert(multi, attr.id.clone());
            } else {
                warn!(
                    profile = profile_id,
                    attribute_type = %attr.attribute_type,
                    id = %attr.id,
                    "ignoring duplicate profile attribute"
                );
            }
        }

        for attr in profile.subject_attributes() {
            index
                .mandatory
                .entry(AttributeKey::new(profile_id, attr.attribute_type.as_str()))
                .or_insert(attr.mandatory);

            if attr.attribute_type == ORGANIZATION_UNIT && !attr.id.is_empty() {
                index.ou_slots.push(attr.id.clone());
            }
        }

        debug!(
            profile = profile_id,
            san_attributes = index.san.len(),
            ou_slots = index.ou_slots.len(),
            "built profile attribute index"
        );
        index
    }

    /// Profile this index was built for
    #[must_use]
    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    /// Provider id of the SAN attribute with this semantic type
    #[must_use]
    pub fn san_id(&self, attribute_type: &str) -> Option<&str> {
        self.lookup(attribute_type)
    }

    /// Provider id of the multi-value sibling of `attribute_type`
    #[must_use]
    pub fn multi_id(&self, attribute_type: &str) -> Option<&str> {
        self.lookup(&multi_type(attribute_type))
    }

    /// Whether the profile marks the subject attribute as mandatory
    #[must_use]
    pub fn is_mandatory(&self, attribute_type: &str) -> bool {
        self.mandatory
            .get(&AttributeKey::new(self.profile_id.as_str(), attribute_type))
            .copied()
            .unwrap_or(false)
    }

    /// Organizational-unit attribute ids in the order the provider listed them
    #[must_use]
    pub fn ou_slots(&self) -> &[String] {
        &self.ou_slots
    }

    /// Number of SAN entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.san.len()
    }

    /// Returns true if the profile exposes no SAN attributes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.san.is_empty()
    }

    fn lookup(&self, attribute_type: &str) -> Option<&str> {
        self.san
            .get(&AttributeKey::new(self.profile_id.as_str(), attribute_type))
            .map(String::as_str)
    }
}

fn multi_type(attribute_type: &str) -> String {
    format!("{attribute_type}{MULTI_MARKER}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpki_core::{AttributeSet, ProfileAttribute, ProfileCertificate, ProfileExtensions};

    fn profile(id: &str, subject: Vec<ProfileAttribute>, san: Vec<ProfileAttribute>) -> CertificateProfile {
        CertificateProfile {
            id: id.into(),
            certificate: Some(ProfileCertificate {
                subject: Some(AttributeSet {
                    critical: false,
                    attributes: subject,
                }),
                validity: None,
                extensions: Some(ProfileExtensions {
                    san: Some(AttributeSet {
                        critical: false,
                        attributes: san,
                    }),
                }),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn multi_sibling_is_rekeyed() {
        let profiles = vec![profile(
            "p1",
            vec![],
            vec![
                ProfileAttribute::new("dns_name", "custom_encode_dnsName", false),
                ProfileAttribute::new("dns_name", "custom_encode_dnsName_multi", false),
                ProfileAttribute::new("ip_address", "custom_encode_ip", false),
            ],
        )];

        let index = ProfileAttributeIndex::build(&profiles, "p1");
        assert_eq!(index.len(), 3);
        assert_eq!(index.san_id("dns_name"), Some("custom_encode_dnsName"));
        assert_eq!(index.multi_id("dns_name"), Some("custom_encode_dnsName_multi"));
        assert_eq!(index.san_id("ip_address"), Some("custom_encode_ip"));
    }

    #[test]
    fn plain_duplicate_keeps_first() {
        let profiles = vec![profile(
            "p1",
            vec![],
            vec![
                ProfileAttribute::new("dns_name", "dns_a", false),
                ProfileAttribute::new("dns_name", "dns_b", false),
                ProfileAttribute::new("dns_name", "dns_c_multi", false),
                ProfileAttribute::new("dns_name", "dns_d_multi", false),
            ],
        )];

        let index = ProfileAttributeIndex::build(&profiles, "p1");
        assert_eq!(index.san_id("dns_name"), Some("dns_a"));
        assert_eq!(index.multi_id("dns_name"), Some("dns_c_multi"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn only_target_profile_is_indexed() {
        let profiles = vec![
            profile("p1", vec![], vec![ProfileAttribute::new("dns_name", "one", false)]),
            profile("p2", vec![], vec![ProfileAttribute::new("dns_name", "two", false)]),
        ];

        assert_eq!(ProfileAttributeIndex::build(&profiles, "p2").san_id("dns_name"), Some("two"));
        assert!(ProfileAttributeIndex::build(&profiles, "missing").is_empty());
    }

    #[test]
    fn empty_ids_are_skipped() {
        let profiles = vec![profile(
            "p1",
            vec![],
            vec![
                ProfileAttribute::new("dns_name", "", false),
                ProfileAttribute::new("dns_name", "dns", false),
            ],
        )];

        let index = ProfileAttributeIndex::build(&profiles, "p1");
        assert_eq!(index.san_id("dns_name"), Some("dns"));
        assert!(index.multi_id("dns_name").is_none());
    }

    #[test]
    fn subject_flags_and_ou_slots() {
        let profiles = vec![profile(
            "p1",
            vec![
                ProfileAttribute::new("common_name", "cert_cn", true),
                ProfileAttribute::new("organization_unit", "cert_ou_1", false),
                ProfileAttribute::new("organization_name", "cert_o", false),
                ProfileAttribute::new("organization_unit", "cert_ou_2", false),
            ],
            vec![],
        )];

        let index = ProfileAttributeIndex::build(&profiles, "p1");
        assert!(index.is_mandatory("common_name"));
        assert!(!index.is_mandatory("organization_name"));
        assert!(!index.is_mandatory("country"));
        assert_eq!(index.ou_slots(), ["cert_ou_1", "cert_ou_2"]);
    }

    #[test]
    fn keys_compare_structurally() {
        assert_eq!(AttributeKey::new("p1", "dns_name"), AttributeKey::new("p1".to_string(), "dns_name"));
        assert_ne!(AttributeKey::new("p1", "dns_name"), AttributeKey::new("p2", "dns_name"));
    }
}
