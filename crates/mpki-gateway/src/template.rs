//! Placeholder substitution over raw template text.
//!
//! Tokens are replaced in a fixed order, each pass working on the output of
//! the previous one:
//!
//! 1. `EnrollmentParam|<name>` with the caller's product parameter
//! 2. `"Numeric|` and `|Numeric"` markers are stripped, leaving bare numbers
//! 3. `CSR|<attr>` with the matching CSR subject value
//! 4. `CSR|RAW` with the request text as supplied
//!
//! Substituted values are JSON-escaped, so a template stays a valid JSON
//! document whatever the parameters contain.

use crate::csr::ParsedCsr;
use mpki_core::{MpkiError, Result};
use std::collections::BTreeMap;
use tracing::trace;

/// Prefix of product parameter tokens
pub const PARAM_TOKEN: &str = "EnrollmentParam|";

/// Prefix of CSR tokens
pub const CSR_TOKEN: &str = "CSR|";

/// Attribute name of the raw-request token
const RAW: &str = "RAW";

const NUMERIC_OPEN: &str = "\"Numeric|";
const NUMERIC_CLOSE: &str = "|Numeric\"";

/// Run every substitution pass over `template`.
///
/// Fails with [`MpkiError::UnresolvedPlaceholder`] if any parameter or CSR
/// token is left once all passes have run.
pub fn substitute(
    template: &str,
    params: &BTreeMap<String, String>,
    csr: &ParsedCsr,
) -> Result<String> {
    let text = replace_tokens(template, PARAM_TOKEN, is_param_end, |name| {
        params.get(name).map(String::as_str).map(json_escape)
    });

    let text = text.replace(NUMERIC_OPEN, "").replace(NUMERIC_CLOSE, "");

    // With an empty subject every CSR attribute resolves to the empty string.
    let text = replace_tokens(&text, CSR_TOKEN, is_attr_end, |name| {
        if name == RAW {
            None
        } else if csr.has_subject() {
            csr.get(name).map(json_escape)
        } else {
            Some(String::new())
        }
    });

    let text = text.replace(&format!("{CSR_TOKEN}{RAW}"), &json_escape(csr.raw()));

    if let Some(token) = first_unresolved(&text) {
        return Err(MpkiError::UnresolvedPlaceholder { token });
    }

    trace!(template = %text, "substituted template");
    Ok(text)
}

/// Replace every `prefix<name>` occurrence for which `resolve` yields a value.
///
/// Unresolved tokens are copied through unchanged.
fn replace_tokens(
    text: &str,
    prefix: &str,
    is_end: impl Fn(char) -> bool,
    mut resolve: impl FnMut(&str) -> Option<String>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(prefix) {
        out.push_str(&rest[..start]);
        let after = &rest[start + prefix.len()..];
        let name_len = after.find(|c: char| is_end(c)).unwrap_or(after.len());
        let name = &after[..name_len];

        match resolve(name) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + prefix.len() + name_len]),
        }
        rest = &after[name_len..];
    }

    out.push_str(rest);
    out
}

const fn is_param_end(c: char) -> bool {
    c == '"' || c == '|'
}

const fn is_attr_end(c: char) -> bool {
    !c.is_ascii_alphanumeric()
}

fn json_escape(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

fn first_unresolved(text: &str) -> Option<String> {
    [PARAM_TOKEN, CSR_TOKEN]
        .iter()
        .filter_map(|prefix| text.find(prefix))
        .min()
        .map(|start| {
            let token = &text[start..];
            let end = token.find(|c: char| c == '"' || c.is_whitespace()).unwrap_or(token.len());
            token[..end].to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSR_FULL: &str = include_str!("testdata/csr_full.pem");
    const CSR_NO_SUBJECT: &str = include_str!("testdata/csr_no_subject.pem");

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn replaces_parameters_and_unwraps_numbers() {
        let csr = ParsedCsr::parse(CSR_FULL).unwrap();
        let template = r#"{"seat": {"seat_id": "EnrollmentParam|Seat"}, "validity": {"duration": "Numeric|EnrollmentParam|Years|Numeric"}}"#;

        let out = substitute(template, &params(&[("Seat", "ops"), ("Years", "2")]), &csr).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["seat"]["seat_id"], "ops");
        assert_eq!(json["validity"]["duration"], 2);
    }

    #[test]
    fn replaces_csr_attributes_and_raw() {
        let csr = ParsedCsr::parse(CSR_FULL).unwrap();
        let template = r#"{"csr": "CSR|RAW", "attributes": {"common_name": "CSR|CN", "organization_name": "CSR|O", "country": "CSR|C"}}"#;

        let out = substitute(template, &BTreeMap::new(), &csr).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["attributes"]["common_name"], "a.com");
        assert_eq!(json["attributes"]["organization_name"], "Example Corp");
        assert_eq!(json["attributes"]["country"], "US");
        assert_eq!(json["csr"], CSR_FULL);
    }

    #[test]
    fn values_are_json_escaped() {
        let csr = ParsedCsr::parse(CSR_FULL).unwrap();
        let template = r#"{"comment": "EnrollmentParam|Note"}"#;

        let out = substitute(template, &params(&[("Note", "say \"hi\"\n")]), &csr).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["comment"], "say \"hi\"\n");
    }

    #[test]
    fn missing_parameter_is_unresolved() {
        let csr = ParsedCsr::parse(CSR_FULL).unwrap();
        let template = r#"{"seat": {"seat_id": "EnrollmentParam|Seat"}}"#;

        match substitute(template, &BTreeMap::new(), &csr) {
            Err(MpkiError::UnresolvedPlaceholder { token }) => assert_eq!(token, "EnrollmentParam|Seat"),
            other => panic!("expected unresolved placeholder, got {other:?}"),
        }
    }

    #[test]
    fn missing_csr_attribute_is_unresolved() {
        let csr = ParsedCsr::parse(CSR_FULL).unwrap();
        let template = r#"{"attributes": {"locality": "CSR|L"}}"#;

        match substitute(template, &BTreeMap::new(), &csr) {
            Err(MpkiError::UnresolvedPlaceholder { token }) => assert_eq!(token, "CSR|L"),
            other => panic!("expected unresolved placeholder, got {other:?}"),
        }
    }

    #[test]
    fn empty_subject_blanks_csr_attributes() {
        let csr = ParsedCsr::parse(CSR_NO_SUBJECT).unwrap();
        let template = r#"{"csr": "CSR|RAW", "attributes": {"common_name": "CSR|CN"}}"#;

        let out = substitute(template, &BTreeMap::new(), &csr).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["attributes"]["common_name"], "");
        assert_eq!(json["csr"], CSR_NO_SUBJECT);
    }

    #[test]
    fn passes_leave_surrounding_text_intact() {
        let csr = ParsedCsr::parse(CSR_FULL).unwrap();
        let template = r#"{"a": "EnrollmentParam|Name", "b": "CSR|CN"}"#;

        let out = substitute(template, &params(&[("Name", "x")]), &csr).unwrap();
        assert_eq!(out, r#"{"a": "x", "b": "a.com"}"#);
    }

    #[test]
    fn repeated_token_is_replaced_everywhere() {
        let csr = ParsedCsr::parse(CSR_FULL).unwrap();
        let out = substitute(r#"["CSR|OU", "CSR|OU"]"#, &BTreeMap::new(), &csr).unwrap();
        assert_eq!(out, r#"["Eng/Security", "Eng/Security"]"#);
    }
}
