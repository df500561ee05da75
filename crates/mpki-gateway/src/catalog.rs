//! Enrollment template discovery.

use mpki_core::{MpkiError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::template::PARAM_TOKEN;

const NUMERIC_PARAM_TOKEN: &str = "Numeric|EnrollmentParam|";

/// Value type of an enrollment parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Substituted as a JSON string
    String,
    /// Substituted as a bare JSON number
    Number,
}

#[derive(Debug, Clone)]
struct TemplateEntry {
    path: PathBuf,
    profile_id: String,
    text: String,
    document: Value,
}

/// JSON enrollment templates keyed by the profile id they target
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    entries: Vec<TemplateEntry>,
}

impl TemplateCatalog {
    /// Scan `dir` for `*.json` templates.
    ///
    /// Files are visited in file-name order. A file registers under the
    /// `profile.id` of its root object; unreadable files, invalid JSON and
    /// files without an id are skipped. When two files target the same
    /// profile the first one wins.
    pub fn discover(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(MpkiError::Config(format!(
                "template directory {} does not exist",
                dir.display()
            )));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut catalog = Self::default();
        for path in paths {
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read template, skipping");
                    continue;
                }
            };

            let document: Value = match serde_json::from_str(&text) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "template is not valid JSON, skipping");
                    continue;
                }
            };

            let Some(profile_id) = document
                .pointer("/profile/id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(ToString::to_string)
            else {
                warn!(path = %path.display(), "template has no profile.id, skipping");
                continue;
            };

            if catalog.entries.iter().any(|e| e.profile_id == profile_id) {
                warn!(path = %path.display(), profile = %profile_id, "duplicate template for profile, skipping");
                continue;
            }

            debug!(path = %path.display(), profile = %profile_id, "registered template");
            catalog.entries.push(TemplateEntry {
                path,
                profile_id,
                text,
                document,
            });
        }

        Ok(catalog)
    }

    /// Registered product (profile) ids in discovery order
    #[must_use]
    pub fn product_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.profile_id.clone()).collect()
    }

    /// Template file registered for a product
    pub fn template_path(&self, product_id: &str) -> Result<&Path> {
        self.entry(product_id).map(|e| e.path.as_path())
    }

    /// Template text registered for a product, as read at discovery time
    pub fn template(&self, product_id: &str) -> Result<&str> {
        self.entry(product_id).map(|e| e.text.as_str())
    }

    /// Parameters referenced by any template, with their value type.
    ///
    /// The first occurrence of a name decides its type.
    #[must_use]
    pub fn enrollment_params(&self) -> BTreeMap<String, ParamKind> {
        let mut params = BTreeMap::new();
        for entry in &self.entries {
            collect_params(&entry.document, &mut params);
        }
        params
    }

    /// Number of registered templates
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no template was registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, product_id: &str) -> Result<&TemplateEntry> {
        self.entries
            .iter()
            .find(|e| e.profile_id == product_id)
            .ok_or_else(|| MpkiError::TemplateNotFound {
                product: product_id.to_string(),
            })
    }
}

fn collect_params(value: &Value, params: &mut BTreeMap<String, ParamKind>) {
    match value {
        Value::String(s) => {
            let found = s
                .strip_prefix(NUMERIC_PARAM_TOKEN)
                .map(|rest| (rest, ParamKind::Number))
                .or_else(|| s.strip_prefix(PARAM_TOKEN).map(|rest| (rest, ParamKind::String)));

            if let Some((rest, kind)) = found {
                let name = rest.split('|').next().unwrap_or_default();
                if !name.is_empty() {
                    params.entry(name.to_string()).or_insert(kind);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_params(v, params)),
        Value::Object(map) => map.values().for_each(|v| collect_params(v, params)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) {
        std::fs::write(dir.path().join(name), body).unwrap();
    }

    #[test]
    fn discovers_templates_in_name_order() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.json", r#"{"profile": {"id": "p2"}}"#);
        write(&dir, "a.json", r#"{"profile": {"id": "p1"}}"#);
        write(&dir, "notes.txt", r#"{"profile": {"id": "p3"}}"#);
        write(&dir, "broken.json", "{not json");
        write(&dir, "noid.json", r#"{"seat": {}}"#);

        let catalog = TemplateCatalog::discover(dir.path()).unwrap();
        assert_eq!(catalog.product_ids(), vec!["p1", "p2"]);
        assert_eq!(catalog.template_path("p2").unwrap(), dir.path().join("b.json"));
        assert!(catalog.template("p1").unwrap().contains("p1"));
    }

    #[test]
    fn duplicate_profile_keeps_first_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.json", r#"{"profile": {"id": "p1"}, "n": 1}"#);
        write(&dir, "b.json", r#"{"profile": {"id": "p1"}, "n": 2}"#);

        let catalog = TemplateCatalog::discover(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.template("p1").unwrap().contains("\"n\": 1"));
    }

    #[test]
    fn unknown_product_and_missing_directory() {
        let dir = TempDir::new().unwrap();
        let catalog = TemplateCatalog::discover(dir.path()).unwrap();
        assert!(catalog.is_empty());
        assert!(matches!(
            catalog.template("p9"),
            Err(MpkiError::TemplateNotFound { product }) if product == "p9"
        ));

        assert!(matches!(
            TemplateCatalog::discover(&dir.path().join("missing")),
            Err(MpkiError::Config(_))
        ));
    }

    #[test]
    fn collects_enrollment_parameters() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "a.json",
            r#"{
                "profile": {"id": "p1"},
                "seat": {"seat_id": "EnrollmentParam|Seat"},
                "validity": {"duration": "Numeric|EnrollmentParam|Years|Numeric"},
                "tags": ["EnrollmentParam|Tag", "CSR|CN"]
            }"#,
        );
        write(
            &dir,
            "b.json",
            r#"{"profile": {"id": "p2"}, "seat": {"seat_id": "Numeric|EnrollmentParam|Seat|Numeric"}}"#,
        );

        let params = TemplateCatalog::discover(dir.path()).unwrap().enrollment_params();
        assert_eq!(params.len(), 3);
        assert_eq!(params["Seat"], ParamKind::String);
        assert_eq!(params["Years"], ParamKind::Number);
        assert_eq!(params["Tag"], ParamKind::String);
    }
}
