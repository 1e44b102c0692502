//! Site registry.
//!
//! Sites are the simulated facilities. Their metadata comes from a static
//! `sites.json` resource enumerating `(sta3n, name, description)` records and
//! is loaded exactly once at process start; the resulting directory is
//! immutable for the process lifetime.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Metadata for one simulated facility.
#[derive(Debug, Clone)]
pub struct Site {
    /// Station number, the short site identifier (e.g. `"200"`).
    pub sta3n: String,
    /// Display name (e.g. `"ALEXANDRIA"`).
    pub name: String,
    /// Free-text description.
    pub description: String,
}

/// Wire form of one `sites.json` record. Strict: the site list is a contract,
/// so unknown keys are rejected rather than ignored.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SiteWire {
    sta3n: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SitesFileWire {
    #[serde(default)]
    sites: Vec<SiteWire>,
}

/// Immutable map from station number to site metadata.
#[derive(Debug, Clone)]
pub struct SiteDirectory {
    sites: BTreeMap<String, Site>,
}

impl SiteDirectory {
    /// Load the site directory from a `sites.json` resource.
    ///
    /// Fails fast when the resource is missing, is not valid JSON, or contains
    /// a record with a blank `sta3n` or `name`. A duplicated `sta3n` is not an
    /// error: the last record wins, which is how fixture overrides are
    /// expressed.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let directory = Self::from_json(&text).map_err(|err| match err {
            ConfigError::Json { source, .. } => ConfigError::Json {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::info!("Loaded {} sites from {}", directory.len(), path.display());
        Ok(directory)
    }

    /// Parse a site directory from JSON text.
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let wire: SitesFileWire =
            serde_json::from_str(text).map_err(|source| ConfigError::Json {
                path: std::path::PathBuf::from("sites.json"),
                source,
            })?;

        let mut sites = BTreeMap::new();
        for record in wire.sites {
            let sta3n = record.sta3n.trim().to_owned();
            let name = record.name.trim().to_owned();
            if sta3n.is_empty() {
                return Err(ConfigError::InvalidSite(
                    "site record missing sta3n".into(),
                ));
            }
            if name.is_empty() {
                return Err(ConfigError::InvalidSite(format!(
                    "site {sta3n} missing name"
                )));
            }
            if sites.contains_key(&sta3n) {
                tracing::warn!("Duplicate site {sta3n} in sites.json; last record wins");
            }
            sites.insert(
                sta3n.clone(),
                Site {
                    sta3n,
                    name,
                    description: record.description,
                },
            );
        }

        Ok(Self { sites })
    }

    pub fn get(&self, sta3n: &str) -> Option<&Site> {
        self.sites.get(sta3n)
    }

    pub fn contains(&self, sta3n: &str) -> bool {
        self.sites.contains_key(sta3n)
    }

    /// Station numbers in ascending order.
    pub fn sta3ns(&self) -> Vec<&str> {
        self.sites.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Site> {
        self.sites.values()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_sites_keyed_by_sta3n() {
        let directory = SiteDirectory::from_json(
            r#"{"sites": [
                {"sta3n": "200", "name": "ALEXANDRIA", "description": "VA medical center"},
                {"sta3n": "500", "name": "ANCHORAGE"}
            ]}"#,
        )
        .expect("valid sites");

        assert_eq!(directory.len(), 2);
        let site = directory.get("200").expect("site 200");
        assert_eq!(site.name, "ALEXANDRIA");
        assert_eq!(site.description, "VA medical center");
        assert_eq!(directory.get("500").expect("site 500").description, "");
        assert!(!directory.contains("630"));
        assert_eq!(directory.sta3ns(), vec!["200", "500"]);
    }

    #[test]
    fn duplicate_sta3n_last_record_wins() {
        let directory = SiteDirectory::from_json(
            r#"{"sites": [
                {"sta3n": "200", "name": "FIRST"},
                {"sta3n": "200", "name": "OVERRIDE"}
            ]}"#,
        )
        .expect("valid sites");

        assert_eq!(directory.len(), 1);
        assert_eq!(directory.get("200").expect("site 200").name, "OVERRIDE");
    }

    #[test]
    fn rejects_record_missing_sta3n() {
        let err = SiteDirectory::from_json(r#"{"sites": [{"sta3n": " ", "name": "X"}]}"#)
            .expect_err("blank sta3n");
        assert!(matches!(err, ConfigError::InvalidSite(_)));
    }

    #[test]
    fn rejects_record_missing_name() {
        let err = SiteDirectory::from_json(r#"{"sites": [{"sta3n": "200", "name": ""}]}"#)
            .expect_err("blank name");
        assert!(matches!(err, ConfigError::InvalidSite(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(SiteDirectory::from_json("{not json").is_err());
        assert!(SiteDirectory::from_json(r#"{"sites": [{"sta3n": "200"}]}"#).is_err());
    }

    #[test]
    fn load_fails_for_missing_file() {
        let err = SiteDirectory::load(Path::new("/nonexistent/sites.json"))
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
