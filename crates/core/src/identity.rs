//! Patient identity resolution.
//!
//! One shared patient registry holds every known patient with their
//! enterprise-wide identifier (ICN) and the list of sites that treat them,
//! each with a site-local identifier (DFN). A per-site [`IdentityResolver`]
//! answers "what is this patient's DFN here" and "is this patient known here"
//! in O(1), built once at site initialisation and immutable afterwards.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// One (site, site-local identifier) pair attached to a patient record.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteBinding {
    #[serde(default)]
    pub sta3n: Option<String>,
    #[serde(default)]
    pub dfn: Option<String>,
}

/// One enterprise-wide patient identity with demographics and site bindings.
///
/// Fixture producers add fields over time, so unknown keys are tolerated;
/// every optional demographic is an explicit `Option` rather than an absent
/// map key.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientRecord {
    #[serde(default)]
    pub icn: Option<String>,
    #[serde(default)]
    pub name_last: Option<String>,
    #[serde(default)]
    pub name_first: Option<String>,
    #[serde(default)]
    pub name_middle: Option<String>,
    #[serde(default)]
    pub name_display: Option<String>,
    #[serde(default)]
    pub ssn: Option<String>,
    /// Date of birth in ISO `YYYY-MM-DD` form.
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub veteran_status: Option<String>,
    #[serde(default)]
    pub treating_facilities: Vec<SiteBinding>,
}

impl PatientRecord {
    /// The display name: the explicit `name_display` field when present,
    /// otherwise `LAST,FIRST MIDDLE` assembled from the name parts.
    pub fn display_name(&self) -> String {
        if let Some(display) = self.name_display.as_deref() {
            if !display.is_empty() {
                return display.to_owned();
            }
        }

        let last = self.name_last.as_deref().unwrap_or("");
        let first = self.name_first.as_deref().unwrap_or("");
        let middle = self.name_middle.as_deref().unwrap_or("");

        if !last.is_empty() && !first.is_empty() {
            let mut name = format!("{last},{first}");
            if !middle.is_empty() {
                name.push(' ');
                name.push_str(middle);
            }
            name
        } else if !last.is_empty() {
            last.to_owned()
        } else {
            first.to_owned()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFileWire {
    #[serde(default)]
    patients: Vec<PatientRecord>,
}

/// The shared, cross-site patient registry.
///
/// Loaded once at startup from `patient_registry.json` and shared by every
/// site's resolver. ICNs are unique across the registry; when a duplicate
/// appears in the fixture the first record keeps the identity.
#[derive(Debug)]
pub struct PatientRegistry {
    patients: Vec<PatientRecord>,
    by_icn: HashMap<String, usize>,
}

impl PatientRegistry {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let wire: RegistryFileWire =
            serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let registry = Self::from_records(wire.patients);
        tracing::info!(
            "Loaded patient registry from {}: {} patients",
            path.display(),
            registry.len()
        );
        Ok(registry)
    }

    pub fn from_records(patients: Vec<PatientRecord>) -> Self {
        let mut by_icn = HashMap::new();
        for (index, patient) in patients.iter().enumerate() {
            match patient.icn.as_deref() {
                Some(icn) if !icn.is_empty() => {
                    by_icn.entry(icn.to_owned()).or_insert(index);
                }
                _ => {
                    tracing::warn!("Patient record at index {index} missing ICN; skipped");
                }
            }
        }
        Self { patients, by_icn }
    }

    pub fn get(&self, icn: &str) -> Option<&PatientRecord> {
        self.by_icn.get(icn).map(|&index| &self.patients[index])
    }

    pub fn records(&self) -> &[PatientRecord] {
        &self.patients
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

/// Per-site ICN→DFN resolution.
///
/// Holds only the patients with a binding for its site; reads are lock-free
/// and safe to share across concurrent requests.
#[derive(Debug)]
pub struct IdentityResolver {
    sta3n: String,
    icn_to_dfn: HashMap<String, String>,
    registry: Arc<PatientRegistry>,
}

impl IdentityResolver {
    /// Build the resolver for one site from the shared registry.
    ///
    /// Only patients with a binding for `sta3n` enter the lookup map. When a
    /// patient lists the same site more than once, the first binding in file
    /// order wins; whether "first" should instead mean a designated primary
    /// DFN is an open ambiguity in the source data, so no priority rule is
    /// applied.
    pub fn new(sta3n: impl Into<String>, registry: Arc<PatientRegistry>) -> Self {
        let sta3n = sta3n.into();
        let mut icn_to_dfn = HashMap::new();

        for patient in registry.records() {
            let Some(icn) = patient.icn.as_deref().filter(|icn| !icn.is_empty()) else {
                continue;
            };
            let binding = patient
                .treating_facilities
                .iter()
                .find(|facility| facility.sta3n.as_deref() == Some(sta3n.as_str()));
            if let Some(dfn) = binding.and_then(|facility| facility.dfn.clone()) {
                icn_to_dfn.entry(icn.to_owned()).or_insert(dfn);
            }
        }

        tracing::info!(
            "IdentityResolver initialised for site {sta3n}: {} patients registered",
            icn_to_dfn.len()
        );

        Self {
            sta3n,
            icn_to_dfn,
            registry,
        }
    }

    /// Resolve an ICN to this site's DFN. `None` means the patient is not
    /// registered at this site.
    pub fn resolve(&self, icn: &str) -> Option<&str> {
        self.icn_to_dfn.get(icn).map(String::as_str)
    }

    pub fn is_registered(&self, icn: &str) -> bool {
        self.icn_to_dfn.contains_key(icn)
    }

    /// The full demographic record, regardless of site membership.
    ///
    /// Distinct from [`IdentityResolver::resolve`], which is site-scoped: a
    /// patient can be known to the enterprise but not registered here.
    pub fn full_record(&self, icn: &str) -> Option<&PatientRecord> {
        self.registry.get(icn)
    }

    /// ICNs of every patient registered at this site.
    pub fn registered_icns(&self) -> Vec<&str> {
        self.icn_to_dfn.keys().map(String::as_str).collect()
    }

    pub fn patient_count(&self) -> usize {
        self.icn_to_dfn.len()
    }

    pub fn sta3n(&self) -> &str {
        &self.sta3n
    }
}
