//! Per-site domain fixture data.
//!
//! Each site owns one [`DomainData`] holding its clinical fixture collections
//! (vitals, allergies, encounters, medications, problems), loaded eagerly at
//! site initialisation from per-site JSON files and immutable afterwards.
//!
//! Every record is a small typed struct rather than a loose map, so handlers
//! cannot silently typo a field name. Numeric-looking fixture fields (counts,
//! record numbers) accept either JSON strings or numbers, because the ETL
//! producers are not consistent about which they emit.
//!
//! Date-like fields may be written in the relative `T±N[.HHMM]` notation; the
//! `*_for` accessors resolve them to absolute FileMan dates against "today"
//! before any formatting step, so fixture authors never hand-compute dates.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::error::{ConfigError, ConfigResult};
use crate::fmdate;

/// Accept a string, number, or null where the fixture field is a count or a
/// record number; always surfaces as the string the wire needs.
fn stringy<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

fn unknown_kind() -> String {
    "UNKNOWN".to_owned()
}

fn zero() -> String {
    "0".to_owned()
}

/// One vital-sign measurement.
#[derive(Debug, Clone, Deserialize)]
pub struct VitalRecord {
    pub dfn: String,
    #[serde(rename = "type", default = "unknown_kind")]
    pub vital_type: String,
    #[serde(default, deserialize_with = "stringy")]
    pub value: String,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub date_time: String,
    #[serde(default)]
    pub entered_by: String,
}

/// One allergy or adverse reaction.
#[derive(Debug, Clone, Deserialize)]
pub struct AllergyRecord {
    pub dfn: String,
    #[serde(default)]
    pub allergen_name: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub reaction_datetime: String,
    /// Comma-joined reaction list, as the wire carries it.
    #[serde(default)]
    pub reactions: String,
    #[serde(default)]
    pub allergy_type: String,
    /// Site that originated the record; defaults to the serving site.
    #[serde(default)]
    pub originating_site: Option<String>,
    #[serde(default)]
    pub entered_by: String,
}

/// One inpatient admission.
#[derive(Debug, Clone, Deserialize)]
pub struct EncounterRecord {
    pub dfn: String,
    #[serde(default, deserialize_with = "stringy")]
    pub inpatient_id: String,
    #[serde(default)]
    pub admit_datetime: String,
    #[serde(default)]
    pub admit_location: String,
    #[serde(default)]
    pub status: String,
    /// Empty while the admission is still active.
    #[serde(default)]
    pub discharge_datetime: String,
    #[serde(default)]
    pub discharge_location: String,
    #[serde(default = "zero", deserialize_with = "stringy")]
    pub length_of_stay: String,
    #[serde(default)]
    pub diagnosis_code: String,
    #[serde(default)]
    pub admit_provider: String,
}

/// One outpatient prescription.
#[derive(Debug, Clone, Deserialize)]
pub struct MedicationRecord {
    pub dfn: String,
    #[serde(default, deserialize_with = "stringy")]
    pub rx_number: String,
    #[serde(default)]
    pub drug_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "stringy")]
    pub quantity: String,
    #[serde(default, deserialize_with = "stringy")]
    pub days_supply: String,
    #[serde(default, deserialize_with = "stringy")]
    pub refills_remaining: String,
    #[serde(default)]
    pub issue_date: String,
    #[serde(default)]
    pub expiration_date: String,
}

/// One problem-list entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ProblemRecord {
    pub dfn: String,
    #[serde(default, deserialize_with = "stringy")]
    pub problem_ien: String,
    #[serde(default)]
    pub problem_text: String,
    #[serde(default)]
    pub icd10_code: String,
    #[serde(default = "default_problem_status")]
    pub problem_status: String,
    #[serde(default)]
    pub onset_date: String,
    #[serde(default)]
    pub service_connected: bool,
    #[serde(default)]
    pub snomed_code: String,
    #[serde(default)]
    pub updated_today: bool,
}

fn default_problem_status() -> String {
    "Active".to_owned()
}

#[derive(Debug, Default, Deserialize)]
struct VitalsFile {
    #[serde(default)]
    vitals: Vec<VitalRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct AllergiesFile {
    #[serde(default)]
    allergies: Vec<AllergyRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct EncountersFile {
    #[serde(default)]
    encounters: Vec<EncounterRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct MedicationsFile {
    #[serde(default)]
    medications: Vec<MedicationRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct ProblemsFile {
    #[serde(default)]
    problems: Vec<ProblemRecord>,
}

/// All domain fixture collections for one site.
#[derive(Debug, Default)]
pub struct DomainData {
    sta3n: String,
    vitals: Vec<VitalRecord>,
    allergies: Vec<AllergyRecord>,
    encounters: Vec<EncounterRecord>,
    medications: Vec<MedicationRecord>,
    problems: Vec<ProblemRecord>,
}

impl DomainData {
    /// Load every domain collection for a site from its fixture directory.
    ///
    /// A missing file is an empty collection, not an error: sites are not
    /// required to carry data for every domain. A file that exists but does
    /// not parse fails startup.
    pub fn load(sta3n: impl Into<String>, site_dir: &Path) -> ConfigResult<Self> {
        let sta3n = sta3n.into();

        let vitals: VitalsFile = read_collection(&site_dir.join("vitals.json"))?;
        let allergies: AllergiesFile = read_collection(&site_dir.join("allergies.json"))?;
        let encounters: EncountersFile = read_collection(&site_dir.join("encounters.json"))?;
        let medications: MedicationsFile = read_collection(&site_dir.join("medications.json"))?;
        let problems: ProblemsFile = read_collection(&site_dir.join("problems.json"))?;

        let data = Self {
            sta3n,
            vitals: vitals.vitals,
            allergies: allergies.allergies,
            encounters: encounters.encounters,
            medications: medications.medications,
            problems: problems.problems,
        };
        tracing::info!(
            "Domain data loaded for site {}: {} vitals, {} allergies, {} encounters, {} medications, {} problems",
            data.sta3n,
            data.vitals.len(),
            data.allergies.len(),
            data.encounters.len(),
            data.medications.len(),
            data.problems.len()
        );
        Ok(data)
    }

    /// An empty data set for a site; used when building runtimes by hand.
    pub fn empty(sta3n: impl Into<String>) -> Self {
        Self {
            sta3n: sta3n.into(),
            ..Self::default()
        }
    }

    pub fn sta3n(&self) -> &str {
        &self.sta3n
    }

    /// Vitals for one site-local identifier, dates resolved against today.
    pub fn vitals_for(&self, dfn: &str) -> Vec<VitalRecord> {
        self.vitals_for_on(dfn, today())
    }

    pub(crate) fn vitals_for_on(&self, dfn: &str, today: NaiveDate) -> Vec<VitalRecord> {
        self.vitals
            .iter()
            .filter(|record| record.dfn == dfn)
            .cloned()
            .map(|mut record| {
                record.date_time = fmdate::resolve(&record.date_time, today);
                record
            })
            .collect()
    }

    /// Allergies for one site-local identifier, dates resolved against today.
    pub fn allergies_for(&self, dfn: &str) -> Vec<AllergyRecord> {
        self.allergies_for_on(dfn, today())
    }

    pub(crate) fn allergies_for_on(&self, dfn: &str, today: NaiveDate) -> Vec<AllergyRecord> {
        self.allergies
            .iter()
            .filter(|record| record.dfn == dfn)
            .cloned()
            .map(|mut record| {
                record.reaction_datetime = fmdate::resolve(&record.reaction_datetime, today);
                record
            })
            .collect()
    }

    /// Encounters for one site-local identifier, dates resolved against today.
    pub fn encounters_for(&self, dfn: &str) -> Vec<EncounterRecord> {
        self.encounters_for_on(dfn, today())
    }

    pub(crate) fn encounters_for_on(&self, dfn: &str, today: NaiveDate) -> Vec<EncounterRecord> {
        self.encounters
            .iter()
            .filter(|record| record.dfn == dfn)
            .cloned()
            .map(|mut record| {
                record.admit_datetime = fmdate::resolve(&record.admit_datetime, today);
                record.discharge_datetime = fmdate::resolve(&record.discharge_datetime, today);
                record
            })
            .collect()
    }

    /// Medications for one site-local identifier, dates resolved against
    /// today. Status filtering is the handler's concern, not the loader's.
    pub fn medications_for(&self, dfn: &str) -> Vec<MedicationRecord> {
        self.medications_for_on(dfn, today())
    }

    pub(crate) fn medications_for_on(&self, dfn: &str, today: NaiveDate) -> Vec<MedicationRecord> {
        self.medications
            .iter()
            .filter(|record| record.dfn == dfn)
            .cloned()
            .map(|mut record| {
                record.issue_date = fmdate::resolve(&record.issue_date, today);
                record.expiration_date = fmdate::resolve(&record.expiration_date, today);
                record
            })
            .collect()
    }

    /// Problems for one site-local identifier, dates resolved against today.
    pub fn problems_for(&self, dfn: &str) -> Vec<ProblemRecord> {
        self.problems_for_on(dfn, today())
    }

    pub(crate) fn problems_for_on(&self, dfn: &str, today: NaiveDate) -> Vec<ProblemRecord> {
        self.problems
            .iter()
            .filter(|record| record.dfn == dfn)
            .cloned()
            .map(|mut record| {
                record.onset_date = fmdate::resolve(&record.onset_date, today);
                record
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn with_vitals(mut self, vitals: Vec<VitalRecord>) -> Self {
        self.vitals = vitals;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_allergies(mut self, allergies: Vec<AllergyRecord>) -> Self {
        self.allergies = allergies;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_encounters(mut self, encounters: Vec<EncounterRecord>) -> Self {
        self.encounters = encounters;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_medications(mut self, medications: Vec<MedicationRecord>) -> Self {
        self.medications = medications;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_problems(mut self, problems: Vec<ProblemRecord>) -> Self {
        self.problems = problems;
        self
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn read_collection<T>(path: &Path) -> ConfigResult<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No fixture file at {}; empty collection", path.display());
            return Ok(T::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn loads_collections_from_site_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut file = std::fs::File::create(dir.path().join("vitals.json")).expect("create");
        file.write_all(
            br#"{"vitals": [
                {"dfn": "100001", "type": "PULSE", "value": 72, "units": "/min",
                 "date_time": "T-0.0930", "entered_by": "NURSE,JANE"},
                {"dfn": "100002", "type": "TEMP", "value": "98.6", "units": "F",
                 "date_time": "3251217.0845", "entered_by": "NURSE,JANE"}
            ]}"#,
        )
        .expect("write");

        let data = DomainData::load("200", dir.path()).expect("load");
        assert_eq!(data.sta3n(), "200");

        let vitals = data.vitals_for_on("100001", day(2026, 2, 7));
        assert_eq!(vitals.len(), 1);
        assert_eq!(vitals[0].vital_type, "PULSE");
        assert_eq!(vitals[0].value, "72");
        assert_eq!(vitals[0].date_time, "3260207.0930");

        // Absolute dates pass through untouched.
        let other = data.vitals_for_on("100002", day(2026, 2, 7));
        assert_eq!(other[0].date_time, "3251217.0845");

        // Missing fixture files mean empty collections, not failures.
        assert!(data.medications_for("100001").is_empty());
    }

    #[test]
    fn malformed_fixture_fails_startup() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("problems.json"), "{broken").expect("write");
        let err = DomainData::load("200", dir.path()).expect_err("malformed json");
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn filters_by_dfn() {
        let data = DomainData::empty("200").with_problems(vec![
            serde_json::from_value(serde_json::json!({
                "dfn": "100001", "problem_ien": 123, "problem_text": "Hypertension",
                "icd10_code": "I10", "onset_date": "3220601",
                "service_connected": true, "snomed_code": "38341003"
            }))
            .expect("valid problem"),
            serde_json::from_value(serde_json::json!({
                "dfn": "100002", "problem_ien": 456, "problem_text": "Other"
            }))
            .expect("valid problem"),
        ]);

        let problems = data.problems_for_on("100001", day(2026, 2, 7));
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].problem_ien, "123");
        assert_eq!(problems[0].problem_status, "Active");
        assert!(problems[0].service_connected);
        assert!(!problems[0].updated_today);
    }

    #[test]
    fn encounter_dates_resolve_and_empty_discharge_passes_through() {
        let data = DomainData::empty("200").with_encounters(vec![serde_json::from_value(
            serde_json::json!({
                "dfn": "100001", "inpatient_id": 285023,
                "admit_datetime": "T-2.0830", "admit_location": "ICU",
                "status": "ACTIVE", "diagnosis_code": "J18.9",
                "admit_provider": "SMITH,JANE"
            }),
        )
        .expect("valid encounter")]);

        let encounters = data.encounters_for_on("100001", day(2026, 2, 7));
        assert_eq!(encounters[0].admit_datetime, "3260205.0830");
        assert_eq!(encounters[0].discharge_datetime, "");
        assert_eq!(encounters[0].length_of_stay, "0");
    }
}
