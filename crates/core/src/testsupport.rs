//! Shared fixtures for handler and broker tests.

use std::sync::Arc;

use crate::dispatch::RequestContext;
use crate::domain::DomainData;
use crate::identity::{IdentityResolver, PatientRegistry};

/// A three-patient registry covering the standard multi-site layout:
/// ICN100001 at sites 200 and 500 (different DFNs), ICN100010 at 200 and 500,
/// ICN100013 only at 630.
pub(crate) fn patient_registry() -> Arc<PatientRegistry> {
    let wire: serde_json::Value = serde_json::json!({
        "patients": [
            {
                "icn": "ICN100001",
                "name_last": "DOOREE", "name_first": "ADAM",
                "name_display": "DOOREE,ADAM",
                "ssn": "666-12-6789", "dob": "1980-01-02", "sex": "M",
                "veteran_status": "VETERAN",
                "treating_facilities": [
                    {"sta3n": "200", "dfn": "100001"},
                    {"sta3n": "500", "dfn": "500001"}
                ]
            },
            {
                "icn": "ICN100010",
                "name_last": "PATTON", "name_first": "MARIA", "name_middle": "L",
                "ssn": "666-44-0010", "dob": "1975-06-30", "sex": "F",
                "veteran_status": "VETERAN",
                "treating_facilities": [
                    {"sta3n": "200", "dfn": "100010"},
                    {"sta3n": "500", "dfn": "500010"}
                ]
            },
            {
                "icn": "ICN100013",
                "name_last": "KELLER", "name_first": "JAMES",
                "ssn": "666-77-0013", "dob": "1962-11-08", "sex": "M",
                "veteran_status": "VETERAN",
                "treating_facilities": [
                    {"sta3n": "630", "dfn": "630013"}
                ]
            }
        ]
    });
    let records = serde_json::from_value::<RegistryWire>(wire)
        .expect("valid registry fixture")
        .patients;
    Arc::new(PatientRegistry::from_records(records))
}

#[derive(serde::Deserialize)]
struct RegistryWire {
    patients: Vec<crate::identity::PatientRecord>,
}

/// One site's resolver plus domain data, with a ready-made request context.
pub(crate) struct TestSite {
    pub resolver: IdentityResolver,
    pub domain: DomainData,
}

impl TestSite {
    pub fn new(sta3n: &str) -> Self {
        Self::with_domain(sta3n, DomainData::empty(sta3n))
    }

    pub fn with_domain(sta3n: &str, domain: DomainData) -> Self {
        Self {
            resolver: IdentityResolver::new(sta3n, patient_registry()),
            domain,
        }
    }

    pub fn ctx(&self) -> RequestContext<'_> {
        RequestContext {
            site_sta3n: self.resolver.sta3n(),
            resolver: &self.resolver,
            domain: &self.domain,
            request_id: "test",
        }
    }
}
