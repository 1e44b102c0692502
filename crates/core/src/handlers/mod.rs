//! RPC handlers.
//!
//! One module per clinical domain, each implementing [`RpcHandler`] for one
//! named remote procedure. Every handler takes the patient's enterprise
//! identifier (ICN) as its first positional parameter.
//!
//! Two distinct "patient unknown at this site" behaviours are part of the
//! wire contract and differ by domain:
//! - administrative and chart-style RPCs (patient inquiry, vitals,
//!   admissions) answer with a `-1^…` error payload naming the site;
//! - clinical-list RPCs whose absence is itself meaningful (medications,
//!   problems, allergies) answer with the empty string — a valid "no data"
//!   response, not an error.

pub mod allergies;
pub mod demographics;
pub mod encounters;
pub mod medications;
pub mod problems;
pub mod vitals;

pub use allergies::AllergiesListHandler;
pub use demographics::PatientInquiryHandler;
pub use encounters::AdmissionsHandler;
pub use medications::MedicationsCoverHandler;
pub use problems::ProblemsListHandler;
pub use vitals::LatestVitalsHandler;

use std::sync::Arc;

use serde_json::Value;
use vistasim_types::Icn;

use crate::dispatch::RpcRegistry;
use crate::error::{DispatchError, DispatchResult};

/// Build a registry with the full handler set registered.
pub fn default_registry() -> RpcRegistry {
    let mut registry = RpcRegistry::new();
    registry.register(Arc::new(PatientInquiryHandler));
    registry.register(Arc::new(LatestVitalsHandler));
    registry.register(Arc::new(AllergiesListHandler));
    registry.register(Arc::new(AdmissionsHandler));
    registry.register(Arc::new(MedicationsCoverHandler));
    registry.register(Arc::new(ProblemsListHandler));
    registry
}

/// Validate and extract the leading ICN parameter.
///
/// Shared by every handler: the first positional parameter must be a
/// non-empty JSON string.
pub(crate) fn icn_param(rpc_name: &str, params: &[Value]) -> DispatchResult<Icn> {
    let Some(first) = params.first() else {
        return Err(DispatchError::Validation(format!(
            "{rpc_name} requires 1 parameter: ICN"
        )));
    };
    let Some(text) = first.as_str() else {
        return Err(DispatchError::Validation(format!(
            "Invalid ICN parameter: {first}"
        )));
    };
    Icn::new(text)
        .map_err(|_| DispatchError::Validation(format!("Invalid ICN parameter: {first}")))
}
