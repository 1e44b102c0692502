//! Patient demographics RPCs.

use serde_json::Value;

use crate::codec;
use crate::dispatch::{RequestContext, RpcHandler};
use crate::error::DispatchResult;
use crate::fmdate;
use crate::handlers::icn_param;

/// Handler for `ORWPT PTINQ` — patient inquiry.
///
/// Returns basic demographics as a single record:
/// `NAME^SSN^DOB^SEX^VETERAN_STATUS`, with the date of birth in FileMan form.
///
/// An unknown patient is an error payload, not an empty response: the caller
/// asked "who is this", and "nobody" is a `-1^` answer. The message names the
/// serving site when the patient exists elsewhere in the enterprise but has
/// no registration here.
pub struct PatientInquiryHandler;

impl RpcHandler for PatientInquiryHandler {
    fn rpc_name(&self) -> &'static str {
        "ORWPT PTINQ"
    }

    fn validate_params(&self, params: &[Value]) -> DispatchResult<()> {
        icn_param(self.rpc_name(), params).map(|_| ())
    }

    fn execute(&self, params: &[Value], ctx: &RequestContext<'_>) -> DispatchResult<String> {
        let icn = icn_param(self.rpc_name(), params)?;
        tracing::info!(
            "[Site {}] ORWPT PTINQ called for ICN: {icn}",
            ctx.site_sta3n
        );

        let Some(record) = ctx.resolver.full_record(icn.as_str()) else {
            tracing::info!("Patient {icn} not found in registry");
            return Ok(codec::pack_error_default(&format!(
                "Patient {icn} not found"
            )));
        };

        if !ctx.resolver.is_registered(icn.as_str()) {
            tracing::info!(
                "Patient {icn} not registered at site {}",
                ctx.site_sta3n
            );
            return Ok(codec::pack_error_default(&format!(
                "Patient {icn} not registered at site {}",
                ctx.site_sta3n
            )));
        }

        let dob = record
            .dob
            .as_deref()
            .and_then(fmdate::from_iso)
            .unwrap_or_default();
        Ok(codec::pack_fields(&[
            Some(record.display_name()),
            Some(record.ssn.clone().unwrap_or_default()),
            Some(dob),
            Some(record.sex.clone().unwrap_or_default()),
            Some(
                record
                    .veteran_status
                    .clone()
                    .unwrap_or_else(|| "VETERAN".to_owned()),
            ),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::TestSite;

    #[test]
    fn reports_rpc_name() {
        assert_eq!(PatientInquiryHandler.rpc_name(), "ORWPT PTINQ");
    }

    #[test]
    fn rejects_missing_and_invalid_params() {
        assert!(PatientInquiryHandler.validate_params(&[]).is_err());
        assert!(PatientInquiryHandler
            .validate_params(&[Value::Null])
            .is_err());
        assert!(PatientInquiryHandler
            .validate_params(&[Value::String("ICN100001".into())])
            .is_ok());
    }

    #[test]
    fn formats_registered_patient() {
        let site = TestSite::new("200");
        let payload = PatientInquiryHandler
            .execute(&[Value::String("ICN100001".into())], &site.ctx())
            .expect("execute");
        assert_eq!(payload, "DOOREE,ADAM^666-12-6789^2800102^M^VETERAN");
    }

    #[test]
    fn assembles_display_name_from_parts() {
        let site = TestSite::new("200");
        let payload = PatientInquiryHandler
            .execute(&[Value::String("ICN100010".into())], &site.ctx())
            .expect("execute");
        assert!(payload.starts_with("PATTON,MARIA L^666-44-0010^2750630^F^"));
    }

    #[test]
    fn unknown_patient_is_error_payload() {
        let site = TestSite::new("200");
        let payload = PatientInquiryHandler
            .execute(&[Value::String("ICN999999".into())], &site.ctx())
            .expect("execute");
        assert_eq!(payload, "-1^Patient ICN999999 not found");
    }

    #[test]
    fn patient_at_other_site_names_this_site() {
        let site = TestSite::new("200");
        let payload = PatientInquiryHandler
            .execute(&[Value::String("ICN100013".into())], &site.ctx())
            .expect("execute");
        assert_eq!(
            payload,
            "-1^Patient ICN100013 not registered at site 200"
        );
    }
}
