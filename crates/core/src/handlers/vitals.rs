//! Vital-signs RPCs.

use serde_json::Value;

use crate::codec;
use crate::dispatch::{RequestContext, RpcHandler};
use crate::error::DispatchResult;
use crate::handlers::icn_param;

/// Handler for `GMV LATEST VM` — latest vital signs.
///
/// One record per vital: `TYPE^VALUE^UNITS^DATE_TIME^ENTERED_BY`, dates in
/// FileMan form (already resolved from any fixture T-notation by the domain
/// loader). A patient unknown at this site is a `-1^` error payload; a known
/// patient with no recorded vitals is the empty "no data" response.
pub struct LatestVitalsHandler;

impl RpcHandler for LatestVitalsHandler {
    fn rpc_name(&self) -> &'static str {
        "GMV LATEST VM"
    }

    fn validate_params(&self, params: &[Value]) -> DispatchResult<()> {
        icn_param(self.rpc_name(), params).map(|_| ())
    }

    fn execute(&self, params: &[Value], ctx: &RequestContext<'_>) -> DispatchResult<String> {
        let icn = icn_param(self.rpc_name(), params)?;
        tracing::info!(
            "[Site {}] GMV LATEST VM called for ICN: {icn}",
            ctx.site_sta3n
        );

        let Some(dfn) = ctx.resolver.resolve(icn.as_str()) else {
            tracing::warn!(
                "[Site {}] Patient {icn} not found in registry",
                ctx.site_sta3n
            );
            return Ok(codec::pack_error_default(&format!(
                "Patient {icn} not found at site {}",
                ctx.site_sta3n
            )));
        };

        let vitals = ctx.domain.vitals_for(dfn);
        if vitals.is_empty() {
            tracing::info!(
                "[Site {}] No vitals found for patient {icn} (DFN: {dfn})",
                ctx.site_sta3n
            );
            return Ok(String::new());
        }

        let rows: Vec<Vec<Option<String>>> = vitals
            .into_iter()
            .map(|vital| {
                vec![
                    Some(vital.vital_type),
                    Some(vital.value),
                    Some(vital.units),
                    Some(vital.date_time),
                    Some(vital.entered_by),
                ]
            })
            .collect();
        tracing::info!(
            "[Site {}] Returning {} vitals for patient {icn}",
            ctx.site_sta3n,
            rows.len()
        );
        Ok(codec::pack_records(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::TestSite;

    fn vitals_fixture() -> Vec<crate::domain::VitalRecord> {
        serde_json::from_value(serde_json::json!([
            {"dfn": "100001", "type": "BLOOD PRESSURE", "value": "120/80", "units": "mmHg",
             "date_time": "3251217.0930", "entered_by": "NURSE,JANE"},
            {"dfn": "100001", "type": "PULSE", "value": 72, "units": "/min",
             "date_time": "3251217.0930", "entered_by": "NURSE,JANE"},
            {"dfn": "100010", "type": "TEMPERATURE", "value": "98.6", "units": "F",
             "date_time": "3251217.0930", "entered_by": "NURSE,JANE"}
        ]))
        .expect("valid vitals")
    }

    #[test]
    fn reports_rpc_name() {
        assert_eq!(LatestVitalsHandler.rpc_name(), "GMV LATEST VM");
    }

    #[test]
    fn formats_one_line_per_vital() {
        let site = TestSite::with_domain(
            "200",
            crate::domain::DomainData::empty("200").with_vitals(vitals_fixture()),
        );

        let payload = LatestVitalsHandler
            .execute(&[Value::String("ICN100001".into())], &site.ctx())
            .expect("execute");
        assert_eq!(
            payload,
            "BLOOD PRESSURE^120/80^mmHg^3251217.0930^NURSE,JANE\n\
             PULSE^72^/min^3251217.0930^NURSE,JANE"
        );
    }

    #[test]
    fn unknown_patient_is_error_payload() {
        let site = TestSite::new("200");
        let payload = LatestVitalsHandler
            .execute(&[Value::String("ICN100013".into())], &site.ctx())
            .expect("execute");
        assert_eq!(payload, "-1^Patient ICN100013 not found at site 200");
    }

    #[test]
    fn known_patient_without_vitals_is_empty() {
        let site = TestSite::new("200");
        let payload = LatestVitalsHandler
            .execute(&[Value::String("ICN100001".into())], &site.ctx())
            .expect("execute");
        assert_eq!(payload, "");
    }
}
