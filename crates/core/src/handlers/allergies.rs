//! Allergy and adverse-reaction RPCs.

use serde_json::Value;

use crate::codec;
use crate::dispatch::{RequestContext, RpcHandler};
use crate::error::DispatchResult;
use crate::handlers::icn_param;

/// Handler for `ORQQAL LIST` — patient allergy list.
///
/// One record per allergy:
/// `ALLERGEN^SEVERITY^REACTION_DATE_TIME^REACTIONS^TYPE^ORIGINATING_SITE^ENTERED_BY`.
///
/// "No known allergies" is clinically meaningful, so both an unregistered
/// patient and a registered patient with no records answer with the empty
/// string rather than an error payload.
pub struct AllergiesListHandler;

impl RpcHandler for AllergiesListHandler {
    fn rpc_name(&self) -> &'static str {
        "ORQQAL LIST"
    }

    fn validate_params(&self, params: &[Value]) -> DispatchResult<()> {
        icn_param(self.rpc_name(), params).map(|_| ())
    }

    fn execute(&self, params: &[Value], ctx: &RequestContext<'_>) -> DispatchResult<String> {
        let icn = icn_param(self.rpc_name(), params)?;
        tracing::info!(
            "[Site {}] ORQQAL LIST called for ICN: {icn}",
            ctx.site_sta3n
        );

        let Some(dfn) = ctx.resolver.resolve(icn.as_str()) else {
            tracing::info!(
                "[Site {}] Patient {icn} not registered here; empty allergy list",
                ctx.site_sta3n
            );
            return Ok(String::new());
        };

        let allergies = ctx.domain.allergies_for(dfn);
        if allergies.is_empty() {
            tracing::info!(
                "[Site {}] No allergies found for patient {icn} (DFN: {dfn})",
                ctx.site_sta3n
            );
            return Ok(String::new());
        }

        let site_sta3n = ctx.site_sta3n.to_owned();
        let rows: Vec<Vec<Option<String>>> = allergies
            .into_iter()
            .map(|allergy| {
                vec![
                    Some(allergy.allergen_name),
                    Some(allergy.severity),
                    Some(allergy.reaction_datetime),
                    Some(allergy.reactions),
                    Some(allergy.allergy_type),
                    Some(allergy.originating_site.unwrap_or_else(|| site_sta3n.clone())),
                    Some(allergy.entered_by),
                ]
            })
            .collect();
        tracing::info!(
            "[Site {}] Returning {} allergies for patient {icn}",
            ctx.site_sta3n,
            rows.len()
        );
        Ok(codec::pack_records(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainData;
    use crate::testsupport::TestSite;

    fn allergies_fixture() -> Vec<crate::domain::AllergyRecord> {
        serde_json::from_value(serde_json::json!([
            {"dfn": "100001", "allergen_name": "PENICILLIN", "severity": "SEVERE",
             "reaction_datetime": "3251120.0930", "reactions": "HIVES,ITCHING,RASH",
             "allergy_type": "DRUG", "originating_site": "200",
             "entered_by": "PHARMACIST,JOHN"},
            {"dfn": "100001", "allergen_name": "SHELLFISH", "severity": "MODERATE",
             "reaction_datetime": "3250815.1445", "reactions": "NAUSEA,VOMITING",
             "allergy_type": "FOOD", "entered_by": "NURSE,SARAH"}
        ]))
        .expect("valid allergies")
    }

    #[test]
    fn reports_rpc_name() {
        assert_eq!(AllergiesListHandler.rpc_name(), "ORQQAL LIST");
    }

    #[test]
    fn formats_one_line_per_allergy_with_site_default() {
        let site = TestSite::with_domain(
            "200",
            DomainData::empty("200").with_allergies(allergies_fixture()),
        );

        let payload = AllergiesListHandler
            .execute(&[Value::String("ICN100001".into())], &site.ctx())
            .expect("execute");
        let lines: Vec<&str> = payload.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "PENICILLIN^SEVERE^3251120.0930^HIVES,ITCHING,RASH^DRUG^200^PHARMACIST,JOHN"
        );
        // No originating_site in the fixture: the serving site fills in.
        assert_eq!(
            lines[1],
            "SHELLFISH^MODERATE^3250815.1445^NAUSEA,VOMITING^FOOD^200^NURSE,SARAH"
        );
    }

    #[test]
    fn unregistered_patient_is_empty_not_error() {
        let site = TestSite::new("200");
        let payload = AllergiesListHandler
            .execute(&[Value::String("ICN100013".into())], &site.ctx())
            .expect("execute");
        assert_eq!(payload, "");
    }

    #[test]
    fn known_patient_without_allergies_is_empty() {
        let site = TestSite::new("200");
        let payload = AllergiesListHandler
            .execute(&[Value::String("ICN100001".into())], &site.ctx())
            .expect("execute");
        assert_eq!(payload, "");
    }
}
