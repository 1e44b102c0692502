//! Problem-list RPCs.

use serde_json::Value;

use crate::codec;
use crate::dispatch::{RequestContext, RpcHandler};
use crate::error::DispatchResult;
use crate::handlers::icn_param;

/// Handler for `ORQQPL LIST` — patient problem list.
///
/// One record per problem, all statuses included:
/// `PROBLEM_IEN^PROBLEM_TEXT^ICD10_CODE^STATUS^ONSET_DATE^SERVICE_CONNECTED^SNOMED_CODE^UPDATED_TODAY`,
/// with the two flag fields rendered as `1`/`0`.
///
/// Both an unregistered patient and a registered patient with an empty list
/// answer with the empty string.
pub struct ProblemsListHandler;

impl RpcHandler for ProblemsListHandler {
    fn rpc_name(&self) -> &'static str {
        "ORQQPL LIST"
    }

    fn validate_params(&self, params: &[Value]) -> DispatchResult<()> {
        icn_param(self.rpc_name(), params).map(|_| ())
    }

    fn execute(&self, params: &[Value], ctx: &RequestContext<'_>) -> DispatchResult<String> {
        let icn = icn_param(self.rpc_name(), params)?;
        tracing::info!(
            "[Site {}] ORQQPL LIST called for ICN: {icn}",
            ctx.site_sta3n
        );

        let Some(dfn) = ctx.resolver.resolve(icn.as_str()) else {
            tracing::info!(
                "[Site {}] Patient {icn} not registered here; empty problem list",
                ctx.site_sta3n
            );
            return Ok(String::new());
        };

        let problems = ctx.domain.problems_for(dfn);
        if problems.is_empty() {
            tracing::info!(
                "[Site {}] No problems found for patient {icn} (DFN: {dfn})",
                ctx.site_sta3n
            );
            return Ok(String::new());
        }

        let rows: Vec<Vec<Option<String>>> = problems
            .into_iter()
            .map(|problem| {
                vec![
                    Some(problem.problem_ien),
                    Some(problem.problem_text),
                    Some(problem.icd10_code),
                    Some(problem.problem_status),
                    Some(problem.onset_date),
                    Some(flag(problem.service_connected)),
                    Some(problem.snomed_code),
                    Some(flag(problem.updated_today)),
                ]
            })
            .collect();
        tracing::info!(
            "[Site {}] Returning {} problems for patient {icn}",
            ctx.site_sta3n,
            rows.len()
        );
        Ok(codec::pack_records(&rows))
    }
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainData;
    use crate::testsupport::TestSite;

    fn problems_fixture() -> Vec<crate::domain::ProblemRecord> {
        serde_json::from_value(serde_json::json!([
            {"dfn": "100001", "problem_ien": 123,
             "problem_text": "Diabetes mellitus type 2", "icd10_code": "E11.9",
             "problem_status": "Active", "onset_date": "3230115",
             "service_connected": true, "snomed_code": "44054006"},
            {"dfn": "100001", "problem_ien": 456,
             "problem_text": "Acute exacerbation of COPD", "icd10_code": "J44.1",
             "problem_status": "Active", "onset_date": "T-0",
             "snomed_code": "195951007", "updated_today": true}
        ]))
        .expect("valid problems")
    }

    #[test]
    fn reports_rpc_name() {
        assert_eq!(ProblemsListHandler.rpc_name(), "ORQQPL LIST");
    }

    #[test]
    fn formats_flags_as_numeric_booleans() {
        let site = TestSite::with_domain(
            "200",
            DomainData::empty("200").with_problems(problems_fixture()),
        );

        let payload = ProblemsListHandler
            .execute(&[Value::String("ICN100001".into())], &site.ctx())
            .expect("execute");
        let lines: Vec<&str> = payload.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "123^Diabetes mellitus type 2^E11.9^Active^3230115^1^44054006^0"
        );
        // Second line has a T-0 onset resolved to today's FileMan date.
        let fields: Vec<&str> = lines[1].split('^').collect();
        assert_eq!(fields[0], "456");
        assert_eq!(fields[4].len(), 7);
        assert_eq!(fields[5], "0");
        assert_eq!(fields[7], "1");
    }

    #[test]
    fn unregistered_patient_is_empty_not_error() {
        let site = TestSite::new("200");
        let payload = ProblemsListHandler
            .execute(&[Value::String("ICN100013".into())], &site.ctx())
            .expect("execute");
        assert_eq!(payload, "");
    }

    #[test]
    fn known_patient_without_problems_is_empty() {
        let site = TestSite::new("200");
        let payload = ProblemsListHandler
            .execute(&[Value::String("ICN100001".into())], &site.ctx())
            .expect("execute");
        assert_eq!(payload, "");
    }
}
