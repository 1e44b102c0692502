//! Inpatient encounter RPCs.

use serde_json::Value;

use crate::codec;
use crate::dispatch::{RequestContext, RpcHandler};
use crate::error::{DispatchError, DispatchResult};
use crate::handlers::icn_param;

const DEFAULT_DAYS_BACK: i64 = 90;

/// Handler for `ORWCV ADMISSIONS` — inpatient admissions and discharges.
///
/// One record per encounter:
/// `INPATIENT_ID^ADMIT_DATE_TIME^ADMIT_LOCATION^STATUS^DISCHARGE_DATE_TIME^DISCHARGE_LOCATION^LOS^DIAGNOSIS_CODE^ADMIT_PROVIDER`,
/// with empty discharge fields while an admission is still active.
///
/// Accepts an optional second `DAYS_BACK` parameter (integer or numeric
/// string, default 90). The source system validates and parses it without
/// filtering on it; that is preserved rather than inventing a window rule.
pub struct AdmissionsHandler;

impl AdmissionsHandler {
    fn days_back(params: &[Value]) -> DispatchResult<i64> {
        let Some(raw) = params.get(1) else {
            return Ok(DEFAULT_DAYS_BACK);
        };
        match raw {
            Value::Null => Ok(DEFAULT_DAYS_BACK),
            Value::Number(n) => n.as_i64().ok_or_else(|| {
                DispatchError::Validation(format!("Invalid DAYS_BACK parameter: {raw}"))
            }),
            Value::String(s) if s.trim().is_empty() => Ok(DEFAULT_DAYS_BACK),
            Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
                DispatchError::Validation(format!("Invalid DAYS_BACK parameter: {raw}"))
            }),
            _ => Err(DispatchError::Validation(format!(
                "Invalid DAYS_BACK parameter: {raw}"
            ))),
        }
    }
}

impl RpcHandler for AdmissionsHandler {
    fn rpc_name(&self) -> &'static str {
        "ORWCV ADMISSIONS"
    }

    fn validate_params(&self, params: &[Value]) -> DispatchResult<()> {
        icn_param(self.rpc_name(), params)?;
        Self::days_back(params).map(|_| ())
    }

    fn execute(&self, params: &[Value], ctx: &RequestContext<'_>) -> DispatchResult<String> {
        let icn = icn_param(self.rpc_name(), params)?;
        let days_back = Self::days_back(params)?;
        tracing::info!(
            "[Site {}] ORWCV ADMISSIONS called for ICN: {icn} (days_back: {days_back})",
            ctx.site_sta3n
        );

        let Some(dfn) = ctx.resolver.resolve(icn.as_str()) else {
            tracing::warn!(
                "[Site {}] Patient {icn} not found in registry",
                ctx.site_sta3n
            );
            return Ok(codec::pack_error_default(&format!(
                "Patient {icn} not registered at site {}",
                ctx.site_sta3n
            )));
        };

        let encounters = ctx.domain.encounters_for(dfn);
        if encounters.is_empty() {
            tracing::info!(
                "[Site {}] No encounters found for patient {icn} (DFN: {dfn})",
                ctx.site_sta3n
            );
            return Ok(String::new());
        }

        let rows: Vec<Vec<Option<String>>> = encounters
            .into_iter()
            .map(|enc| {
                vec![
                    Some(enc.inpatient_id),
                    Some(enc.admit_datetime),
                    Some(enc.admit_location),
                    Some(enc.status),
                    Some(enc.discharge_datetime),
                    Some(enc.discharge_location),
                    Some(enc.length_of_stay),
                    Some(enc.diagnosis_code),
                    Some(enc.admit_provider),
                ]
            })
            .collect();
        tracing::info!(
            "[Site {}] Returning {} encounters for patient {icn}",
            ctx.site_sta3n,
            rows.len()
        );
        Ok(codec::pack_records(&rows))
    }
}
