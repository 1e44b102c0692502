//! Outpatient pharmacy RPCs.

use serde_json::Value;

use crate::codec;
use crate::dispatch::{RequestContext, RpcHandler};
use crate::error::DispatchResult;
use crate::handlers::icn_param;

/// Handler for `ORWPS COVER` — active outpatient medications (cover sheet).
///
/// One record per active prescription:
/// `RX_NUMBER^DRUG_NAME^STATUS^QUANTITY/DAYS_SUPPLY^REFILLS_REMAINING^ISSUE_DATE^EXPIRATION_DATE`.
/// Only records with status `ACTIVE` are returned, so the status field is
/// always `ACTIVE` on this RPC. Quantity and days supply share one field,
/// sub-delimited by `/`.
///
/// An unregistered patient and a patient with no active prescriptions both
/// answer with the empty string; "no medications" is data, not an error.
pub struct MedicationsCoverHandler;

impl RpcHandler for MedicationsCoverHandler {
    fn rpc_name(&self) -> &'static str {
        "ORWPS COVER"
    }

    fn validate_params(&self, params: &[Value]) -> DispatchResult<()> {
        icn_param(self.rpc_name(), params).map(|_| ())
    }

    fn execute(&self, params: &[Value], ctx: &RequestContext<'_>) -> DispatchResult<String> {
        let icn = icn_param(self.rpc_name(), params)?;
        tracing::info!(
            "[Site {}] ORWPS COVER called for ICN: {icn}",
            ctx.site_sta3n
        );

        let Some(dfn) = ctx.resolver.resolve(icn.as_str()) else {
            tracing::info!(
                "[Site {}] Patient {icn} not registered here; empty medication list",
                ctx.site_sta3n
            );
            return Ok(String::new());
        };

        let medications: Vec<_> = ctx
            .domain
            .medications_for(dfn)
            .into_iter()
            .filter(|med| med.status == "ACTIVE")
            .collect();
        if medications.is_empty() {
            tracing::info!(
                "[Site {}] No active medications found for patient {icn} (DFN: {dfn})",
                ctx.site_sta3n
            );
            return Ok(String::new());
        }

        let rows: Vec<Vec<Option<String>>> = medications
            .into_iter()
            .map(|med| {
                let qty_days = format!("{}/{}", med.quantity, med.days_supply);
                vec![
                    Some(med.rx_number),
                    Some(med.drug_name),
                    Some(med.status),
                    Some(qty_days),
                    Some(med.refills_remaining),
                    Some(med.issue_date),
                    Some(med.expiration_date),
                ]
            })
            .collect();
        tracing::info!(
            "[Site {}] Returning {} active medications for patient {icn}",
            ctx.site_sta3n,
            rows.len()
        );
        Ok(codec::pack_records(&rows))
    }
}
