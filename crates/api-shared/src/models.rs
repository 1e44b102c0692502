//! Request and response models for the RPC broker API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /rpc/execute`.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct RpcExecuteReq {
    /// RPC name (e.g. `"ORWPT PTINQ"`).
    pub name: String,
    /// Ordered positional RPC parameters.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub params: Vec<serde_json::Value>,
}

/// Result of one RPC execution.
///
/// `success=false` carries a dispatch-level failure in `error`; a wire-level
/// `-1^…` payload is a successful execution and arrives in `response`.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct RpcExecuteRes {
    /// Whether RPC dispatch and execution succeeded.
    pub success: bool,
    /// Wire-formatted response payload, when successful.
    pub response: Option<String>,
    /// Human-readable failure message, when not.
    pub error: Option<String>,
    /// Echoed site station number.
    pub site: String,
    /// Echoed RPC name.
    pub rpc: String,
}

/// One entry of `GET /sites`.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct SiteInfo {
    /// Station number.
    pub sta3n: String,
    /// Site display name.
    pub name: String,
    /// Number of registered RPCs.
    pub rpcs_registered: usize,
    /// Number of patients registered at the site.
    pub patients_registered: usize,
}

/// Response of `GET /health`.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
    pub sites_initialized: usize,
    pub sites: Vec<String>,
}

/// Response of `GET /` — the service banner.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct BannerRes {
    pub service: String,
    pub version: String,
    pub status: String,
    pub sites: usize,
    pub endpoints: BTreeMap<String, String>,
}

/// Error body for request-level failures (e.g. unknown site).
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_request_defaults_params_to_empty() {
        let req: RpcExecuteReq =
            serde_json::from_str(r#"{"name": "ORWPT PTINQ"}"#).expect("valid request");
        assert_eq!(req.name, "ORWPT PTINQ");
        assert!(req.params.is_empty());
    }

    #[test]
    fn execute_response_round_trips() {
        let res = RpcExecuteRes {
            success: true,
            response: Some("DOOREE,ADAM^666-12-6789^2800102^M^VETERAN".into()),
            error: None,
            site: "200".into(),
            rpc: "ORWPT PTINQ".into(),
        };
        let json = serde_json::to_string(&res).expect("serialize");
        let back: RpcExecuteRes = serde_json::from_str(&json).expect("deserialize");
        assert!(back.success);
        assert_eq!(back.response, res.response);
        assert_eq!(back.error, None);
    }
}
