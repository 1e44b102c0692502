use crate::models::HealthRes;

/// Health reporting shared by the REST API and the runner binary.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Build the health response from the broker's site inventory.
    pub fn check_health(sites: Vec<String>) -> HealthRes {
        HealthRes {
            ok: true,
            message: "RPC broker is alive".into(),
            sites_initialized: sites.len(),
            sites,
        }
    }
}
