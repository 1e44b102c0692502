//! Request routing.
//!
//! The [`Broker`] owns one immutable [`SiteRuntime`] per configured site —
//! the site's identity resolver, domain data, and RPC registry, all built
//! once during startup. Routing a request means selecting the runtime for
//! the requested station number, optionally simulating processing latency,
//! and handing the request to that site's dispatcher.
//!
//! Two error channels leave this layer and must stay distinct: a dispatch
//! failure becomes `success=false` with a human-readable message, while a
//! wire-level `-1^…` domain payload is a successful response like any other.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::{BrokerConfig, LatencyWindow};
use crate::dispatch::{RequestContext, RpcRegistry};
use crate::domain::DomainData;
use crate::error::{BrokerError, BrokerResult, ConfigResult};
use crate::handlers;
use crate::identity::{IdentityResolver, PatientRegistry};
use crate::sites::{Site, SiteDirectory};

/// Everything one site needs to serve requests.
pub struct SiteRuntime {
    site: Site,
    resolver: IdentityResolver,
    domain: DomainData,
    registry: RpcRegistry,
}

impl SiteRuntime {
    pub fn new(
        site: Site,
        resolver: IdentityResolver,
        domain: DomainData,
        registry: RpcRegistry,
    ) -> Self {
        Self {
            site,
            resolver,
            domain,
            registry,
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn registry(&self) -> &RpcRegistry {
        &self.registry
    }
}

/// The external response shape for one RPC execution.
#[derive(Clone, Debug, Serialize)]
pub struct RpcOutcome {
    pub success: bool,
    pub response: Option<String>,
    pub error: Option<String>,
    pub site: String,
    pub rpc: String,
}

/// Introspection summary for one site.
#[derive(Clone, Debug, Serialize)]
pub struct SiteSummary {
    pub sta3n: String,
    pub name: String,
    pub rpcs_registered: usize,
    pub patients_registered: usize,
}

/// The multi-site RPC broker.
pub struct Broker {
    sites: BTreeMap<String, SiteRuntime>,
    latency: Option<LatencyWindow>,
}

impl Broker {
    /// Build every site runtime from the configured fixture tree.
    ///
    /// Fails fast on a missing or malformed site list, patient registry, or
    /// domain fixture file; a site with no domain fixture directory simply
    /// has no data.
    pub fn initialise(config: &BrokerConfig) -> ConfigResult<Self> {
        let directory = SiteDirectory::load(&config.sites_path())?;
        let patient_registry = Arc::new(PatientRegistry::load(&config.registry_path())?);

        let mut sites = BTreeMap::new();
        for site in directory.iter() {
            tracing::info!("Initialising site {}...", site.sta3n);
            let resolver =
                IdentityResolver::new(site.sta3n.clone(), Arc::clone(&patient_registry));
            let domain = DomainData::load(site.sta3n.clone(), &config.site_data_dir(&site.sta3n))?;
            let registry = handlers::default_registry();
            tracing::info!(
                "Site {} initialised: {} RPCs, {} patients",
                site.sta3n,
                registry.count(),
                resolver.patient_count()
            );
            sites.insert(
                site.sta3n.clone(),
                SiteRuntime::new(site.clone(), resolver, domain, registry),
            );
        }

        tracing::info!("Broker ready: {} sites initialised", sites.len());
        Ok(Self {
            sites,
            latency: config.latency(),
        })
    }

    /// Assemble a broker from pre-built runtimes.
    pub fn from_runtimes(
        runtimes: Vec<SiteRuntime>,
        latency: Option<LatencyWindow>,
    ) -> Self {
        let sites = runtimes
            .into_iter()
            .map(|runtime| (runtime.site.sta3n.clone(), runtime))
            .collect();
        Self { sites, latency }
    }

    /// Execute one RPC at one site.
    ///
    /// An unknown station number fails before any dispatch. The simulated
    /// latency is a cooperative async sleep, so waiting requests do not hold
    /// a worker thread.
    pub async fn execute(
        &self,
        sta3n: &str,
        rpc_name: &str,
        params: &[Value],
    ) -> BrokerResult<RpcOutcome> {
        let Some(runtime) = self.sites.get(sta3n) else {
            return Err(BrokerError::UnknownSite {
                sta3n: sta3n.to_owned(),
                available: self.sta3ns().join(", "),
            });
        };

        if let Some(window) = self.latency {
            let delay = window.sample();
            tracing::debug!(
                "Simulating {}ms latency for {sta3n}:{rpc_name}",
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let request_id = uuid::Uuid::new_v4().simple().to_string();
        let ctx = RequestContext {
            site_sta3n: sta3n,
            resolver: &runtime.resolver,
            domain: &runtime.domain,
            request_id: &request_id,
        };

        match runtime.registry.dispatch(rpc_name, params, &ctx) {
            Ok(payload) => {
                tracing::info!("RPC executed successfully: {sta3n}:{rpc_name}");
                Ok(RpcOutcome {
                    success: true,
                    response: Some(payload),
                    error: None,
                    site: sta3n.to_owned(),
                    rpc: rpc_name.to_owned(),
                })
            }
            Err(err) => {
                tracing::error!("RPC execution error: {sta3n}:{rpc_name} - {err}");
                Ok(RpcOutcome {
                    success: false,
                    response: None,
                    error: Some(err.to_string()),
                    site: sta3n.to_owned(),
                    rpc: rpc_name.to_owned(),
                })
            }
        }
    }

    /// Per-site introspection summaries, in station-number order.
    pub fn site_summaries(&self) -> Vec<SiteSummary> {
        self.sites
            .values()
            .map(|runtime| SiteSummary {
                sta3n: runtime.site.sta3n.clone(),
                name: runtime.site.name.clone(),
                rpcs_registered: runtime.registry.count(),
                patients_registered: runtime.resolver.patient_count(),
            })
            .collect()
    }

    /// Station numbers in ascending order.
    pub fn sta3ns(&self) -> Vec<String> {
        self.sites.keys().cloned().collect()
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport;

    fn test_broker() -> Broker {
        let registry = testsupport::patient_registry();
        let runtimes = ["200", "500"]
            .into_iter()
            .map(|sta3n| {
                let site = Site {
                    sta3n: sta3n.to_owned(),
                    name: format!("SITE {sta3n}"),
                    description: String::new(),
                };
                let resolver = IdentityResolver::new(sta3n, Arc::clone(&registry));
                let domain = DomainData::empty(sta3n).with_vitals(
                    serde_json::from_value(serde_json::json!([
                        {"dfn": "100001", "type": "PULSE", "value": "72", "units": "/min",
                         "date_time": "T-0.0930", "entered_by": "NURSE,JANE"}
                    ]))
                    .expect("valid vitals"),
                );
                SiteRuntime::new(site, resolver, domain, handlers::default_registry())
            })
            .collect();
        Broker::from_runtimes(runtimes, None)
    }

    #[tokio::test]
    async fn unknown_site_is_a_routing_error() {
        let broker = test_broker();
        let err = broker
            .execute("999", "ORWPT PTINQ", &[Value::String("ICN100001".into())])
            .await
            .expect_err("unknown site");
        let message = err.to_string();
        assert!(message.contains("Site 999 not found"));
        assert!(message.contains("200"));
    }

    #[tokio::test]
    async fn vitals_scenario_resolves_relative_dates() {
        let broker = test_broker();
        let outcome = broker
            .execute("200", "GMV LATEST VM", &[Value::String("ICN100001".into())])
            .await
            .expect("routed");

        assert!(outcome.success);
        assert_eq!(outcome.site, "200");
        assert_eq!(outcome.rpc, "GMV LATEST VM");
        let payload = outcome.response.expect("payload");
        let today = chrono::Local::now().date_naive();
        let expected = format!(
            "PULSE^72^/min^{}.0930^NURSE,JANE",
            crate::fmdate::encode(today)
        );
        assert_eq!(payload, expected);
    }

    #[tokio::test]
    async fn dispatch_is_idempotent() {
        let broker = test_broker();
        let params = [Value::String("ICN100001".into())];
        let first = broker
            .execute("200", "ORWPT PTINQ", &params)
            .await
            .expect("routed");
        let second = broker
            .execute("200", "ORWPT PTINQ", &params)
            .await
            .expect("routed");
        assert_eq!(first.response, second.response);
        assert_eq!(first.response.as_deref(), Some("DOOREE,ADAM^666-12-6789^2800102^M^VETERAN"));
    }

    #[tokio::test]
    async fn dispatch_error_and_domain_error_use_distinct_channels() {
        let broker = test_broker();

        // Unknown RPC: dispatch-level failure, success=false.
        let outcome = broker
            .execute("200", "NO SUCH RPC", &[Value::String("ICN100001".into())])
            .await
            .expect("routed");
        assert!(!outcome.success);
        assert!(outcome.response.is_none());
        assert!(outcome.error.expect("error").contains("not registered"));

        // Unregistered patient on an administrative RPC: a successful
        // dispatch whose payload is the domain's own error form.
        let outcome = broker
            .execute("500", "ORWPT PTINQ", &[Value::String("ICN100013".into())])
            .await
            .expect("routed");
        assert!(outcome.success);
        assert!(outcome.error.is_none());
        let payload = outcome.response.expect("payload");
        assert!(payload.starts_with("-1^"));
        assert!(payload.contains("site 500"));
    }

    #[tokio::test]
    async fn validation_failure_surfaces_as_error() {
        let broker = test_broker();
        let outcome = broker
            .execute("200", "GMV LATEST VM", &[])
            .await
            .expect("routed");
        assert!(!outcome.success);
        assert!(outcome.error.expect("error").contains("requires 1 parameter"));
    }

    #[tokio::test]
    async fn latency_window_delays_but_does_not_change_results() {
        let registry = testsupport::patient_registry();
        let site = Site {
            sta3n: "200".to_owned(),
            name: "SITE 200".to_owned(),
            description: String::new(),
        };
        let runtime = SiteRuntime::new(
            site,
            IdentityResolver::new("200", registry),
            DomainData::empty("200"),
            handlers::default_registry(),
        );
        let broker = Broker::from_runtimes(
            vec![runtime],
            Some(LatencyWindow::new(5, 10).expect("window")),
        );

        let started = std::time::Instant::now();
        let outcome = broker
            .execute("200", "ORWPS COVER", &[Value::String("ICN100013".into())])
            .await
            .expect("routed");
        assert!(started.elapsed() >= std::time::Duration::from_millis(5));
        assert!(outcome.success);
        assert_eq!(outcome.response.as_deref(), Some(""));
    }

    #[test]
    fn summaries_report_per_site_counts() {
        let broker = test_broker();
        let summaries = broker.site_summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].sta3n, "200");
        assert_eq!(summaries[0].rpcs_registered, 6);
        assert_eq!(summaries[0].patients_registered, 2);
        assert_eq!(broker.sta3ns(), vec!["200", "500"]);
        assert_eq!(broker.site_count(), 2);
    }
}
