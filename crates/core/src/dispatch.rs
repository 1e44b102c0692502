//! RPC handler contract and registry.
//!
//! Every remote procedure is implemented by one stateless [`RpcHandler`]; the
//! [`RpcRegistry`] maps RPC names to handler trait objects and dispatches
//! incoming requests. Handlers hold no per-request state, so a single
//! instance serves arbitrarily many concurrent requests.
//!
//! The dispatcher is the containment boundary for handler faults: a panic
//! inside a handler is caught and rewrapped as a structured execution error,
//! never propagated raw to the transport.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use serde_json::Value;

use crate::domain::DomainData;
use crate::error::{DispatchError, DispatchResult};
use crate::identity::IdentityResolver;

/// Per-request execution context supplied to every handler.
///
/// Carries the serving site's identity resolver and domain data; both are
/// startup-built and read-only, so the context is cheap to assemble per
/// request.
pub struct RequestContext<'a> {
    pub site_sta3n: &'a str,
    pub resolver: &'a IdentityResolver,
    pub domain: &'a DomainData,
    /// Correlation id for logging only.
    pub request_id: &'a str,
}

/// One named remote procedure.
pub trait RpcHandler: Send + Sync {
    /// The RPC name this handler responds to (e.g. `"ORWPT PTINQ"`).
    fn rpc_name(&self) -> &'static str;

    /// Cheap, side-effect-free parameter validation, run before any lookup.
    ///
    /// The first parameter is always the patient's enterprise identifier;
    /// implementations must reject a missing, null, non-string, or empty
    /// identifier with a descriptive error.
    fn validate_params(&self, params: &[Value]) -> DispatchResult<()>;

    /// Execute the RPC and produce a wire-formatted payload.
    ///
    /// A `-1^message` payload is a valid *successful* result (the clinical
    /// answer "not found here"); only system faults use the error channel.
    fn execute(&self, params: &[Value], ctx: &RequestContext<'_>) -> DispatchResult<String>;
}

/// Registry mapping RPC names to handlers.
#[derive(Default)]
pub struct RpcRegistry {
    handlers: HashMap<String, Arc<dyn RpcHandler>>,
}

impl RpcRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its RPC name.
    ///
    /// Re-registering a name overwrites the previous handler; that is logged,
    /// not rejected, so tests can swap handlers in.
    pub fn register(&mut self, handler: Arc<dyn RpcHandler>) {
        let rpc_name = handler.rpc_name();
        if self.handlers.contains_key(rpc_name) {
            tracing::warn!("Overwriting existing handler for RPC: {rpc_name}");
        }
        self.handlers.insert(rpc_name.to_owned(), handler);
        tracing::debug!("Registered handler for RPC: {rpc_name}");
    }

    pub fn get_handler(&self, rpc_name: &str) -> Option<&Arc<dyn RpcHandler>> {
        self.handlers.get(rpc_name)
    }

    /// Dispatch a request to the handler registered under `rpc_name`.
    ///
    /// An unknown name is a structured error listing the available RPCs.
    /// Validation errors propagate as such; a handler panic is caught here
    /// and rewrapped as an execution error carrying the panic message.
    pub fn dispatch(
        &self,
        rpc_name: &str,
        params: &[Value],
        ctx: &RequestContext<'_>,
    ) -> DispatchResult<String> {
        let Some(handler) = self.get_handler(rpc_name) else {
            tracing::error!("RPC not found: {rpc_name}");
            return Err(DispatchError::NotRegistered {
                name: rpc_name.to_owned(),
                available: self.list_rpcs().join(", "),
            });
        };

        tracing::debug!("Dispatching RPC: {rpc_name} [request {}]", ctx.request_id);
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            handler.validate_params(params)?;
            handler.execute(params, ctx)
        }));

        match outcome {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(err)) => {
                tracing::error!("RPC {rpc_name} failed: {err}");
                Err(err)
            }
            Err(panic) => {
                let message = panic_message(&*panic);
                tracing::error!("RPC {rpc_name} panicked: {message}");
                Err(DispatchError::execution(
                    rpc_name,
                    format!("Execution failed: {message}"),
                    None,
                ))
            }
        }
    }

    /// Registered RPC names in sorted order.
    pub fn list_rpcs(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_registered(&self, rpc_name: &str) -> bool {
        self.handlers.contains_key(rpc_name)
    }

    pub fn count(&self) -> usize {
        self.handlers.len()
    }

    /// Remove a handler. Returns whether one was registered.
    pub fn unregister(&mut self, rpc_name: &str) -> bool {
        if self.handlers.remove(rpc_name).is_some() {
            tracing::debug!("Unregistered handler for RPC: {rpc_name}");
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        let count = self.handlers.len();
        self.handlers.clear();
        tracing::debug!("Cleared {count} RPC handlers from registry");
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_owned()
    }
}
