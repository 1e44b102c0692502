//! Error types for the broker core.
//!
//! Three distinct layers, which must never be conflated:
//! - [`ConfigError`]: startup failures (missing or malformed fixture
//!   resources). The process fails fast on these.
//! - [`DispatchError`]: request-level failures (bad parameters, unknown RPC,
//!   handler faults). Surfaced to the transport as `success=false`.
//! - [`BrokerError`]: routing failures (unknown site). Surfaced as a
//!   request-level failure before any dispatch happens.
//!
//! A wire-level `-1^message` payload is *not* an error in this taxonomy: it is
//! a successful dispatch whose clinical answer is "not found here", and it
//! flows through the normal success path.

use std::path::PathBuf;

/// Startup configuration and fixture-loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidInput(String),
    #[error("failed to read fixture resource {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in fixture resource {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid site record: {0}")]
    InvalidSite(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Request-level failures raised at or below the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Malformed or missing RPC parameters, rejected before any lookup.
    #[error("{0}")]
    Validation(String),
    /// No handler is registered under the requested name.
    #[error("RPC '{name}' not registered. Available RPCs: {available}")]
    NotRegistered { name: String, available: String },
    /// A handler failed while executing; the original cause is preserved.
    #[error("RPC '{rpc}' failed: {message}")]
    Execution {
        rpc: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DispatchError {
    /// Wrap a handler fault, keeping the cause for diagnostics.
    pub fn execution(
        rpc: impl Into<String>,
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        DispatchError::Execution {
            rpc: rpc.into(),
            message: message.into(),
            source,
        }
    }
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// Routing failures raised before dispatch.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Site {sta3n} not found. Available sites: {available}")]
    UnknownSite { sta3n: String, available: String },
}

pub type BrokerResult<T> = std::result::Result<T, BrokerError>;
