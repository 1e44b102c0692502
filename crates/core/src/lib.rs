//! # Broker core
//!
//! The RPC simulation engine for a multi-site clinical RPC broker: per-site
//! patient-identity resolution, RPC name→handler dispatch, domain handler
//! contracts, and the caret-delimited wire-format codec with its
//! relative-date fixture notation.
//!
//! Everything here is built once at startup from static fixture resources
//! and is immutable afterwards, so a single [`Broker`] instance serves
//! arbitrarily many concurrent requests without locking.
//!
//! **No API concerns**: HTTP routing, OpenAPI documentation, and transport
//! shapes belong in `api-rest` and `api-shared`.

#![warn(rust_2018_idioms)]

pub mod broker;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod fmdate;
pub mod handlers;
pub mod identity;
pub mod sites;

#[cfg(test)]
pub(crate) mod testsupport;

pub use broker::{Broker, RpcOutcome, SiteRuntime, SiteSummary};
pub use config::{resolve_fixture_dir, BrokerConfig, LatencyWindow};
pub use dispatch::{RequestContext, RpcHandler, RpcRegistry};
pub use domain::DomainData;
pub use error::{BrokerError, ConfigError, DispatchError};
pub use identity::{IdentityResolver, PatientRecord, PatientRegistry, SiteBinding};
pub use sites::{Site, SiteDirectory};
