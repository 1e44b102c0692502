//! # API shared
//!
//! Transport-facing types shared by the REST surface and the runner binary:
//! request/response models with OpenAPI schemas, and the health service.
//!
//! Uses no broker internals — the models mirror the external contract only.

#![warn(rust_2018_idioms)]

pub mod health;
pub mod models;

pub use health::HealthService;
pub use models::{BannerRes, ErrorDetail, HealthRes, RpcExecuteReq, RpcExecuteRes, SiteInfo};
