//! # meridian-client: Sales Backend Access
//!
//! Network side of the register: configuration, the [`SalesBackend`] trait
//! and its HTTP implementation, reference data loading, and the checkout
//! submitter.
//!
//! ## Modules
//!
//! - [`config`] - Backend configuration (TOML + environment)
//! - [`backend`] - `SalesBackend` trait and response envelope
//! - [`http`] - reqwest implementation
//! - [`catalog`] - Reference data for one store context
//! - [`submitter`] - One create-sale call per order
//! - [`error`] - Client error types

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod submitter;

#[cfg(test)]
mod testing;

pub use backend::{ApiEnvelope, SalesBackend};
pub use catalog::ReferenceData;
pub use config::BackendConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use submitter::{CheckoutSubmitter, SaleReceipt};
