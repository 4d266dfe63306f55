//! # afolu-adapter-earth-engine
//!
//! Earth Engine REST adapter.
//!
//! ## Responsibilities
//!
//! - Encode imagery descriptions into Earth Engine expression graphs
//!   ([`encode`], [`expr`]) and evaluate them with `value:compute`
//! - Implement [`ImageryPlatform`](afolu_app::ports::ImageryPlatform) for
//!   [`EarthEngine`]
//! - Provide the credential strategies (metadata server, service account) and
//!   the Secret Manager [`SecretStore`](afolu_app::ports::SecretStore)
//! - Convert Google API failures into domain errors
//!
//! ## Dependency rule
//!
//! Depends on `afolu-domain` and `afolu-app`. Nothing depends on this crate
//! except the binary.

pub mod client;
pub mod compute;
pub mod config;
pub mod credentials;
pub mod encode;
pub mod error;
pub mod expr;
mod http;
pub mod secret_manager;
#[cfg(test)]
mod testing;

pub use client::EarthEngine;
pub use config::{DefaultCredentials, EarthEngineConfig};
pub use error::EarthEngineError;
