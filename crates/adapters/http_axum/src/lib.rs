//! # afolu-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the one **analysis endpoint** of the configured service
//!   (`/calculate-biomass`, `/get-landcover` or `/calculate-ndvi`)
//! - Serve `GET /health` and, for the NDVI service, `GET /` metadata
//! - Tag every request with an `x-request-id` and a tracing span
//! - Map the analysis error taxonomy onto status codes and JSON bodies
//!
//! ## Dependency rule
//! Depends on `afolu-app` (for port traits and services) and `afolu-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod request_id;
pub mod router;
pub mod state;
