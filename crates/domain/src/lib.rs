//! # afolu-domain
//!
//! Pure domain model for the AFOLU imagery analysis services.
//!
//! ## Responsibilities
//! - Foundational types: error taxonomy, unit helpers, service identity
//! - Define the **request schemas** (required fields, defaults, type checks)
//! - Define **raw statistics** as returned by an imagery platform reduction
//! - Define the three **response formatters** (biomass, land cover, NDVI) and
//!   the constants they must apply exactly
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod geometry;
pub mod request;
pub mod service;
pub mod statistics;
pub mod units;

pub mod biomass;
pub mod land_cover;
pub mod ndvi;
