//! # afolu-app
//!
//! Application layer: the analysis pipeline and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ImageryPlatform`: geometry, area, region reductions and scene series
//!   - `CredentialStrategy`: one way of obtaining a platform access token
//!   - `SecretStore`: read the latest version of a named secret
//! - Define the **driving/inbound** use-cases:
//!   - `AnalysisService`: validate → run on the platform → format, under a deadline
//!   - `BiomassAnalysis`, `LandCoverAnalysis`, `NdviAnalysis`: the three pipelines
//!   - `FallbackAuthenticator` and `SessionManager`: platform session lifecycle
//!
//! ## Dependency rule
//! Depends on `afolu-domain` only (plus `tokio::sync`/`tokio::time`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
