//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod biomass;
pub mod land_cover;
pub mod ndvi;
pub mod pipeline;
pub mod session;
#[cfg(test)]
mod testing;

pub use biomass::BiomassAnalysis;
pub use land_cover::LandCoverAnalysis;
pub use ndvi::NdviAnalysis;
pub use pipeline::{Analysis, AnalysisService};
pub use session::{FallbackAuthenticator, SessionManager};
