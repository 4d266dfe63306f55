//! Service identity: which of the three analyses a process serves.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the independently deployed analysis services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Biomass,
    #[serde(alias = "land_cover")]
    Landcover,
    Ndvi,
}

impl ServiceKind {
    /// Name reported by `GET /health`.
    #[must_use]
    pub fn health_name(self) -> &'static str {
        match self {
            Self::Biomass => "biomass",
            Self::Landcover => "landcover",
            Self::Ndvi => "ndvi-calculator",
        }
    }

    /// Path of the analysis endpoint.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Biomass => "/calculate-biomass",
            Self::Landcover => "/get-landcover",
            Self::Ndvi => "/calculate-ndvi",
        }
    }

    /// Human-readable title used in service metadata.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Biomass => "Biomass Calculator",
            Self::Landcover => "Land Cover Calculator",
            Self::Ndvi => "NDVI Calculator",
        }
    }

    /// One-line description of the analysis endpoint.
    #[must_use]
    pub fn summary(self) -> &'static str {
        match self {
            Self::Biomass => "POST - Calculate biomass and carbon stock for an area",
            Self::Landcover => "POST - Calculate land cover distribution for an area",
            Self::Ndvi => "POST - Calculate NDVI for an area",
        }
    }

    /// Whether `GET /` exposes service metadata.
    #[must_use]
    pub fn exposes_metadata(self) -> bool {
        matches!(self, Self::Ndvi)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Biomass => "biomass",
            Self::Landcover => "landcover",
            Self::Ndvi => "ndvi",
        })
    }
}

/// Returned when a service name is not one of `biomass`, `landcover`, `ndvi`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service '{0}' (expected biomass, landcover or ndvi)")]
pub struct UnknownServiceError(pub String);

impl FromStr for ServiceKind {
    type Err = UnknownServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "biomass" => Ok(Self::Biomass),
            "landcover" | "land_cover" | "land-cover" => Ok(Self::Landcover),
            "ndvi" => Ok(Self::Ndvi),
            other => Err(UnknownServiceError(other.to_string())),
        }
    }
}
