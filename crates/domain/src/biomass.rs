//! Biomass and carbon stock estimated from annual net primary production.
//!
//! The conversion chain is fixed:
//!
//! | Step | Formula |
//! |------|---------|
//! | NPP (kg C/m²/yr) | raw × 0.0001 |
//! | biomass (kg/m²) | NPP × 2.5 |
//! | biomass (kg/ha) | kg/m² × 10 000 |
//! | total biomass (kg) | kg/ha × area (ha) |
//! | carbon stock (kg) | total × 0.5 |
//! | CO2e (t) | carbon / 1000 × 44/12 |

use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::geometry::GeometryInput;
use crate::request::{DefaultValue, FieldKind, OptionalField, RequestSchema};
use crate::statistics::RawStatistics;
use crate::units::{SQUARE_METERS_PER_HECTARE, round_index, round_quantity, square_meters_to_hectares};

/// Annual NPP collection.
pub const DATASET: &str = "MODIS/006/MOD17A3HGF";
/// Band holding NPP in the collection.
pub const NPP_BAND: &str = "Npp";
/// Native resolution of the collection, in metres.
pub const SCALE_M: f64 = 500.0;

/// Raw band value → kg C/m²/yr.
pub const NPP_SCALE_FACTOR: f64 = 0.0001;
/// NPP → standing biomass.
pub const NPP_TO_BIOMASS: f64 = 2.5;
/// Carbon fraction of dry biomass.
pub const CARBON_FRACTION: f64 = 0.5;
/// Molecular weight ratio CO2 / C.
pub const CO2_PER_CARBON: f64 = 44.0 / 12.0;
pub const KG_PER_TONNE: f64 = 1000.0;

pub const DEFAULT_YEAR: i64 = 2023;
pub const DEFAULT_PROJECT_TYPE: &str = "Silvopastoreo";

pub const METHODOLOGY: &str = "MODIS_NPP_converted";
pub const NOTES: &str = "Biomass estimated from MODIS NPP using standard conversion factors";

pub const SCHEMA: RequestSchema = RequestSchema {
    geometry_field: "geometry",
    required: &[],
    optional: &[
        OptionalField {
            name: "project_type",
            kind: FieldKind::Text,
            default: DefaultValue::Text(DEFAULT_PROJECT_TYPE),
        },
        OptionalField {
            name: "year",
            kind: FieldKind::Integer,
            default: DefaultValue::Integer(DEFAULT_YEAR),
        },
    ],
};

/// A validated biomass request.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomassRequest {
    pub geometry: GeometryInput,
    pub project_type: String,
    pub year: i64,
}

impl BiomassRequest {
    /// Validate a raw body against [`SCHEMA`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the body or geometry is missing, or
    /// a field has the wrong type.
    pub fn from_body(body: Option<&Value>) -> Result<Self, ValidationError> {
        let request = SCHEMA.validate(body)?;
        Ok(Self {
            project_type: request.text("project_type")?,
            year: request.integer("year")?,
            geometry: request.geometry,
        })
    }

    /// First day of the requested year (`YYYY-01-01`).
    #[must_use]
    pub fn start_date(&self) -> String {
        format!("{}-01-01", self.year)
    }

    /// Last day of the requested year (`YYYY-12-31`).
    #[must_use]
    pub fn end_date(&self) -> String {
        format!("{}-12-31", self.year)
    }
}

/// Read the raw NPP band mean. A missing or `null` value counts as zero.
#[must_use]
pub fn raw_npp(stats: &RawStatistics) -> f64 {
    stats.number(NPP_BAND).unwrap_or(0.0)
}

/// Response payload of `POST /calculate-biomass`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiomassReport {
    pub biomass_kg_ha: f64,
    pub total_biomass_kg: f64,
    pub carbon_stock_kg: f64,
    pub carbon_tco2e: f64,
    pub area_ha: f64,
    pub npp_kg_c_m2_year: f64,
    pub project_type: String,
    pub year: i64,
    pub methodology: &'static str,
    pub data_source: &'static str,
    pub notes: &'static str,
}

impl BiomassReport {
    /// Apply the conversion chain. Intermediates stay unrounded; only the
    /// emitted fields are rounded.
    #[must_use]
    pub fn compute(raw_npp: f64, area_m2: f64, request: &BiomassRequest) -> Self {
        let npp = raw_npp * NPP_SCALE_FACTOR;
        let area_ha = square_meters_to_hectares(area_m2);
        let biomass_kg_m2 = npp * NPP_TO_BIOMASS;
        let biomass_kg_ha = biomass_kg_m2 * SQUARE_METERS_PER_HECTARE;
        let total_biomass_kg = biomass_kg_ha * area_ha;
        let carbon_stock_kg = total_biomass_kg * CARBON_FRACTION;
        let carbon_tco2e = carbon_stock_kg / KG_PER_TONNE * CO2_PER_CARBON;

        Self {
            biomass_kg_ha: round_quantity(biomass_kg_ha),
            total_biomass_kg: round_quantity(total_biomass_kg),
            carbon_stock_kg: round_quantity(carbon_stock_kg),
            carbon_tco2e: round_quantity(carbon_tco2e),
            area_ha: round_quantity(area_ha),
            npp_kg_c_m2_year: round_index(npp),
            project_type: request.project_type.clone(),
            year: request.year,
            methodology: METHODOLOGY,
            data_source: DATASET,
            notes: NOTES,
        }
    }
}
