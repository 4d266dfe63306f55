//! Land cover distribution from a global classification raster.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{StatisticsError, ValidationError};
use crate::geometry::GeometryInput;
use crate::request::{DefaultValue, FieldKind, OptionalField, RequestSchema};
use crate::statistics::RawStatistics;
use crate::units::round_quantity;

/// Classification collection; the first image is used whatever the year.
pub const DATASET: &str = "ESA/WorldCover/v200";
pub const DATA_SOURCE: &str = "ESA WorldCover v200";
pub const SCALE_M: f64 = 10.0;
pub const RESOLUTION_M: u32 = 10;

/// Key under which a grouped reduction returns its groups.
pub const GROUPS_KEY: &str = "groups";
/// Name given to the class code inside each group.
pub const GROUP_NAME: &str = "class";
/// Key of the summed area inside each group.
pub const SUM_KEY: &str = "sum";

pub const DEFAULT_YEAR: i64 = 2021;

/// Closed lookup of class code → semantic name.
pub const CLASS_NAMES: [(u8, &str); 11] = [
    (10, "forest"),
    (20, "shrubland"),
    (30, "grassland"),
    (40, "cropland"),
    (50, "built_up"),
    (60, "bare_sparse"),
    (70, "snow_ice"),
    (80, "water"),
    (90, "herbaceous_wetland"),
    (95, "mangroves"),
    (100, "moss_lichen"),
];

pub const SCHEMA: RequestSchema = RequestSchema {
    geometry_field: "geometry",
    required: &[],
    optional: &[OptionalField {
        name: "year",
        kind: FieldKind::Integer,
        default: DefaultValue::Integer(DEFAULT_YEAR),
    }],
};

/// A validated land cover request.
#[derive(Debug, Clone, PartialEq)]
pub struct LandCoverRequest {
    pub geometry: GeometryInput,
    /// Echoed back only; the dataset epoch is fixed.
    pub year: i64,
}

impl LandCoverRequest {
    /// Validate a raw body against [`SCHEMA`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the body or geometry is missing, or
    /// `year` is not an integer.
    pub fn from_body(body: Option<&Value>) -> Result<Self, ValidationError> {
        let request = SCHEMA.validate(body)?;
        Ok(Self {
            year: request.integer("year")?,
            geometry: request.geometry,
        })
    }
}

/// Semantic name of a class code; codes outside the table become `unknown_<code>`.
#[must_use]
pub fn class_name(code: f64) -> Cow<'static, str> {
    CLASS_NAMES
        .iter()
        .find(|(known, _)| f64::from(*known) == code)
        .map_or_else(
            || Cow::Owned(format!("unknown_{code}")),
            |(_, name)| Cow::Borrowed(*name),
        )
}

/// Area of one class inside the geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassArea {
    pub code: f64,
    pub hectares: f64,
}

/// Read the grouped sums out of a reduction result.
///
/// # Errors
///
/// Returns [`StatisticsError`] when `groups` is absent, not an array, or a
/// group lacks a numeric `class` or `sum`.
pub fn class_areas(stats: &RawStatistics) -> Result<Vec<ClassArea>, StatisticsError> {
    let groups = stats
        .get(GROUPS_KEY)
        .ok_or(StatisticsError::MissingKey(GROUPS_KEY))?
        .as_array()
        .ok_or(StatisticsError::Malformed { key: GROUPS_KEY })?;

    groups
        .iter()
        .map(|group| {
            let code = group.get(GROUP_NAME).and_then(Value::as_f64);
            let hectares = group.get(SUM_KEY).and_then(Value::as_f64);
            match (code, hectares) {
                (Some(code), Some(hectares)) => Ok(ClassArea { code, hectares }),
                _ => Err(StatisticsError::Malformed { key: GROUPS_KEY }),
            }
        })
        .collect()
}

/// Response payload of `POST /get-landcover`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandCoverReport {
    pub land_cover: BTreeMap<String, f64>,
    pub total_area_ha: f64,
    pub year: i64,
    pub data_source: &'static str,
    pub resolution_m: u32,
}

impl LandCoverReport {
    /// Label each class and total the areas. Unknown classes are labelled
    /// and still counted.
    #[must_use]
    pub fn compose(areas: &[ClassArea], request: &LandCoverRequest) -> Self {
        let mut by_name: BTreeMap<String, f64> = BTreeMap::new();
        let mut total = 0.0;
        for area in areas {
            *by_name.entry(class_name(area.code).into_owned()).or_default() += area.hectares;
            total += area.hectares;
        }

        Self {
            land_cover: by_name
                .into_iter()
                .map(|(name, hectares)| (name, round_quantity(hectares)))
                .collect(),
            total_area_ha: round_quantity(total),
            year: request.year,
            data_source: DATA_SOURCE,
            resolution_m: RESOLUTION_M,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> LandCoverRequest {
        LandCoverRequest::from_body(Some(&json!({
            "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}
        })))
        .unwrap()
    }

    #[test]
    fn should_default_year_to_2021() {
        assert_eq!(request().year, 2021);
    }

    #[test]
    fn should_map_every_known_code() {
        assert_eq!(class_name(10.0), "forest");
        assert_eq!(class_name(95.0), "mangroves");
        assert_eq!(class_name(100.0), "moss_lichen");
    }

    #[test]
    fn should_label_unknown_codes() {
        assert_eq!(class_name(11.0), "unknown_11");
        assert_eq!(class_name(0.0), "unknown_0");
    }

    #[test]
    fn should_compose_forest_and_water_scenario() {
        let stats: RawStatistics = serde_json::from_value(json!({
            "groups": [{"class": 10, "sum": 40.0}, {"class": 80, "sum": 10.0}]
        }))
        .unwrap();
        let report = LandCoverReport::compose(&class_areas(&stats).unwrap(), &request());

        assert_eq!(report.land_cover.len(), 2);
        assert!((report.land_cover["forest"] - 40.0).abs() < 1e-9);
        assert!((report.land_cover["water"] - 10.0).abs() < 1e-9);
        assert!((report.total_area_ha - 50.0).abs() < 1e-9);
        assert_eq!(report.resolution_m, 10);
        assert_eq!(report.data_source, "ESA WorldCover v200");
    }

    #[test]
    fn should_count_unknown_classes_in_total() {
        let areas = [
            ClassArea {
                code: 30.0,
                hectares: 1.234_1,
            },
            ClassArea {
                code: 255.0,
                hectares: 2.0,
            },
        ];
        let report = LandCoverReport::compose(&areas, &request());
        assert!((report.land_cover["unknown_255"] - 2.0).abs() < 1e-9);
        assert!((report.land_cover["grassland"] - 1.23).abs() < 1e-9);
        assert!((report.total_area_ha - 3.23).abs() < 1e-9);
    }

    #[test]
    fn should_sum_to_total_within_rounding() {
        let mut hectares = 0.0;
        let areas: Vec<ClassArea> = CLASS_NAMES
            .iter()
            .map(|(code, _)| {
                hectares += 0.333_7;
                ClassArea {
                    code: f64::from(*code),
                    hectares,
                }
            })
            .collect();
        let report = LandCoverReport::compose(&areas, &request());
        let sum: f64 = report.land_cover.values().sum();
        assert!((sum - report.total_area_ha).abs() <= 0.06);
        assert!(report
            .land_cover
            .keys()
            .all(|name| CLASS_NAMES.iter().any(|(_, known)| known == name)));
    }

    #[test]
    fn should_report_missing_groups() {
        let stats = RawStatistics::default();
        assert_eq!(
            class_areas(&stats),
            Err(StatisticsError::MissingKey("groups"))
        );
    }

    #[test]
    fn should_report_malformed_group() {
        let stats: RawStatistics =
            serde_json::from_value(json!({"groups": [{"class": 10}]})).unwrap();
        assert!(matches!(
            class_areas(&stats),
            Err(StatisticsError::Malformed { .. })
        ));
    }

    #[test]
    fn should_return_no_classes_for_empty_groups() {
        let stats: RawStatistics = serde_json::from_value(json!({"groups": []})).unwrap();
        let report = LandCoverReport::compose(&class_areas(&stats).unwrap(), &request());
        assert!(report.land_cover.is_empty());
        assert!(report.total_area_ha.abs() < f64::EPSILON);
    }
}
