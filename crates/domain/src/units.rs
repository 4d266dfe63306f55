//! Unit conversions and output rounding.

/// Square metres in one hectare.
pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Decimal places for areas, masses and percentages.
pub const QUANTITY_DECIMALS: i32 = 2;

/// Decimal places for dimensionless indices (NDVI, NPP).
pub const INDEX_DECIMALS: i32 = 4;

/// Convert square metres to hectares.
#[must_use]
pub fn square_meters_to_hectares(square_meters: f64) -> f64 {
    square_meters / SQUARE_METERS_PER_HECTARE
}

/// Round half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round an area, mass or percentage for output.
#[must_use]
pub fn round_quantity(value: f64) -> f64 {
    round_to(value, QUANTITY_DECIMALS)
}

/// Round a dimensionless index for output.
#[must_use]
pub fn round_index(value: f64) -> f64 {
    round_to(value, INDEX_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_one_hectare() {
        assert!((square_meters_to_hectares(10_000.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_round_to_two_places() {
        assert!((round_quantity(91.666_666) - 91.67).abs() < 1e-9);
        assert!((round_quantity(0.004) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn should_round_to_four_places() {
        assert!((round_index(0.123_456) - 0.1235).abs() < 1e-9);
        assert!((round_index(-0.123_44) + 0.1234).abs() < 1e-9);
    }
}
