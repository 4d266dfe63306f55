//! Simulated optical scenes.

use std::f64::consts::PI;

/// One simulated acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Capture date, `YYYY-MM-DD`.
    pub date: String,
    pub cloud_pct: f64,
    /// Areal index value; `None` for scenes masked over the region.
    pub ndvi: Option<f64>,
}

impl Scene {
    #[must_use]
    pub fn new(date: impl Into<String>, cloud_pct: f64, ndvi: Option<f64>) -> Self {
        Self {
            date: date.into(),
            cloud_pct,
            ndvi,
        }
    }
}

const FIRST_YEAR: u32 = 2019;
const LAST_YEAR: u32 = 2024;
const DAYS: [u32; 3] = [3, 13, 23];

/// Three acquisitions a month over several years: a seasonal index cycle and
/// pseudo-random cloud cover. A few scenes are masked.
pub(crate) fn catalogue() -> Vec<Scene> {
    let mut scenes = Vec::new();
    for year in FIRST_YEAR..=LAST_YEAR {
        for month in 1..=12_u32 {
            for day in DAYS {
                scenes.push(simulate(year, month, day));
            }
        }
    }
    scenes
}

fn simulate(year: u32, month: u32, day: u32) -> Scene {
    let phase = (f64::from(month) - 1.0 + f64::from(day) / 30.0) * PI / 6.0;
    let ndvi = 0.55 + 0.2 * phase.sin();
    let seed = year * 31 + month * 7 + day * 3;
    let cloud_pct = f64::from(seed % 50) + f64::from(day % 10) / 10.0;
    let masked = seed % 17 == 0;
    Scene::new(
        format!("{year}-{month:02}-{day:02}"),
        cloud_pct,
        (!masked).then(|| (ndvi * 10_000.0).round() / 10_000.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_deterministic() {
        assert_eq!(catalogue(), catalogue());
    }

    #[test]
    fn should_cover_every_month_in_order() {
        let scenes = catalogue();
        assert_eq!(scenes.len(), 6 * 12 * 3);
        assert!(scenes.windows(2).all(|pair| pair[0].date < pair[1].date));
        assert_eq!(scenes[0].date, "2019-01-03");
    }

    #[test]
    fn should_keep_values_in_range() {
        for scene in catalogue() {
            assert!((0.0..100.0).contains(&scene.cloud_pct));
            if let Some(ndvi) = scene.ndvi {
                assert!((-1.0..=1.0).contains(&ndvi));
            }
        }
    }

    #[test]
    fn should_mask_some_scenes() {
        assert!(catalogue().iter().any(|scene| scene.ndvi.is_none()));
    }
}
