//! Visible-object computation for one observer and instant

use chrono::{DateTime, Utc};
use merai_common::{CelestialObservation, ObjectType};
use std::collections::HashSet;

use crate::config::DataConfig;
use crate::error::SkyResult;

use super::catalog::StarCatalog;
use super::coords::{HorizontalPosition, Observer, round2};
use super::ephemeris::{EphemerisProvider, pretty_body_name};
use super::spk::SpkEphemeris;
use super::time::Epoch;

/// Body names never reported: the observer stands on it
const OBSERVER_BODY: &str = "Earth";

pub struct VisibilityEngine {
    ephemeris: Box<dyn EphemerisProvider>,
    catalog: StarCatalog,
    magnitude_limit: f64,
}

impl VisibilityEngine {
    pub fn new(ephemeris: Box<dyn EphemerisProvider>, catalog: StarCatalog, magnitude_limit: f64) -> Self {
        Self {
            ephemeris,
            catalog,
            magnitude_limit,
        }
    }

    /// Load the ephemeris kernel and star catalog named in the config
    pub fn load(config: &DataConfig) -> SkyResult<Self> {
        let ephemeris = SpkEphemeris::load(&config.ephemeris_path)?;
        let catalog = StarCatalog::load(&config.catalog_path, config.catalog_format)?;
        Ok(Self::new(Box::new(ephemeris), catalog, config.magnitude_limit))
    }

    /// Everything above the horizon, highest first, one entry per (name, type).
    ///
    /// A body or star that cannot be positioned is logged and left out.
    pub fn compute_visible(
        &self,
        latitude: f64,
        longitude: f64,
        instant: Option<DateTime<Utc>>,
    ) -> Vec<CelestialObservation> {
        let epoch = instant.map(Epoch::from_datetime).unwrap_or_else(Epoch::now);
        let observer = Observer::new(latitude, longitude);

        let mut visible = self.visible_bodies(&observer, &epoch);
        visible.extend(self.visible_stars(&observer, &epoch));

        let visible = deduplicate(visible);
        tracing::debug!(
            "{} objects above the horizon at ({}, {})",
            visible.len(),
            latitude,
            longitude
        );
        visible
    }

    fn visible_bodies(&self, observer: &Observer, epoch: &Epoch) -> Vec<CelestialObservation> {
        let mut bodies = Vec::new();

        for raw_name in self.ephemeris.body_names() {
            let name = pretty_body_name(&raw_name);
            if name == OBSERVER_BODY {
                continue;
            }

            match self.ephemeris.observe(&raw_name, observer, epoch) {
                Ok(position) => {
                    if let Some((altitude, azimuth)) = above_horizon(&position) {
                        let object_type = ObjectType::classify(&name);
                        bodies.push(CelestialObservation::body(name, object_type, altitude, azimuth));
                    }
                }
                Err(e) => tracing::debug!("Skipping body {}: {}", raw_name, e),
            }
        }

        bodies
    }

    fn visible_stars(&self, observer: &Observer, epoch: &Epoch) -> Vec<CelestialObservation> {
        let mut stars = Vec::new();

        for star in self.catalog.brighter_than(self.magnitude_limit) {
            let position = self.ephemeris.observe_star(&star.place, observer, epoch);
            if !position.altitude_deg.is_finite() || !position.azimuth_deg.is_finite() {
                tracing::debug!("Skipping HIP {}: non-finite position", star.catalog_id);
                continue;
            }

            if let Some((altitude, azimuth)) = above_horizon(&position) {
                stars.push(CelestialObservation::star(
                    star.catalog_id,
                    star.proper_name.as_deref(),
                    star.constellation.as_deref(),
                    altitude,
                    azimuth,
                ));
            }
        }

        stars
    }
}

/// Rounded (altitude, azimuth) when the rounded altitude is above zero
fn above_horizon(position: &HorizontalPosition) -> Option<(f64, f64)> {
    let altitude = round2(position.altitude_deg);
    (altitude > 0.0).then(|| (altitude, round2(position.azimuth_deg).rem_euclid(360.0)))
}

/// Stable sort by altitude descending, keeping the first of each (name, type)
fn deduplicate(mut observations: Vec<CelestialObservation>) -> Vec<CelestialObservation> {
    observations.sort_by(|a, b| b.altitude_degrees.total_cmp(&a.altitude_degrees));

    let mut seen = HashSet::new();
    observations.retain(|obs| seen.insert((obs.name.clone(), obs.object_type.clone())));
    observations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkyError;
    use crate::module::sky::catalog::CatalogStar;
    use crate::module::sky::coords::StarPlace;
    use chrono::TimeZone;

    struct MockEphemeris {
        bodies: Vec<(&'static str, Option<f64>)>,
    }

    impl EphemerisProvider for MockEphemeris {
        fn body_names(&self) -> Vec<String> {
            self.bodies.iter().map(|(n, _)| n.to_string()).collect()
        }

        fn observe(&self, body: &str, _observer: &Observer, _epoch: &Epoch) -> SkyResult<HorizontalPosition> {
            self.bodies
                .iter()
                .find(|(n, _)| *n == body)
                .and_then(|(_, alt)| *alt)
                .map(|altitude_deg| HorizontalPosition {
                    altitude_deg,
                    azimuth_deg: 123.456,
                })
                .ok_or_else(|| SkyError::lookup(body, "no coverage"))
        }
    }

    fn star(catalog_id: u32, name: Option<&str>, magnitude: f64, dec_deg: f64) -> CatalogStar {
        star_at(catalog_id, name, magnitude, 10.0 * catalog_id as f64, dec_deg)
    }

    fn star_at(catalog_id: u32, name: Option<&str>, magnitude: f64, ra_deg: f64, dec_deg: f64) -> CatalogStar {
        CatalogStar {
            catalog_id,
            magnitude,
            proper_name: name.map(str::to_string),
            constellation: None,
            place: StarPlace {
                ra_deg,
                dec_deg,
                pm_ra_mas_per_year: 0.0,
                pm_dec_mas_per_year: 0.0,
                epoch_year: 2000.0,
            },
        }
    }

    fn instant() -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 3, 20, 22, 0, 0).unwrap())
    }

    #[test]
    fn test_bodies_filtered_and_classified() {
        let ephemeris = MockEphemeris {
            bodies: vec![
                ("sun", Some(45.0)),
                ("moon", Some(-10.0)),
                ("earth", Some(30.0)),
                ("earth barycenter", Some(30.0)),
                ("mars barycenter", Some(0.004)),
                ("venus barycenter", None),
                ("jupiter barycenter", Some(12.3456)),
            ],
        };
        let engine = VisibilityEngine::new(Box::new(ephemeris), StarCatalog::default(), 2.0);

        let visible = engine.compute_visible(51.5, -0.1, instant());
        assert_eq!(visible.len(), 2);

        assert_eq!(visible[0].name, "Sun");
        assert_eq!(visible[0].object_type, ObjectType::Sun);
        assert_eq!(visible[0].azimuth_degrees, 123.46);

        assert_eq!(visible[1].name, "Jupiter");
        assert_eq!(visible[1].object_type, ObjectType::Planet);
        assert_eq!(visible[1].altitude_degrees, 12.35);
    }

    #[test]
    fn test_star_magnitude_threshold() {
        // Same place in the sky, so only magnitude separates them
        let catalog = StarCatalog::new(vec![
            star_at(1, Some("Alpha"), 1.0, 120.0, 45.0),
            star_at(2, Some("Beta"), 2.5, 120.0, 45.0),
            star_at(3, None, -0.5, 120.0, 45.0),
            star_at(4, Some("Limit"), 2.0, 120.0, 45.0),
        ]);
        let engine = VisibilityEngine::new(Box::new(MockEphemeris { bodies: vec![] }), catalog, 2.0);

        let visible = engine.compute_visible(90.0, 0.0, instant());
        let mut ids: Vec<u32> = visible.iter().filter_map(|o| o.catalog_id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 3]);

        let unnamed = visible.iter().find(|o| o.catalog_id == Some(3)).unwrap();
        assert_eq!(unnamed.name, "HIP 3");
        assert_eq!(unnamed.object_type, ObjectType::Star);
        assert!(visible.iter().all(|o| o.altitude_degrees > 0.0));
    }

    #[test]
    fn test_duplicates_keep_highest() {
        let catalog = StarCatalog::new(vec![
            star(1, Some("Twin"), 1.0, 30.0),
            star(2, Some("Twin"), 1.0, 60.0),
            star(3, Some("Solo"), 1.0, 45.0),
            star(4, Some("South"), 1.0, -20.0),
        ]);
        let engine = VisibilityEngine::new(Box::new(MockEphemeris { bodies: vec![] }), catalog, 2.0);

        let visible = engine.compute_visible(90.0, 0.0, instant());
        let names: Vec<&str> = visible.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Twin", "Solo"]);
        assert_eq!(visible[0].catalog_id, Some(2));
        assert!(visible[0].altitude_degrees > 59.0);
    }

    #[test]
    fn test_body_and_barycenter_collapse_to_one_entry() {
        let ephemeris = MockEphemeris {
            bodies: vec![("mercury barycenter", Some(14.2)), ("mercury", Some(14.25))],
        };
        let engine = VisibilityEngine::new(Box::new(ephemeris), StarCatalog::default(), 2.0);

        let visible = engine.compute_visible(51.5, -0.1, instant());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Mercury");
        assert_eq!(visible[0].object_type, ObjectType::Planet);
        assert_eq!(visible[0].altitude_degrees, 14.25);
    }

    #[test]
    fn test_sorted_descending() {
        let ephemeris = MockEphemeris {
            bodies: vec![("moon", Some(5.0)), ("sun", Some(70.0)), ("saturn barycenter", Some(33.0))],
        };
        let catalog = StarCatalog::new(vec![star(7, Some("Vega"), 0.0, 50.0)]);
        let engine = VisibilityEngine::new(Box::new(ephemeris), catalog, 2.0);

        let visible = engine.compute_visible(90.0, 0.0, instant());
        assert_eq!(visible.len(), 4);
        assert!(
            visible
                .windows(2)
                .all(|w| w[0].altitude_degrees >= w[1].altitude_degrees)
        );
        assert_eq!(visible[0].name, "Sun");
        assert_eq!(visible[3].name, "Moon");
    }

    #[test]
    fn test_load_missing_datasets() {
        let config = DataConfig {
            ephemeris_path: "missing/de421.bsp".into(),
            ..DataConfig::default()
        };
        let result = VisibilityEngine::load(&config);
        assert!(matches!(result, Err(SkyError::DataUnavailable(_))));
    }
}
