//! Visibility run: dataset load, engine, then per-object enrichment

use chrono::{DateTime, Utc};
use merai_common::{CelestialObservation, NOT_APPLICABLE, VisibleSky};
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{BackendConfig, DataConfig};
use crate::error::{SkyError, SkyResult};
use crate::module::constellation::{ConstellationMap, UNKNOWN_CONSTELLATION, full_name};
use crate::module::sky::VisibilityEngine;
use crate::module::wiki::{
    DescriptionSource, SummaryClient, extract_display_name, is_generic_opener, lookup_keys,
};

/// Process-lifetime state shared by every request
pub struct SkyContext {
    data: DataConfig,
    constellations: ConstellationMap,
    describer: Arc<dyn DescriptionSource>,
}

impl SkyContext {
    pub fn new(
        data: DataConfig,
        constellations: ConstellationMap,
        describer: Arc<dyn DescriptionSource>,
    ) -> Self {
        Self {
            data,
            constellations,
            describer,
        }
    }

    /// Load the constellation map and build the summary client
    pub fn from_config(config: &BackendConfig) -> anyhow::Result<Self> {
        let constellations = ConstellationMap::load(&config.data.constellation_path);
        let describer = SummaryClient::from_config(&config.summary)?;
        Ok(Self::new(
            config.data.clone(),
            constellations,
            Arc::new(describer),
        ))
    }

    pub fn constellations(&self) -> &ConstellationMap {
        &self.constellations
    }

    /// Load the datasets and compute the raw visible list off the async runtime
    pub async fn compute_visible(
        &self,
        latitude: f64,
        longitude: f64,
        instant: DateTime<Utc>,
    ) -> SkyResult<Vec<CelestialObservation>> {
        let data = self.data.clone();
        tokio::task::spawn_blocking(move || -> SkyResult<Vec<CelestialObservation>> {
            let engine = VisibilityEngine::load(&data)?;
            Ok(engine.compute_visible(latitude, longitude, Some(instant)))
        })
        .await
        .map_err(|e| SkyError::DataUnavailable(format!("dataset loader failed: {}", e)))?
    }

    /// One full run: compute, enrich, wrap
    pub async fn visible_sky(
        &self,
        latitude: f64,
        longitude: f64,
        instant: Option<DateTime<Utc>>,
    ) -> SkyResult<VisibleSky> {
        let instant = instant.unwrap_or_else(Utc::now);
        let run_id = uuid::Uuid::now_v7();
        tracing::info!(
            "Run {}: visible sky at ({}, {}) for {}",
            run_id,
            latitude,
            longitude,
            instant.to_rfc3339()
        );

        let mut objects = self.compute_visible(latitude, longitude, instant).await?;
        enrich(&mut objects, self.describer.as_ref(), &self.constellations).await;

        tracing::info!("Run {}: {} objects visible", run_id, objects.len());
        Ok(VisibleSky {
            run_id,
            latitude,
            longitude,
            instant,
            objects,
        })
    }
}

/// Attach descriptions, images, display names and constellations, serially.
///
/// Display name precedence: name extracted from the description, then the
/// catalog proper name, then the catalog label. An extracted name is not
/// adopted when it is a generic sentence opener or when another entry already
/// carries the same (name, type).
pub async fn enrich(
    observations: &mut [CelestialObservation],
    describer: &dyn DescriptionSource,
    constellations: &ConstellationMap,
) {
    let mut taken: HashSet<(String, String)> = observations
        .iter()
        .map(|o| (o.name.clone(), o.object_type.to_string()))
        .collect();

    for observation in observations.iter_mut() {
        let (description, image_url) = describe_first(describer, observation).await;

        let extracted = description
            .as_deref()
            .and_then(extract_display_name)
            .filter(|name| !is_generic_opener(name));

        let current = (observation.name.clone(), observation.object_type.to_string());
        let fallback = observation
            .proper_name
            .clone()
            .or_else(|| observation.catalog_label.clone())
            .unwrap_or_else(|| observation.name.clone());

        let chosen = match extracted {
            Some(name) if name == current.0 => name,
            Some(name) if !taken.contains(&(name.clone(), current.1.clone())) => name,
            Some(name) => {
                tracing::debug!(
                    "Keeping {} instead of {}: name already in use",
                    current.0,
                    name
                );
                fallback
            }
            None => fallback,
        };

        if chosen != current.0 && !taken.contains(&(chosen.clone(), current.1.clone())) {
            taken.remove(&current);
            taken.insert((chosen.clone(), current.1.clone()));
            observation.name = chosen;
        }

        observation.description = description;
        observation.image_url = image_url;
        observation.constellation = Some(constellation_for(observation, constellations));
    }
}

/// Try each lookup key until one gives a description or an image
async fn describe_first(
    describer: &dyn DescriptionSource,
    observation: &CelestialObservation,
) -> (Option<String>, Option<String>) {
    for key in lookup_keys(observation) {
        let (description, image_url) = describer.describe(&key).await;
        if description.is_some() || image_url.is_some() {
            return (description, image_url);
        }
    }
    (None, None)
}

fn constellation_for(observation: &CelestialObservation, constellations: &ConstellationMap) -> String {
    if !observation.object_type.is_star() {
        return NOT_APPLICABLE.to_string();
    }

    observation
        .catalog_id
        .and_then(|id| constellations.get(id))
        .map(str::to_string)
        .or_else(|| {
            observation
                .catalog_constellation
                .as_deref()
                .map(|abbr| full_name(abbr).unwrap_or(abbr).to_string())
        })
        .unwrap_or_else(|| UNKNOWN_CONSTELLATION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use merai_common::ObjectType;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSource {
        answers: HashMap<String, (Option<String>, Option<String>)>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with(mut self, key: &str, description: &str, image: Option<&str>) -> Self {
            self.answers.insert(
                key.to_string(),
                (Some(description.to_string()), image.map(str::to_string)),
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DescriptionSource for FakeSource {
        async fn describe(&self, name: &str) -> (Option<String>, Option<String>) {
            self.calls.lock().unwrap().push(name.to_string());
            self.answers.get(name).cloned().unwrap_or((None, None))
        }
    }

    #[tokio::test]
    async fn test_extracted_name_wins() {
        let source = FakeSource::default().with(
            "HIP 11767",
            "Polaris is a star in the northern circumpolar constellation of Ursa Minor.",
            Some("https://img.example/polaris.jpg"),
        );
        let map = ConstellationMap::parse("11767 UMI\n");
        let mut objects = vec![CelestialObservation::star(11767, None, None, 51.0, 0.5)];

        enrich(&mut objects, &source, &map).await;

        let polaris = &objects[0];
        assert_eq!(polaris.name, "Polaris");
        assert_eq!(polaris.catalog_id, Some(11767));
        assert_eq!(polaris.constellation.as_deref(), Some("Ursa Minor"));
        assert_eq!(polaris.image_url.as_deref(), Some("https://img.example/polaris.jpg"));
        assert_eq!(source.calls(), vec!["HIP 11767"]);
    }

    #[tokio::test]
    async fn test_generic_opener_keeps_proper_name() {
        let source = FakeSource::default().with("HIP 5", "The star is a red giant.", None);
        let mut objects = vec![CelestialObservation::star(5, Some("Foo"), None, 20.0, 10.0)];

        enrich(&mut objects, &source, &ConstellationMap::empty()).await;

        assert_eq!(objects[0].name, "Foo");
        assert_eq!(objects[0].description.as_deref(), Some("The star is a red giant."));
        assert_eq!(objects[0].constellation.as_deref(), Some("Unknown"));
    }

    #[tokio::test]
    async fn test_qualified_key_fallback_for_planets() {
        let source = FakeSource::default().with(
            "Mars (planet)",
            "Mars is the fourth planet from the Sun.",
            None,
        );
        let mut objects = vec![CelestialObservation::body("Mars", ObjectType::Planet, 30.0, 200.0)];

        enrich(&mut objects, &source, &ConstellationMap::empty()).await;

        assert_eq!(source.calls(), vec!["Mars", "Mars (planet)"]);
        assert_eq!(objects[0].name, "Mars");
        assert_eq!(objects[0].constellation.as_deref(), Some(NOT_APPLICABLE));
        assert!(objects[0].description.is_some());
    }

    #[tokio::test]
    async fn test_qualified_key_fallback_for_stars() {
        let source = FakeSource::default().with(
            "Castor (star)",
            "Castor is the second-brightest object in the zodiac constellation of Gemini.",
            Some("https://img.example/castor.jpg"),
        );
        let mut objects = vec![CelestialObservation::star(36850, Some("Castor"), Some("Gem"), 70.0, 120.0)];

        enrich(&mut objects, &source, &ConstellationMap::empty()).await;

        assert_eq!(source.calls(), vec!["HIP 36850", "Castor", "Castor (star)"]);
        assert_eq!(objects[0].name, "Castor");
        assert_eq!(objects[0].image_url.as_deref(), Some("https://img.example/castor.jpg"));
        assert_eq!(objects[0].constellation.as_deref(), Some("Gemini"));
    }

    #[tokio::test]
    async fn test_colliding_name_not_adopted() {
        let source = FakeSource::default().with("HIP 2", "Sirius is the brightest star.", None);
        let mut objects = vec![
            CelestialObservation::star(1, Some("Sirius"), None, 40.0, 10.0),
            CelestialObservation::star(2, None, None, 30.0, 20.0),
        ];

        enrich(&mut objects, &source, &ConstellationMap::empty()).await;

        assert_eq!(objects[0].name, "Sirius");
        assert_eq!(objects[1].name, "HIP 2");
        let names: HashSet<&str> = objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names.len(), 2);
    }

    #[tokio::test]
    async fn test_no_description_leaves_fields_absent() {
        let source = FakeSource::default();
        let mut objects = vec![
            CelestialObservation::star(91262, Some("Vega"), Some("Lyr"), 60.0, 80.0),
            CelestialObservation::star(3, None, Some("Xyz"), 10.0, 80.0),
        ];

        enrich(&mut objects, &source, &ConstellationMap::empty()).await;

        assert_eq!(objects[0].name, "Vega");
        assert_eq!(objects[0].description, None);
        assert_eq!(objects[0].image_url, None);
        assert_eq!(objects[0].constellation.as_deref(), Some("Lyra"));
        assert_eq!(objects[1].constellation.as_deref(), Some("Xyz"));
        assert_eq!(
            source.calls(),
            vec!["HIP 91262", "Vega", "Vega (star)", "Vega (astronomy)", "HIP 3"]
        );
    }

    #[tokio::test]
    async fn test_missing_datasets_fail_the_run() {
        let data = DataConfig {
            ephemeris_path: "missing/de421.bsp".into(),
            ..DataConfig::default()
        };
        let context = SkyContext::new(data, ConstellationMap::empty(), Arc::new(FakeSource::default()));

        let result = context.visible_sky(51.5, -0.1, None).await;
        assert!(matches!(result, Err(SkyError::DataUnavailable(_))));
    }
}
