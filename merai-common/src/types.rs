use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Planets recognised by name when classifying ephemeris bodies
pub const PLANET_NAMES: [&str; 9] = [
    "Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune", "Pluto",
];

/// Value shown in place of a constellation for anything that is not a star
pub const NOT_APPLICABLE: &str = "N/A";

/// Classification of a visible object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Planet,
    Sun,
    Moon,
    Star,
    /// Any other ephemeris body, carrying its display name
    Other(String),
}

impl ObjectType {
    /// Classify an ephemeris body by its pretty name
    pub fn classify(pretty_name: &str) -> Self {
        if PLANET_NAMES.contains(&pretty_name) {
            return ObjectType::Planet;
        }
        match pretty_name {
            "Sun" => ObjectType::Sun,
            "Moon" => ObjectType::Moon,
            other => ObjectType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ObjectType::Planet => "Planet",
            ObjectType::Sun => "Sun",
            ObjectType::Moon => "Moon",
            ObjectType::Star => "Star",
            ObjectType::Other(name) => name,
        }
    }

    pub fn is_star(&self) -> bool {
        matches!(self, ObjectType::Star)
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("Empty object type".to_string());
        }
        match s {
            "Star" => Ok(ObjectType::Star),
            other => Ok(ObjectType::classify(other)),
        }
    }
}

impl Serialize for ObjectType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ObjectType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One visible object at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialObservation {
    /// Best current display name
    pub name: String,

    #[serde(rename = "type")]
    pub object_type: ObjectType,

    pub altitude_degrees: f64,

    /// Degrees from north through east, in [0, 360)
    pub azimuth_degrees: f64,

    /// Catalog number, stars only
    #[serde(default)]
    pub catalog_id: Option<u32>,

    /// Catalog identifier string, e.g. "HIP 11767"
    #[serde(default)]
    pub catalog_label: Option<String>,

    /// Proper name carried by the catalog, if any
    #[serde(default)]
    pub proper_name: Option<String>,

    /// Constellation abbreviation carried by the catalog row, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_constellation: Option<String>,

    #[serde(default)]
    pub constellation: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,
}

impl CelestialObservation {
    /// Create an observation for an ephemeris body (Sun, Moon, planets)
    pub fn body(name: impl Into<String>, object_type: ObjectType, altitude: f64, azimuth: f64) -> Self {
        Self {
            name: name.into(),
            object_type,
            altitude_degrees: altitude,
            azimuth_degrees: azimuth,
            catalog_id: None,
            catalog_label: None,
            proper_name: None,
            catalog_constellation: None,
            constellation: None,
            description: None,
            image_url: None,
        }
    }

    /// Create an observation for a catalog star.
    ///
    /// The display name is the proper name when it is non-empty, otherwise the
    /// catalog label. The catalog id is kept either way.
    pub fn star(
        catalog_id: u32,
        proper_name: Option<&str>,
        catalog_constellation: Option<&str>,
        altitude: f64,
        azimuth: f64,
    ) -> Self {
        let label = catalog_label(catalog_id);
        let proper_name = proper_name
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        let name = proper_name.clone().unwrap_or_else(|| label.clone());

        Self {
            name,
            object_type: ObjectType::Star,
            altitude_degrees: altitude,
            azimuth_degrees: azimuth,
            catalog_id: Some(catalog_id),
            catalog_label: Some(label),
            proper_name,
            catalog_constellation: catalog_constellation
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            constellation: None,
            description: None,
            image_url: None,
        }
    }

    /// Key used for deduplication
    pub fn identity(&self) -> (&str, &ObjectType) {
        (&self.name, &self.object_type)
    }
}

/// Catalog identifier string for a Hipparcos number
pub fn catalog_label(catalog_id: u32) -> String {
    format!("HIP {}", catalog_id)
}

/// Result of one visibility run, as handed to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibleSky {
    pub run_id: uuid::Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub instant: DateTime<Utc>,
    pub objects: Vec<CelestialObservation>,
}
