//! Types shared between the Merai backend and the dashboard that renders its output.

pub mod types;

pub use types::{
    CelestialObservation, NOT_APPLICABLE, ObjectType, PLANET_NAMES, VisibleSky, catalog_label,
};
