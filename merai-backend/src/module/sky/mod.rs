//! Positional astronomy: time scales, frames, ephemeris and star catalog

pub mod catalog;
pub mod coords;
pub mod ephemeris;
pub mod spk;
pub mod time;
pub mod visibility;

pub use catalog::{CatalogFormat, CatalogStar, StarCatalog};
pub use coords::{HorizontalPosition, Observer, StarPlace};
pub use ephemeris::{EphemerisProvider, pretty_body_name};
pub use spk::SpkEphemeris;
pub use time::Epoch;
pub use visibility::VisibilityEngine;
