//! Constellation names for catalog stars

mod names;
mod resolver;

pub use names::{CONSTELLATIONS, full_name};
pub use resolver::{ConstellationMap, UNKNOWN_CONSTELLATION};
