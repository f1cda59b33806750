//! Ephemeris provider seam

use crate::error::SkyResult;

use super::coords::{HorizontalPosition, Observer, StarPlace};
use super::time::Epoch;

/// Source of apparent positions for solar-system bodies.
///
/// Implementations wrap a loaded dataset and are queried once per body and
/// run; they never hold per-run state.
pub trait EphemerisProvider: Send + Sync {
    /// Names of every body the dataset can position, in dataset order
    fn body_names(&self) -> Vec<String>;

    /// Apparent altitude/azimuth of a named body for a surface observer
    fn observe(&self, body: &str, observer: &Observer, epoch: &Epoch) -> SkyResult<HorizontalPosition>;

    /// Apparent altitude/azimuth of a catalog star
    fn observe_star(&self, star: &StarPlace, observer: &Observer, epoch: &Epoch) -> HorizontalPosition {
        star.horizontal(observer, epoch)
    }
}

/// Display name for an ephemeris body: "mars barycenter" -> "Mars"
pub fn pretty_body_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let base = trimmed
        .strip_suffix(" barycenter")
        .or_else(|| trimmed.strip_suffix(" BARYCENTER"))
        .unwrap_or(trimmed);

    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_body_name() {
        assert_eq!(pretty_body_name("mars barycenter"), "Mars");
        assert_eq!(pretty_body_name("MOON"), "Moon");
        assert_eq!(pretty_body_name("sun"), "Sun");
        assert_eq!(pretty_body_name("solar system barycenter"), "Solar system");
        assert_eq!(pretty_body_name(""), "");
    }
}
