//! Display-name extraction and summary lookup keys

use merai_common::{CelestialObservation, ObjectType};
use regex::Regex;

/// Capitalized sentence openers that are never object names
const GENERIC_OPENERS: &[&str] = &[
    "The", "This", "These", "Those", "That", "There", "Its", "One", "For", "From", "With",
    "Some", "Most", "Many", "Both", "Each", "When", "While", "During", "After", "Before",
    "According", "Although", "Unlike",
];

/// Leading capitalized token of a description, e.g. "Vega" from "Vega is ..."
pub fn extract_display_name(description: &str) -> Option<String> {
    let re = Regex::new(r"^[A-Z][A-Za-z0-9-]{2,}").ok()?;
    re.find(description).map(|m| m.as_str().to_string())
}

pub fn is_generic_opener(word: &str) -> bool {
    GENERIC_OPENERS.contains(&word)
}

/// Summary titles to try for an observation, most specific first.
///
/// Stars go by catalog label, then proper name, then the proper name with
/// `(star)` and `(astronomy)` qualifiers. Everything else goes by its display
/// name, then the name with a type qualifier.
pub fn lookup_keys(observation: &CelestialObservation) -> Vec<String> {
    let mut keys = Vec::new();

    if observation.object_type.is_star() {
        if let Some(label) = &observation.catalog_label {
            keys.push(label.clone());
        }
        if let Some(proper) = &observation.proper_name {
            keys.push(proper.clone());
            keys.push(format!("{} (star)", proper));
            keys.push(format!("{} (astronomy)", proper));
        }
        if keys.is_empty() {
            keys.push(observation.name.clone());
        }
    } else {
        let qualifier = match observation.object_type {
            ObjectType::Planet => "(planet)",
            _ => "(astronomy)",
        };
        keys.push(observation.name.clone());
        keys.push(format!("{} {}", observation.name, qualifier));
    }

    keys.dedup();
    keys
}
