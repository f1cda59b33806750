//! Catalog identifier to constellation lookup, built from a membership file
//!
//! Each line starts with a catalog identifier, optionally prefixed with
//! `HIP` (attached or as its own token), followed by a constellation
//! abbreviation. Anything after the abbreviation is ignored.

use std::collections::HashMap;
use std::path::Path;

use super::names::full_name;

/// Returned for identifiers with no membership entry
pub const UNKNOWN_CONSTELLATION: &str = "Unknown";

const CATALOG_PREFIX: &str = "HIP";

#[derive(Debug, Clone, Default)]
pub struct ConstellationMap {
    members: HashMap<u32, String>,
}

impl ConstellationMap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the membership file; a missing or unreadable file gives an empty map
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let map = Self::parse(&content);
                tracing::info!(
                    "Loaded {} constellation memberships from {}",
                    map.len(),
                    path.display()
                );
                map
            }
            Err(e) => {
                tracing::warn!(
                    "Constellation file {} unavailable ({}), every star resolves to {}",
                    path.display(),
                    e,
                    UNKNOWN_CONSTELLATION
                );
                Self::empty()
            }
        }
    }

    pub fn parse(content: &str) -> Self {
        let members = content.lines().filter_map(parse_line).collect();
        Self { members }
    }

    /// Constellation name for a catalog identifier, or "Unknown"
    pub fn resolve(&self, catalog_id: u32) -> String {
        self.get(catalog_id)
            .unwrap_or(UNKNOWN_CONSTELLATION)
            .to_string()
    }

    pub fn get(&self, catalog_id: u32) -> Option<&str> {
        self.members.get(&catalog_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Malformed lines give `None`; unknown abbreviations are kept as written
fn parse_line(line: &str) -> Option<(u32, String)> {
    let mut tokens = line.split_whitespace();
    let first = tokens.next()?;

    let id_token = if first.eq_ignore_ascii_case(CATALOG_PREFIX) {
        tokens.next()?
    } else {
        strip_prefix_ignore_case(first, CATALOG_PREFIX).unwrap_or(first)
    };

    let catalog_id: u32 = id_token.parse().ok()?;
    let abbreviation = tokens.next()?;
    let name = full_name(abbreviation).unwrap_or(abbreviation);

    Some((catalog_id, name.to_string()))
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_MEMBERSHIP: &str = "\
11767 UMI
HIP32349 cma extra fields here
HIP 91262 Lyr
27989 ori
12345 XYZ
notanumber UMA
42
HIP
";

    #[test]
    fn test_parse_membership() {
        let map = ConstellationMap::parse(SAMPLE_MEMBERSHIP);
        assert_eq!(map.len(), 5);

        assert_eq!(map.resolve(11767), "Ursa Minor");
        assert_eq!(map.resolve(32349), "Canis Major");
        assert_eq!(map.resolve(91262), "Lyra");
        assert_eq!(map.resolve(27989), "Orion");
    }

    #[test]
    fn test_unknown_abbreviation_passes_through() {
        let map = ConstellationMap::parse(SAMPLE_MEMBERSHIP);
        assert_eq!(map.resolve(12345), "XYZ");
    }

    #[test]
    fn test_unknown_identifier() {
        let map = ConstellationMap::parse(SAMPLE_MEMBERSHIP);
        assert_eq!(map.resolve(999_999), "Unknown");
        assert_eq!(map.resolve(42), "Unknown");
    }

    #[test]
    fn test_missing_file_gives_empty_map() {
        let map = ConstellationMap::load("does/not/exist.fab");
        assert!(map.is_empty());
        assert_eq!(map.resolve(11767), "Unknown");
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("constellationship.fab");
        std::fs::write(&path, "11767 UMi\n").unwrap();

        let map = ConstellationMap::load(&path);
        assert_eq!(map.resolve(11767), "Ursa Minor");
    }
}
