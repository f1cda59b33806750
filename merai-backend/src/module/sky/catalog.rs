//! Star catalog - Hipparcos `hip_main.dat` and HYG-style CSV loaders
//!
//! Sources:
//! - https://cdsarc.cds.unistra.fr/ftp/cats/I/239/hip_main.dat (pipe-delimited, no header)
//! - https://github.com/astronexus/HYG-Database (CSV with headers)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SkyError, SkyResult};

use super::coords::StarPlace;

const HIPPARCOS_EPOCH: f64 = 1991.25;
const HYG_EPOCH: f64 = 2000.0;

/// On-disk layout of the star catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogFormat {
    /// Pick from the file extension: `.csv` is HYG, anything else Hipparcos
    #[default]
    Auto,
    Hipparcos,
    Hyg,
}

impl CatalogFormat {
    pub fn resolve(self, path: &Path) -> CatalogFormat {
        match self {
            CatalogFormat::Auto => {
                let is_csv = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
                if is_csv {
                    CatalogFormat::Hyg
                } else {
                    CatalogFormat::Hipparcos
                }
            }
            explicit => explicit,
        }
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStar {
    pub catalog_id: u32,
    pub magnitude: f64,
    pub proper_name: Option<String>,
    /// Constellation abbreviation as carried by the catalog
    pub constellation: Option<String>,
    pub place: StarPlace,
}

/// HYG database row (only the columns we use)
#[derive(Debug, Deserialize)]
struct HygRow {
    hip: Option<u32>,
    proper: Option<String>,
    /// Hours
    ra: f64,
    dec: f64,
    mag: f64,
    pmra: Option<f64>,
    pmdec: Option<f64>,
    con: Option<String>,
}

/// In-memory star catalog
#[derive(Debug, Clone, Default)]
pub struct StarCatalog {
    stars: Vec<CatalogStar>,
}

impl StarCatalog {
    pub fn new(stars: Vec<CatalogStar>) -> Self {
        Self { stars }
    }

    /// Load from disk; a missing or unreadable file is DataUnavailable
    pub fn load(path: impl AsRef<Path>, format: CatalogFormat) -> SkyResult<Self> {
        let path = path.as_ref();
        let format = format.resolve(path);
        tracing::info!("Loading star catalog ({:?}) from: {}", format, path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            SkyError::DataUnavailable(format!("cannot read catalog {}: {}", path.display(), e))
        })?;

        let catalog = match format {
            CatalogFormat::Hyg => Self::parse_hyg(&content),
            _ => Self::parse_hipparcos(&content),
        };

        if catalog.is_empty() {
            return Err(SkyError::DataUnavailable(format!(
                "catalog {} contains no usable stars",
                path.display()
            )));
        }

        tracing::info!("Loaded {} stars from catalog", catalog.len());
        Ok(catalog)
    }

    /// Parse Hipparcos main catalog lines (`|`-separated, fields H0..H77)
    pub fn parse_hipparcos(content: &str) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut stars = Vec::new();
        let mut row_count = 0;
        let mut skipped = 0;

        for result in reader.records() {
            row_count += 1;
            match result.map_err(|e| e.to_string()).and_then(|r| Self::hipparcos_star(&r)) {
                Ok(Some(star)) => stars.push(star),
                Ok(None) => skipped += 1,
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Error parsing catalog row {}: {}", row_count, e);
                }
            }
        }

        tracing::debug!("Processed {} catalog rows, {} skipped", row_count, skipped);
        Self { stars }
    }

    /// Rows without a position or magnitude are skipped rather than rejected
    fn hipparcos_star(record: &csv::StringRecord) -> Result<Option<CatalogStar>, String> {
        let field = |i: usize| record.get(i).unwrap_or("").trim();
        let optional = |i: usize| -> Result<Option<f64>, String> {
            match field(i) {
                "" => Ok(None),
                value => value
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|e| format!("field H{} '{}': {}", i, value, e)),
            }
        };

        let catalog_id: u32 = field(1)
            .parse()
            .map_err(|e| format!("invalid HIP number '{}': {}", field(1), e))?;

        let (Some(magnitude), Some(ra_deg), Some(dec_deg)) = (optional(5)?, optional(8)?, optional(9)?)
        else {
            return Ok(None);
        };

        Ok(Some(CatalogStar {
            catalog_id,
            magnitude,
            proper_name: None,
            constellation: None,
            place: StarPlace {
                ra_deg,
                dec_deg,
                pm_ra_mas_per_year: optional(12)?.unwrap_or(0.0),
                pm_dec_mas_per_year: optional(13)?.unwrap_or(0.0),
                epoch_year: HIPPARCOS_EPOCH,
            },
        }))
    }

    /// Parse a HYG-style CSV; rows without a Hipparcos number are skipped
    pub fn parse_hyg(content: &str) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut stars = Vec::new();
        let mut row_count = 0;
        let mut skipped = 0;

        for result in reader.deserialize::<HygRow>() {
            row_count += 1;
            match result {
                Ok(row) => match row.hip {
                    Some(catalog_id) => stars.push(CatalogStar {
                        catalog_id,
                        magnitude: row.mag,
                        proper_name: row.proper.filter(|p| !p.trim().is_empty()),
                        constellation: row.con.filter(|c| !c.trim().is_empty()),
                        place: StarPlace {
                            ra_deg: row.ra * 15.0,
                            dec_deg: row.dec,
                            pm_ra_mas_per_year: row.pmra.unwrap_or(0.0),
                            pm_dec_mas_per_year: row.pmdec.unwrap_or(0.0),
                            epoch_year: HYG_EPOCH,
                        },
                    }),
                    None => skipped += 1,
                },
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Error parsing catalog row {}: {}", row_count, e);
                }
            }
        }

        tracing::debug!("Processed {} catalog rows, {} skipped", row_count, skipped);
        Self { stars }
    }

    /// Stars strictly brighter (numerically lower) than `limit`
    pub fn brighter_than(&self, limit: f64) -> impl Iterator<Item = &CatalogStar> {
        self.stars.iter().filter(move |s| s.magnitude < limit)
    }

    pub fn get(&self, catalog_id: u32) -> Option<&CatalogStar> {
        self.stars.iter().find(|s| s.catalog_id == catalog_id)
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}
