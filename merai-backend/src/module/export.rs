//! CSV export of a visible-object list

use merai_common::{CelestialObservation, NOT_APPLICABLE};
use std::io::Write;

pub const CSV_HEADER: [&str; 5] = ["Name", "Type", "Constellation", "Altitude (°)", "Azimuth (°)"];

/// Write one header row and one row per observation, UTF-8
pub fn write_csv<W: Write>(observations: &[CelestialObservation], writer: W) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for obs in observations {
        let altitude = format!("{:.2}", obs.altitude_degrees);
        let azimuth = format!("{:.2}", obs.azimuth_degrees);
        csv_writer.write_record([
            obs.name.as_str(),
            obs.object_type.as_str(),
            obs.constellation.as_deref().unwrap_or(NOT_APPLICABLE),
            altitude.as_str(),
            azimuth.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string(observations: &[CelestialObservation]) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    write_csv(observations, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use merai_common::ObjectType;

    #[test]
    fn test_csv_rows() {
        let mut vega = CelestialObservation::star(91262, Some("Vega"), None, 61.5, 280.25);
        vega.constellation = Some("Lyra".to_string());
        let mars = CelestialObservation::body("Mars", ObjectType::Planet, 12.0, 95.4);
        let unresolved = CelestialObservation::star(1, None, None, 3.33, 0.0);

        let csv = to_csv_string(&[vega, mars, unresolved]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Name,Type,Constellation,Altitude (°),Azimuth (°)");
        assert_eq!(lines[1], "Vega,Star,Lyra,61.50,280.25");
        assert_eq!(lines[2], "Mars,Planet,N/A,12.00,95.40");
        assert_eq!(lines[3], "HIP 1,Star,N/A,3.33,0.00");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_empty_list_has_header_only() {
        let csv = to_csv_string(&[]).unwrap();
        assert_eq!(csv, "Name,Type,Constellation,Altitude (°),Azimuth (°)\n");
    }

    #[test]
    fn test_names_with_commas_are_quoted() {
        let obs = CelestialObservation::body("Ceres, dwarf", ObjectType::Other("Ceres".into()), 5.0, 6.0);
        let csv = to_csv_string(&[obs]).unwrap();
        assert!(csv.contains("\"Ceres, dwarf\",Ceres,N/A,5.00,6.00"));
    }
}
