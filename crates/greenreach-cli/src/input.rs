//! Reading the road network and the samples table.
//!
//! Both inputs are expected in one planar, distance-preserving coordinate
//! system already; nothing here reprojects.

use anyhow::{Context, Result};
use geo_types::{coord, Coord, Geometry};
use geojson::GeoJson;
use greenreach_core::{OverlapTier, Sample};
use serde::Deserialize;
use std::io::Read;

/// Read network geometries from a GeoJSON document.
///
/// Accepts a FeatureCollection, a single Feature or a bare Geometry.
/// Features without geometry are skipped. With `explode_multi`, each
/// MultiLineString is split into its member line strings.
pub fn load_network<R: Read>(mut reader: R, explode_multi: bool) -> Result<Vec<Geometry<f64>>> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .context("failed to read network GeoJSON")?;
    let document: GeoJson = text.parse().context("failed to parse network GeoJSON")?;

    let raw: Vec<geojson::Geometry> = match document {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .enumerate()
            .filter_map(|(idx, feature)| {
                if feature.geometry.is_none() {
                    tracing::warn!(feature = idx, "network feature has no geometry");
                }
                feature.geometry
            })
            .collect(),
        GeoJson::Feature(feature) => feature.geometry.into_iter().collect(),
        GeoJson::Geometry(geometry) => vec![geometry],
    };

    let mut geometries = Vec::with_capacity(raw.len());
    for (idx, geometry) in raw.into_iter().enumerate() {
        let geometry = Geometry::<f64>::try_from(geometry)
            .with_context(|| format!("network geometry {idx} could not be converted"))?;
        match geometry {
            Geometry::MultiLineString(multi) if explode_multi => {
                geometries.extend(multi.0.into_iter().map(Geometry::LineString));
            }
            other => geometries.push(other),
        }
    }
    Ok(geometries)
}

/// One row of the samples CSV. Empty cells mean "absent".
#[derive(Debug, Deserialize)]
struct SampleRow {
    id: String,
    x: f64,
    y: f64,
    #[serde(default)]
    overlap: Option<OverlapTier>,
    #[serde(default)]
    entry_x: Option<f64>,
    #[serde(default)]
    entry_y: Option<f64>,
    #[serde(default)]
    target_x: Option<f64>,
    #[serde(default)]
    target_y: Option<f64>,
}

fn pair(x: Option<f64>, y: Option<f64>) -> Option<Coord<f64>> {
    Some(coord! { x: x?, y: y? })
}

/// Read samples from CSV with columns
/// `id,x,y,overlap,entry_x,entry_y,target_x,target_y`.
pub fn load_samples<R: Read>(reader: R) -> Result<Vec<Sample>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut samples = Vec::new();
    for (line, row) in csv_reader.deserialize::<SampleRow>().enumerate() {
        let row = row.with_context(|| format!("invalid sample row {}", line + 1))?;
        let entry = pair(row.entry_x, row.entry_y);
        let target = pair(row.target_x, row.target_y);
        if entry.is_none() != (row.entry_x.is_none() && row.entry_y.is_none()) {
            tracing::warn!(sample = %row.id, "entry point has only one coordinate");
        }
        if target.is_none() != (row.target_x.is_none() && row.target_y.is_none()) {
            tracing::warn!(sample = %row.id, "target point has only one coordinate");
        }
        samples.push(Sample {
            id: row.id,
            location: coord! { x: row.x, y: row.y },
            overlap: row.overlap,
            entry,
            target,
        });
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETWORK: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "LineString", "coordinates": [[0, 0], [100, 0]]}},
            {"type": "Feature", "properties": {}, "geometry": null},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "MultiLineString",
                          "coordinates": [[[100, 0], [300, 0]], [[300, 0], [300, 50]]]}}
        ]
    }"#;

    #[test]
    fn loads_feature_collection_geometries() {
        let geometries = load_network(NETWORK.as_bytes(), false).unwrap();
        assert_eq!(geometries.len(), 2);
        assert!(matches!(geometries[0], Geometry::LineString(_)));
        assert!(matches!(geometries[1], Geometry::MultiLineString(_)));
    }

    #[test]
    fn explodes_multi_line_strings_on_request() {
        let geometries = load_network(NETWORK.as_bytes(), true).unwrap();
        assert_eq!(geometries.len(), 3);
        assert!(geometries
            .iter()
            .all(|g| matches!(g, Geometry::LineString(_))));
    }

    #[test]
    fn loads_bare_geometry() {
        let doc = r#"{"type": "LineString", "coordinates": [[0, 0], [1, 1]]}"#;
        assert_eq!(load_network(doc.as_bytes(), false).unwrap().len(), 1);
    }

    #[test]
    fn rejects_malformed_geojson() {
        assert!(load_network("{not json".as_bytes(), false).is_err());
    }

    #[test]
    fn loads_samples_with_optional_columns() {
        let csv = "\
id,x,y,overlap,entry_x,entry_y,target_x,target_y
c1,10,20,A,,,,
c2,10,20,,1.5,2.5,30,40
c3,10,20,,1.5,,30,40
";
        let samples = load_samples(csv.as_bytes()).unwrap();
        assert_eq!(samples.len(), 3);

        assert_eq!(samples[0].overlap, Some(OverlapTier::Direct));
        assert_eq!(samples[0].entry, None);

        assert_eq!(samples[1].overlap, None);
        assert_eq!(samples[1].entry, Some(coord! { x: 1.5, y: 2.5 }));
        assert_eq!(samples[1].target, Some(coord! { x: 30.0, y: 40.0 }));
        assert_eq!(samples[1].location, coord! { x: 10.0, y: 20.0 });

        assert_eq!(samples[2].entry, None);
        assert!(samples[2].target.is_some());
    }

    #[test]
    fn rejects_unknown_overlap_labels() {
        let csv = "id,x,y,overlap,entry_x,entry_y,target_x,target_y\nc1,0,0,Z,,,,\n";
        assert!(load_samples(csv.as_bytes()).is_err());
    }
}
