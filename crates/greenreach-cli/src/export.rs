//! Tabular and geometric exports of a classification run.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use geo_types::LineString;
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use greenreach_core::{
    ClassSource, ClassificationRun, ClassifiedSample, DistanceRecord, GraphBuildReport,
    RunSummary,
};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct DistanceRow<'a> {
    sample_id: &'a str,
    distance: Option<f64>,
    classification: &'static str,
    start_x: Option<f64>,
    start_y: Option<f64>,
    end_x: Option<f64>,
    end_y: Option<f64>,
    degenerate: bool,
    unreachable: bool,
    /// `x y` pairs separated by `;`
    path_nodes: Option<String>,
}

impl<'a> From<&'a DistanceRecord> for DistanceRow<'a> {
    fn from(record: &'a DistanceRecord) -> Self {
        Self {
            sample_id: &record.sample_id,
            distance: record.distance,
            classification: record.tier.as_str(),
            start_x: record.entry.map(|c| c.x),
            start_y: record.entry.map(|c| c.y),
            end_x: record.target.map(|c| c.x),
            end_y: record.target.map(|c| c.y),
            degenerate: record.degenerate,
            unreachable: record.unreachable,
            path_nodes: record.path_nodes.as_ref().map(|nodes| {
                nodes
                    .iter()
                    .map(|c| format!("{} {}", c.x, c.y))
                    .collect::<Vec<_>>()
                    .join(";")
            }),
        }
    }
}

/// Write one row per evaluated sample.
pub fn write_distances_csv<W: Write>(writer: W, records: &[DistanceRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer
            .serialize(DistanceRow::from(record))
            .with_context(|| format!("failed to write distance row for {}", record.sample_id))?;
    }
    csv_writer.flush().context("failed to flush distances CSV")?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ClassRow<'a> {
    sample_id: &'a str,
    classification: &'static str,
    source: &'static str,
    network_distance: Option<f64>,
}

/// Write the final class of every sample.
pub fn write_classes_csv<W: Write>(writer: W, classes: &[ClassifiedSample]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for class in classes {
        let source = match class.source {
            ClassSource::Overlap => "overlap",
            ClassSource::Network => "network",
        };
        csv_writer
            .serialize(ClassRow {
                sample_id: &class.sample_id,
                classification: class.tier.as_str(),
                source,
                network_distance: class.network_distance,
            })
            .with_context(|| format!("failed to write class row for {}", class.sample_id))?;
    }
    csv_writer.flush().context("failed to flush classes CSV")?;
    Ok(())
}

fn line_feature(line: &LineString<f64>, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(line))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// One LineString feature per record with an exportable path.
pub fn paths_collection(records: &[DistanceRecord]) -> FeatureCollection {
    let features = records
        .iter()
        .filter_map(|record| {
            let line = record.path.as_ref()?;
            let mut properties = JsonObject::new();
            properties.insert("sample_id".into(), JsonValue::from(record.sample_id.clone()));
            properties.insert("classification".into(), JsonValue::from(record.tier.as_str()));
            properties.insert("distance".into(), JsonValue::from(record.distance));
            Some(line_feature(line, properties))
        })
        .collect();
    collection(features)
}

/// Entry-to-target segments of zero-distance records, for inspection.
pub fn degenerate_collection(records: &[DistanceRecord]) -> FeatureCollection {
    let features = records
        .iter()
        .filter(|record| record.degenerate)
        .filter_map(|record| {
            let line = LineString::new(vec![record.entry?, record.target?]);
            let mut properties = JsonObject::new();
            properties.insert("sample_id".into(), JsonValue::from(record.sample_id.clone()));
            Some(line_feature(&line, properties))
        })
        .collect();
    collection(features)
}

pub fn write_feature_collection<W: Write>(
    mut writer: W,
    features: &FeatureCollection,
) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, features).context("failed to write GeoJSON")?;
    writer.flush().context("failed to flush GeoJSON")
}

/// Audit report written next to the other outputs.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub network: Option<&'a GraphBuildReport>,
    pub summary: &'a RunSummary,
}

impl<'a> RunReport<'a> {
    pub fn new(run: &'a ClassificationRun, started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            network: run.build.as_ref(),
            summary: &run.summary,
        }
    }
}

pub fn write_report<W: Write>(mut writer: W, report: &RunReport<'_>) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report).context("failed to write run summary")?;
    writer.flush().context("failed to flush run summary")
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{coord, line_string, Geometry};
    use greenreach_core::{run_classification, ClassifierConfig, Sample};

    fn run() -> ClassificationRun {
        let network: Vec<Geometry<f64>> = vec![
            line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 300.0, y: 0.0)].into(),
        ];
        let samples = vec![
            Sample::new("far", coord! { x: 0.0, y: 10.0 })
                .with_reference_points(coord! { x: 0.0, y: 0.0 }, coord! { x: 300.0, y: 0.0 }),
            Sample::new("zero", coord! { x: 0.0, y: 10.0 })
                .with_reference_points(coord! { x: 99.0, y: 1.0 }, coord! { x: 101.0, y: 1.0 }),
            Sample::new("none", coord! { x: 0.0, y: 10.0 }),
        ];
        run_classification(&network, &samples, &ClassifierConfig::default()).unwrap()
    }

    #[test]
    fn distances_csv_has_one_row_per_record() {
        let run = run();
        let mut out = Vec::new();
        write_distances_csv(&mut out, &run.records).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "sample_id,distance,classification,start_x,start_y,end_x,end_y,degenerate,unreachable,path_nodes"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("far,300.0,D,0.0,0.0,300.0,0.0,false,false,"));
        assert!(lines[1].ends_with("0 0;100 0;300 0"));
        assert!(lines[2].starts_with("zero,0.0,B,"));
        assert_eq!(lines[3], "none,,D,,,,,false,false,");
    }

    #[test]
    fn paths_collection_skips_records_without_geometry() {
        let run = run();
        let paths = paths_collection(&run.records);
        assert_eq!(paths.features.len(), 1);
        let properties = paths.features[0].properties.as_ref().unwrap();
        assert_eq!(properties["sample_id"], "far");
        assert_eq!(properties["classification"], "D");
        assert_eq!(properties["distance"], 300.0);
    }

    #[test]
    fn degenerate_collection_links_entry_and_target() {
        let run = run();
        let zero = degenerate_collection(&run.records);
        assert_eq!(zero.features.len(), 1);
        let geometry = zero.features[0].geometry.as_ref().unwrap();
        assert_eq!(
            geometry.value,
            geojson::Value::LineString(vec![vec![99.0, 1.0], vec![101.0, 1.0]])
        );
    }

    #[test]
    fn classes_csv_lists_every_sample() {
        let run = run();
        let mut out = Vec::new();
        write_classes_csv(&mut out, &run.classes).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("far,D,network,300.0"));
        assert!(text.contains("none,D,network,"));
    }

    #[test]
    fn report_serializes_counters() {
        let run = run();
        let report = RunReport::new(&run, Utc::now());
        let mut out = Vec::new();
        write_report(&mut out, &report).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["summary"]["evaluated"], 3);
        assert_eq!(json["summary"]["degenerate"], 1);
        assert_eq!(json["network"]["node_count"], 3);
    }
}
