//! Core data models for a classification run.

use crate::error::ClassifyError;
use crate::graph::{GraphBuildReport, NodeId};
use crate::rules::{OverlapTier, Tier};
use geo_types::{Coord, LineString};
use serde::{Deserialize, Serialize};

/// A point that needs a proximity class (typically a grid-cell centroid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub location: Coord<f64>,
    /// Tier committed by the overlap tests, if any
    #[serde(default)]
    pub overlap: Option<OverlapTier>,
    /// Nearest point on the network
    #[serde(default)]
    pub entry: Option<Coord<f64>>,
    /// Nearest point on the target geometry
    #[serde(default)]
    pub target: Option<Coord<f64>>,
}

impl Sample {
    /// Create a sample with only an id and location.
    pub fn new(id: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            id: id.into(),
            location,
            overlap: None,
            entry: None,
            target: None,
        }
    }

    /// Set the entry and target reference points.
    pub fn with_reference_points(mut self, entry: Coord<f64>, target: Coord<f64>) -> Self {
        self.entry = Some(entry);
        self.target = Some(target);
        self
    }

    /// Mark the sample as resolved by an overlap test.
    pub fn with_overlap(mut self, overlap: OverlapTier) -> Self {
        self.overlap = Some(overlap);
        self
    }
}

/// Outcome of network evaluation for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceRecord {
    pub sample_id: String,
    /// Shortest-path length; absent when unreachable or unclassifiable
    pub distance: Option<f64>,
    pub tier: Tier,
    pub entry: Option<Coord<f64>>,
    pub target: Option<Coord<f64>>,
    pub entry_node: Option<NodeId>,
    pub target_node: Option<NodeId>,
    /// Raw node coordinates of the shortest path
    pub path_nodes: Option<Vec<Coord<f64>>>,
    /// Sanitized path geometry, when one could be produced
    pub path: Option<LineString<f64>>,
    /// Entry and target snapped to the same node (distance exactly 0)
    pub degenerate: bool,
    /// No distance could be computed
    pub unreachable: bool,
    /// A path existed but produced no exportable geometry
    pub path_skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ClassifyError>,
}

/// Where a sample's final tier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassSource {
    Overlap,
    Network,
}

/// Final class of one sample after the merge pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedSample {
    pub sample_id: String,
    pub tier: Tier,
    pub source: ClassSource,
    pub network_distance: Option<f64>,
}

/// Aggregate counters for auditing a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub samples: usize,
    pub resolved_by_overlap: usize,
    pub evaluated: usize,
    pub unreachable: usize,
    pub degenerate: usize,
    pub missing_reference_point: usize,
    pub paths_exported: usize,
    pub paths_skipped: usize,
    pub tier_b: usize,
    pub tier_c: usize,
    pub tier_d: usize,
}

/// Everything a classification run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRun {
    /// One record per sample that went through network evaluation, in
    /// input order
    pub records: Vec<DistanceRecord>,
    /// One final class per input sample, in input order
    pub classes: Vec<ClassifiedSample>,
    pub summary: RunSummary,
    /// Set when the run also built the graph
    pub build: Option<GraphBuildReport>,
}
