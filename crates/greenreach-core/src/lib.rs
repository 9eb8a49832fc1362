//! Network-distance proximity classification.
//!
//! Builds an undirected road graph from line geometry, snaps sample
//! reference points onto it, measures shortest paths and maps the lengths
//! onto ordered tiers.

pub mod classifier;
pub mod error;
pub mod graph;
pub mod models;
pub mod path_geometry;
pub mod routing;
pub mod rules;
pub mod spatial;

pub use classifier::{merge_classes, run_classification, ClassifierConfig, DistanceClassifier};
pub use error::{ClassifyError, ReferencePoint};
pub use graph::{GraphBuildReport, NetworkConfig, NetworkGraph, NodeId};
pub use models::{
    ClassSource, ClassificationRun, ClassifiedSample, DistanceRecord, RunSummary, Sample,
};
pub use path_geometry::sanitize_path;
pub use routing::{shortest_path, ShortestPath};
pub use rules::{ClassificationRules, OverlapTier, Tier};
pub use spatial::{euclidean_distance, NodeSnapper};
