//! Network-distance classification of samples.
//!
//! Samples already resolved by an overlap test are passed through
//! untouched. Every other sample has its entry and target points snapped
//! to the road graph, the shortest path between them measured, and the
//! length mapped onto a tier. Per-sample records are produced first and
//! merged into final classes in a single sequential pass.

use crate::error::{ClassifyError, ReferencePoint};
use crate::graph::{NetworkConfig, NetworkGraph};
use crate::models::{
    ClassSource, ClassificationRun, ClassifiedSample, DistanceRecord, RunSummary, Sample,
};
use crate::path_geometry::sanitize_path;
use crate::routing::shortest_path;
use crate::rules::{ClassificationRules, Tier};
use crate::spatial::NodeSnapper;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Settings for one classification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub rules: ClassificationRules,
    pub network: NetworkConfig,
    /// Build sanitized path geometry for each evaluated sample
    pub export_paths: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rules: ClassificationRules::default(),
            network: NetworkConfig::default(),
            export_paths: true,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ClassifyError> {
        self.rules.validate()?;
        self.network.validate()
    }
}

/// Classifies samples against one fixed road graph.
pub struct DistanceClassifier<'g> {
    graph: &'g NetworkGraph,
    snapper: NodeSnapper,
    config: ClassifierConfig,
}

impl<'g> DistanceClassifier<'g> {
    /// Index `graph` for snapping.
    ///
    /// Fails with [`ClassifyError::GraphEmpty`] when there is nothing to
    /// snap to, before any sample is looked at.
    pub fn new(graph: &'g NetworkGraph, config: ClassifierConfig) -> Result<Self, ClassifyError> {
        config.validate()?;
        let snapper = NodeSnapper::new(graph)?;
        Ok(Self {
            graph,
            snapper,
            config,
        })
    }

    pub fn graph(&self) -> &NetworkGraph {
        self.graph
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Evaluate one sample. Returns `None` for samples committed by an
    /// overlap test; those are never snapped or routed.
    pub fn classify(&self, sample: &Sample) -> Option<DistanceRecord> {
        if sample.overlap.is_some() {
            return None;
        }
        let record = self.evaluate(sample);
        tracing::debug!(
            sample = %sample.id,
            distance = ?record.distance,
            tier = %record.tier,
            "classified sample by network distance"
        );
        Some(record)
    }

    fn evaluate(&self, sample: &Sample) -> DistanceRecord {
        let mut record = DistanceRecord {
            sample_id: sample.id.clone(),
            distance: None,
            tier: Tier::D,
            entry: sample.entry,
            target: sample.target,
            entry_node: None,
            target_node: None,
            path_nodes: None,
            path: None,
            degenerate: false,
            unreachable: false,
            path_skipped: false,
            failure: None,
        };

        let (entry, target) = match (sample.entry, sample.target) {
            (Some(entry), Some(target)) => (entry, target),
            (None, _) => {
                record.failure = Some(ClassifyError::MissingReferencePoint(ReferencePoint::Entry));
                return record;
            }
            (_, None) => {
                record.failure = Some(ClassifyError::MissingReferencePoint(ReferencePoint::Target));
                return record;
            }
        };

        let (Some(entry_node), Some(target_node)) =
            (self.snapper.snap(entry), self.snapper.snap(target))
        else {
            record.failure = Some(ClassifyError::InvalidGeometry(
                "non-finite reference point".to_string(),
            ));
            return record;
        };
        record.entry_node = Some(entry_node);
        record.target_node = Some(target_node);

        match shortest_path(self.graph, entry_node, target_node) {
            Ok(path) => {
                record.distance = Some(path.length);
                record.degenerate = path.is_degenerate();
                record.path_nodes = Some(path.coords(self.graph));
            }
            Err(err) => {
                record.unreachable = true;
                record.failure = Some(err);
            }
        }
        record.tier = self.config.rules.classify(record.distance);

        if self.config.export_paths {
            if let Some(nodes) = &record.path_nodes {
                match sanitize_path(nodes) {
                    Ok(line) => record.path = Some(line),
                    Err(err) => {
                        record.path_skipped = true;
                        tracing::debug!(sample = %sample.id, error = %err, "skipped path geometry");
                    }
                }
            }
        }

        record
    }

    /// Classify a batch and merge the results into one final class per
    /// sample. The run carries no build report; the caller that built the
    /// graph owns those counters.
    pub fn classify_batch(&self, samples: &[Sample]) -> ClassificationRun {
        let mut seen = HashSet::with_capacity(samples.len());
        let repeated = samples.iter().filter(|s| !seen.insert(s.id.as_str())).count();
        if repeated > 0 {
            tracing::warn!(repeated, "sample ids are not unique; classes follow input order");
        }

        #[cfg(feature = "parallel")]
        let outcomes: Vec<Option<DistanceRecord>> =
            samples.par_iter().map(|sample| self.classify(sample)).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Option<DistanceRecord>> =
            samples.iter().map(|sample| self.classify(sample)).collect();

        let records: Vec<DistanceRecord> = outcomes.into_iter().flatten().collect();
        let summary = summarize(samples, &records);
        let classes = merge_classes(samples, &records);

        tracing::info!(
            samples = summary.samples,
            overlap = summary.resolved_by_overlap,
            evaluated = summary.evaluated,
            unreachable = summary.unreachable,
            degenerate = summary.degenerate,
            "network classification finished"
        );
        if summary.paths_skipped > 0 {
            tracing::warn!(
                skipped = summary.paths_skipped,
                "paths with fewer than two distinct points were not exported"
            );
        }

        ClassificationRun {
            records,
            classes,
            summary,
            build: None,
        }
    }
}

fn summarize(samples: &[Sample], records: &[DistanceRecord]) -> RunSummary {
    let mut summary = RunSummary {
        samples: samples.len(),
        resolved_by_overlap: samples.iter().filter(|s| s.overlap.is_some()).count(),
        evaluated: records.len(),
        ..RunSummary::default()
    };
    for record in records {
        if record.unreachable {
            summary.unreachable += 1;
        }
        if record.degenerate {
            summary.degenerate += 1;
        }
        if matches!(record.failure, Some(ClassifyError::MissingReferencePoint(_))) {
            summary.missing_reference_point += 1;
        }
        if record.path.is_some() {
            summary.paths_exported += 1;
        }
        if record.path_skipped {
            summary.paths_skipped += 1;
        }
        match record.tier {
            Tier::B => summary.tier_b += 1,
            Tier::C => summary.tier_c += 1,
            Tier::D => summary.tier_d += 1,
            Tier::A => {}
        }
    }
    summary
}

/// Combine overlap tiers and network records into final classes.
///
/// Records pair with samples by position: `records` is walked in input
/// order and a record is taken only when its id matches the sample at
/// hand, so repeated ids never borrow each other's results. A committed
/// overlap tier always wins. Samples with neither an overlap tier nor a
/// record fall back to `D`, so every sample ends with exactly one class.
pub fn merge_classes(samples: &[Sample], records: &[DistanceRecord]) -> Vec<ClassifiedSample> {
    let mut pending = records.iter().peekable();

    samples
        .iter()
        .map(|sample| {
            let record = pending.next_if(|record| record.sample_id == sample.id);
            if let Some(overlap) = sample.overlap {
                return ClassifiedSample {
                    sample_id: sample.id.clone(),
                    tier: overlap.into(),
                    source: ClassSource::Overlap,
                    network_distance: None,
                };
            }
            ClassifiedSample {
                sample_id: sample.id.clone(),
                tier: record.map(|r| r.tier).unwrap_or(Tier::D),
                source: ClassSource::Network,
                network_distance: record.and_then(|r| r.distance),
            }
        })
        .collect()
}

/// Build the road graph and classify `samples` against it.
pub fn run_classification(
    geometries: &[Geometry<f64>],
    samples: &[Sample],
    config: &ClassifierConfig,
) -> Result<ClassificationRun, ClassifyError> {
    config.validate()?;
    let (graph, build) = NetworkGraph::build(geometries, &config.network)?;
    let classifier = DistanceClassifier::new(&graph, config.clone())?;
    let mut run = classifier.classify_batch(samples);
    run.build = Some(build);
    Ok(run)
}
