//! Undirected weighted road graph built from line geometry.
//!
//! Nodes are distinct vertex coordinates, quantized to a configurable
//! precision before keying so that vertices differing only by
//! floating-point jitter share a node. Edges are polyline segments
//! weighted by Euclidean length.

use crate::error::ClassifyError;
use crate::spatial::euclidean_distance;
use geo_types::{Coord, Geometry, LineString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Dense node identifier, assigned in first-seen vertex order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Graph construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Grid size (in coordinate units) used to quantize vertex coordinates
    /// into node keys.
    pub coordinate_precision: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            coordinate_precision: 1e-6,
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<(), ClassifyError> {
        let precision = self.coordinate_precision;
        if !precision.is_finite() || precision <= 0.0 {
            return Err(ClassifyError::InvalidConfig(format!(
                "coordinate_precision must be finite and positive, got {precision}"
            )));
        }
        Ok(())
    }
}

/// Counters describing one graph build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphBuildReport {
    pub geometries_read: usize,
    pub geometries_rejected: usize,
    /// Line strings with fewer than two vertices.
    pub short_line_strings: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub zero_length_edges: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey {
    x: i64,
    y: i64,
}

/// 2^63, the first magnitude an `i64` key cannot hold.
const KEY_LIMIT: f64 = 9_223_372_036_854_775_808.0;

impl NodeKey {
    /// `None` when a scaled coordinate does not fit the key.
    fn quantize(coord: Coord<f64>, precision: f64) -> Option<Self> {
        let x = (coord.x / precision).round();
        let y = (coord.y / precision).round();
        if !(x.abs() < KEY_LIMIT && y.abs() < KEY_LIMIT) {
            return None;
        }
        Some(Self {
            x: x as i64,
            y: y as i64,
        })
    }
}

/// Immutable-after-build road graph.
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    precision: f64,
    coords: Vec<Coord<f64>>,
    keys: HashMap<NodeKey, NodeId>,
    adjacency: Vec<Vec<(NodeId, f64)>>,
    /// Canonical `(low, high)` pair to weight.
    edges: HashMap<(NodeId, NodeId), f64>,
}

impl NetworkGraph {
    /// Create a graph with no nodes.
    pub fn empty(config: &NetworkConfig) -> Result<Self, ClassifyError> {
        config.validate()?;
        Ok(Self {
            precision: config.coordinate_precision,
            coords: Vec::new(),
            keys: HashMap::new(),
            adjacency: Vec::new(),
            edges: HashMap::new(),
        })
    }

    /// Build a graph from network geometries.
    ///
    /// Only `LineString`s contribute edges. Anything else is rejected,
    /// counted in the report and logged; the build carries on. A precision
    /// too fine to key some vertex aborts the build with
    /// [`ClassifyError::InvalidConfig`].
    pub fn build(
        geometries: &[Geometry<f64>],
        config: &NetworkConfig,
    ) -> Result<(Self, GraphBuildReport), ClassifyError> {
        let mut graph = Self::empty(config)?;
        let mut report = GraphBuildReport::default();

        for (idx, geometry) in geometries.iter().enumerate() {
            report.geometries_read += 1;
            let Geometry::LineString(line) = geometry else {
                report.geometries_rejected += 1;
                tracing::warn!(
                    geometry = idx,
                    kind = geometry_kind(geometry),
                    "skipping non-linear network geometry"
                );
                continue;
            };
            if line.0.len() < 2 {
                report.short_line_strings += 1;
            }
            match graph.add_line_string(line) {
                Ok(added) => report.zero_length_edges += added.zero_length,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    report.geometries_rejected += 1;
                    tracing::warn!(geometry = idx, error = %err, "skipping network geometry");
                }
            }
        }

        report.node_count = graph.node_count();
        report.edge_count = graph.edge_count();
        tracing::info!(
            geometries = report.geometries_read,
            rejected = report.geometries_rejected,
            nodes = report.node_count,
            edges = report.edge_count,
            "built network graph"
        );
        Ok((graph, report))
    }

    /// Add every consecutive vertex pair of `line` as an edge.
    ///
    /// A line string holding a non-finite coordinate, or a vertex that
    /// overflows its node key at the configured precision, is rejected
    /// whole, before any node is created.
    pub fn add_line_string(&mut self, line: &LineString<f64>) -> Result<EdgesAdded, ClassifyError> {
        if let Some(bad) = line.0.iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(ClassifyError::InvalidGeometry(format!(
                "non-finite vertex ({}, {})",
                bad.x, bad.y
            )));
        }
        let keys = line
            .0
            .iter()
            .map(|c| {
                NodeKey::quantize(*c, self.precision).ok_or_else(|| {
                    ClassifyError::InvalidConfig(format!(
                        "coordinate_precision {} is too fine for vertex ({}, {})",
                        self.precision, c.x, c.y
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut added = EdgesAdded::default();
        for (idx, pair) in keys.windows(2).enumerate() {
            let a = self.intern(line.0[idx], pair[0]);
            let b = self.intern(line.0[idx + 1], pair[1]);
            if self.add_edge(a, b) {
                added.new_edges += 1;
                if a == b {
                    added.zero_length += 1;
                }
            }
        }
        Ok(added)
    }

    fn intern(&mut self, coord: Coord<f64>, key: NodeKey) -> NodeId {
        if let Some(id) = self.keys.get(&key) {
            return *id;
        }
        let id = NodeId(self.coords.len());
        self.coords.push(coord);
        self.adjacency.push(Vec::new());
        self.keys.insert(key, id);
        id
    }

    /// Returns false when the edge already existed.
    fn add_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        let pair = if a <= b { (a, b) } else { (b, a) };
        if self.edges.contains_key(&pair) {
            return false;
        }
        let weight = euclidean_distance(self.coords[a.0], self.coords[b.0]);
        self.edges.insert(pair, weight);
        self.adjacency[a.0].push((b, weight));
        if a != b {
            self.adjacency[b.0].push((a, weight));
        }
        true
    }

    pub fn node_count(&self) -> usize {
        self.coords.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.coords.len()
    }

    pub fn coord(&self, id: NodeId) -> Option<Coord<f64>> {
        self.coords.get(id.0).copied()
    }

    /// Look up the node a coordinate quantizes onto.
    pub fn node_id(&self, coord: Coord<f64>) -> Option<NodeId> {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return None;
        }
        let key = NodeKey::quantize(coord, self.precision)?;
        self.keys.get(&key).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, Coord<f64>)> + '_ {
        self.coords
            .iter()
            .enumerate()
            .map(|(idx, coord)| (NodeId(idx), *coord))
    }

    /// Neighbors of `id` with edge weights. Empty for unknown ids.
    pub fn neighbors(&self, id: NodeId) -> &[(NodeId, f64)] {
        self.adjacency
            .get(id.0)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<f64> {
        let pair = if a <= b { (a, b) } else { (b, a) };
        self.edges.get(&pair).copied()
    }
}

/// Edges contributed by one line string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgesAdded {
    pub new_edges: usize,
    pub zero_length: usize,
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{coord, line_string, point, polygon};

    fn build(geometries: Vec<Geometry<f64>>) -> (NetworkGraph, GraphBuildReport) {
        NetworkGraph::build(&geometries, &NetworkConfig::default()).unwrap()
    }

    #[test]
    fn segments_become_weighted_edges() {
        let (graph, report) = build(vec![
            line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 4.0), (x: 3.0, y: 10.0)].into(),
        ]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(report.node_count, 3);
        assert_eq!(report.edge_count, 2);

        let a = graph.node_id(coord! { x: 0.0, y: 0.0 }).unwrap();
        let b = graph.node_id(coord! { x: 3.0, y: 4.0 }).unwrap();
        let c = graph.node_id(coord! { x: 3.0, y: 10.0 }).unwrap();
        assert_eq!(graph.edge_weight(a, b), Some(5.0));
        assert_eq!(graph.edge_weight(b, a), Some(5.0));
        assert_eq!(graph.edge_weight(b, c), Some(6.0));
        assert_eq!(graph.edge_weight(a, c), None);
        assert_eq!(graph.neighbors(b).len(), 2);
    }

    #[test]
    fn overlapping_polylines_do_not_accumulate_edges() {
        let (graph, _) = build(vec![
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)].into(),
            line_string![(x: 10.0, y: 0.0), (x: 0.0, y: 0.0)].into(),
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 20.0, y: 0.0)].into(),
        ]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        let a = graph.node_id(coord! { x: 0.0, y: 0.0 }).unwrap();
        let b = graph.node_id(coord! { x: 10.0, y: 0.0 }).unwrap();
        assert_eq!(graph.edge_weight(a, b), Some(10.0));
        assert_eq!(graph.neighbors(a).len(), 1);
    }

    #[test]
    fn non_linear_geometries_are_skipped() {
        let (graph, report) = build(vec![
            point!(x: 5.0, y: 5.0).into(),
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)].into(),
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)].into(),
        ]);
        assert_eq!(report.geometries_read, 3);
        assert_eq!(report.geometries_rejected, 2);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn short_line_strings_contribute_nothing() {
        let (graph, report) = build(vec![
            LineString::new(vec![coord! { x: 1.0, y: 1.0 }]).into(),
            LineString::new(Vec::new()).into(),
        ]);
        assert!(graph.is_empty());
        assert_eq!(report.short_line_strings, 2);
        assert_eq!(report.geometries_rejected, 0);
    }

    #[test]
    fn coincident_vertices_keep_a_zero_length_edge() {
        let (graph, report) = build(vec![
            line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 0.0), (x: 4.0, y: 0.0)].into(),
        ]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(report.zero_length_edges, 1);
        let a = graph.node_id(coord! { x: 0.0, y: 0.0 }).unwrap();
        assert_eq!(graph.edge_weight(a, a), Some(0.0));
    }

    #[test]
    fn jittered_vertices_share_a_node() {
        let (graph, _) = build(vec![
            line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)].into(),
            line_string![(x: 100.000_000_000_1, y: 0.0), (x: 100.0, y: 50.0)].into(),
        ]);
        assert_eq!(graph.node_count(), 3);
        let joint = graph.node_id(coord! { x: 100.0, y: 0.0 }).unwrap();
        assert_eq!(graph.neighbors(joint).len(), 2);
        // First-seen coordinate wins.
        assert_eq!(graph.coord(joint), Some(coord! { x: 100.0, y: 0.0 }));
    }

    #[test]
    fn non_finite_vertices_reject_the_whole_line() {
        let (graph, report) = build(vec![
            line_string![(x: 0.0, y: 0.0), (x: f64::NAN, y: 1.0), (x: 2.0, y: 2.0)].into(),
        ]);
        assert!(graph.is_empty());
        assert_eq!(report.geometries_rejected, 1);
    }

    #[test]
    fn rejects_non_positive_precision() {
        let config = NetworkConfig {
            coordinate_precision: 0.0,
        };
        let err = NetworkGraph::build(&[], &config).unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidConfig(_)));
    }

    #[test]
    fn precision_too_fine_for_the_extent_aborts_the_build() {
        let config = NetworkConfig {
            coordinate_precision: 1e-15,
        };
        let geometries: Vec<Geometry<f64>> = vec![
            line_string![(x: 500_000.0, y: 6_200_000.0), (x: 500_300.0, y: 6_200_000.0)].into(),
        ];
        let err = NetworkGraph::build(&geometries, &config).unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidConfig(_)));

        let mut graph = NetworkGraph::empty(&config).unwrap();
        assert!(graph.add_line_string(&line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]).is_ok());
        let far = line_string![(x: 1.0, y: 0.0), (x: 1e5, y: 0.0)];
        assert!(graph.add_line_string(&far).is_err());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.node_id(coord! { x: 1e5, y: 0.0 }), None);
    }

    #[test]
    fn unknown_nodes_have_no_neighbors() {
        let (graph, _) = build(vec![line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)].into()]);
        assert!(!graph.contains(NodeId(7)));
        assert!(graph.neighbors(NodeId(7)).is_empty());
        assert_eq!(graph.coord(NodeId(7)), None);
    }
}
