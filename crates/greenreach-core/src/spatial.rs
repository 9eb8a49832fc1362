//! Planar distance math and nearest-node snapping.

use crate::error::ClassifyError;
use crate::graph::{NetworkGraph, NodeId};
use geo_types::Coord;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::cmp::Ordering;

/// Euclidean distance between two planar coordinates.
pub fn euclidean_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// A graph node placed in the R-tree.
#[derive(Debug, Clone, Copy)]
struct IndexedNode {
    id: NodeId,
    x: f64,
    y: f64,
}

impl RTreeObject for IndexedNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

impl IndexedNode {
    /// Lexical `(x, y)` order, then id.
    fn tie_order(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Nearest-node lookup over a graph's node coordinates.
///
/// Snapping never rejects a query by distance. When several nodes sit at
/// the same minimum distance, the one with the lowest `(x, y)` wins, so the
/// same point always snaps to the same node.
pub struct NodeSnapper {
    tree: RTree<IndexedNode>,
}

impl NodeSnapper {
    pub fn new(graph: &NetworkGraph) -> Result<Self, ClassifyError> {
        if graph.is_empty() {
            return Err(ClassifyError::GraphEmpty);
        }
        let nodes: Vec<IndexedNode> = graph
            .nodes()
            .map(|(id, coord)| IndexedNode {
                id,
                x: coord.x,
                y: coord.y,
            })
            .collect();
        Ok(Self {
            tree: RTree::bulk_load(nodes),
        })
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Snap `point` to its nearest node.
    ///
    /// Returns `None` only for a non-finite query point.
    pub fn snap(&self, point: Coord<f64>) -> Option<NodeId> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return None;
        }
        let query = [point.x, point.y];
        let nearest = self.tree.nearest_neighbor(&query)?;
        let best_d2 = nearest.distance_2(&query);

        self.tree
            .locate_within_distance(query, best_d2)
            .filter(|node| node.distance_2(&query) <= best_d2)
            .min_by(|a, b| a.tie_order(b))
            .map(|node| node.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NetworkConfig;
    use geo_types::{coord, line_string, Geometry};

    fn graph(lines: Vec<Geometry<f64>>) -> NetworkGraph {
        NetworkGraph::build(&lines, &NetworkConfig::default())
            .unwrap()
            .0
    }

    #[test]
    fn euclidean_distance_is_planar() {
        let d = euclidean_distance(coord! { x: 1.0, y: 1.0 }, coord! { x: 4.0, y: 5.0 });
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn snaps_to_nearest_node() {
        let g = graph(vec![
            line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 300.0, y: 0.0)].into(),
        ]);
        let snapper = NodeSnapper::new(&g).unwrap();
        assert_eq!(snapper.len(), 3);

        let id = snapper.snap(coord! { x: 90.0, y: 20.0 }).unwrap();
        assert_eq!(g.coord(id), Some(coord! { x: 100.0, y: 0.0 }));

        let id = snapper.snap(coord! { x: -50.0, y: -50.0 }).unwrap();
        assert_eq!(g.coord(id), Some(coord! { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn ties_resolve_to_lowest_coordinate() {
        // Query sits exactly between (10, 0) and (0, 0), and between
        // (5, 5) and (5, -5).
        let g = graph(vec![
            line_string![(x: 10.0, y: 0.0), (x: 5.0, y: 5.0)].into(),
            line_string![(x: 5.0, y: -5.0), (x: 0.0, y: 0.0)].into(),
        ]);
        let snapper = NodeSnapper::new(&g).unwrap();
        let query = coord! { x: 5.0, y: 0.0 };
        let first = snapper.snap(query).unwrap();
        assert_eq!(g.coord(first), Some(coord! { x: 0.0, y: 0.0 }));
        for _ in 0..10 {
            assert_eq!(snapper.snap(query), Some(first));
        }
    }

    #[test]
    fn empty_graph_cannot_be_indexed() {
        let g = graph(Vec::new());
        assert!(matches!(
            NodeSnapper::new(&g),
            Err(ClassifyError::GraphEmpty)
        ));
    }

    #[test]
    fn non_finite_queries_do_not_snap() {
        let g = graph(vec![line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)].into()]);
        let snapper = NodeSnapper::new(&g).unwrap();
        assert_eq!(snapper.snap(coord! { x: f64::NAN, y: 0.0 }), None);
    }
}
