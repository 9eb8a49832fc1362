//! Shortest paths over the road graph.
//!
//! Plain Dijkstra: all weights are non-negative Euclidean segment lengths,
//! so no heuristic is needed. Heap ties break on node id and relaxation
//! only accepts strict improvements, which keeps the chosen path stable
//! across runs.

use crate::error::ClassifyError;
use crate::graph::{NetworkGraph, NodeId};
use geo_types::Coord;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Minimum-weight route between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortestPath {
    pub length: f64,
    /// Source first, target last. A single node when source == target.
    pub nodes: Vec<NodeId>,
}

impl ShortestPath {
    /// Resolve the path's node ids into coordinates.
    pub fn coords(&self, graph: &NetworkGraph) -> Vec<Coord<f64>> {
        self.nodes.iter().filter_map(|id| graph.coord(*id)).collect()
    }

    pub fn is_degenerate(&self) -> bool {
        self.length == 0.0
    }
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    cost: FloatOrd,
    node: NodeId,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Compute the shortest path from `source` to `target`.
///
/// Fails with [`ClassifyError::NodeNotFound`] when either endpoint is not a
/// node of `graph`, and with [`ClassifyError::NoPathFound`] when they lie in
/// different components.
pub fn shortest_path(
    graph: &NetworkGraph,
    source: NodeId,
    target: NodeId,
) -> Result<ShortestPath, ClassifyError> {
    for id in [source, target] {
        if !graph.contains(id) {
            return Err(ClassifyError::NodeNotFound(id));
        }
    }
    if source == target {
        return Ok(ShortestPath {
            length: 0.0,
            nodes: vec![source],
        });
    }

    let node_count = graph.node_count();
    let mut dist = vec![f64::INFINITY; node_count];
    let mut came_from: Vec<Option<NodeId>> = vec![None; node_count];
    let mut settled = vec![false; node_count];
    let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();

    dist[source.0] = 0.0;
    open_set.push(Reverse(OpenNode {
        cost: FloatOrd(0.0),
        node: source,
    }));

    while let Some(Reverse(current)) = open_set.pop() {
        let current_id = current.node;
        if settled[current_id.0] {
            continue;
        }
        settled[current_id.0] = true;

        if current_id == target {
            break;
        }

        let best = dist[current_id.0];
        for &(next, weight) in graph.neighbors(current_id) {
            if settled[next.0] {
                continue;
            }
            let tentative = best + weight;
            if tentative < dist[next.0] {
                dist[next.0] = tentative;
                came_from[next.0] = Some(current_id);
                open_set.push(Reverse(OpenNode {
                    cost: FloatOrd(tentative),
                    node: next,
                }));
            }
        }
    }

    if !settled[target.0] {
        return Err(ClassifyError::NoPathFound {
            from: source,
            to: target,
        });
    }

    let mut nodes = vec![target];
    let mut current = target;
    while let Some(prev) = came_from[current.0] {
        nodes.push(prev);
        current = prev;
    }
    nodes.reverse();

    Ok(ShortestPath {
        length: dist[target.0],
        nodes,
    })
}
