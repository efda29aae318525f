use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use crate::graph::{DirectedWeightedGraph, EdgeId, VertexId};

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub weight: f64,
    pub edges: Vec<EdgeId>,
}

/// Single-source shortest-path tables: per-vertex best distance and the
/// incoming edge on the best path.
#[derive(Debug)]
struct SourceRoutes {
    distance: Vec<Option<f64>>,
    incoming: Vec<Option<EdgeId>>,
}

/// Dijkstra solver over a frozen [`DirectedWeightedGraph`] with
/// non-negative weights. Source tables are computed on the first query
/// for a source vertex and memoized for the engine's lifetime, so the
/// engine answers from `&self` and stays `Sync` for read-only serving.
#[derive(Debug)]
pub struct PathEngine {
    graph: DirectedWeightedGraph,
    cache: Mutex<HashMap<VertexId, Arc<SourceRoutes>>>,
}

#[derive(Debug, PartialEq)]
struct Visit {
    distance: f64,
    vertex: VertexId,
}

impl Eq for Visit {}

impl Ord for Visit {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the BinaryHeap pops the nearest vertex first; weights
        // are finite by construction.
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PathEngine {
    pub fn new(graph: DirectedWeightedGraph) -> Self {
        Self {
            graph,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn graph(&self) -> &DirectedWeightedGraph {
        &self.graph
    }

    /// Minimal-weight path from `from` to `to` as an ordered edge-id
    /// sequence, or `None` if `to` is unreachable. Equal-weight paths
    /// resolve to the earliest-inserted edges.
    pub fn find_path(&self, from: VertexId, to: VertexId) -> Option<Path> {
        let routes = self.routes_from(from);
        let weight = routes.distance[to]?;

        let mut edges = Vec::new();
        let mut vertex = to;
        while vertex != from {
            let edge_id = routes.incoming[vertex]?;
            edges.push(edge_id);
            vertex = self.graph.edge(edge_id).from;
        }
        edges.reverse();

        Some(Path { weight, edges })
    }

    fn routes_from(&self, source: VertexId) -> Arc<SourceRoutes> {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(routes) = cache.get(&source) {
            return Arc::clone(routes);
        }

        let routes = Arc::new(self.dijkstra(source));
        cache.insert(source, Arc::clone(&routes));
        routes
    }

    fn dijkstra(&self, source: VertexId) -> SourceRoutes {
        let n = self.graph.vertex_count();
        let mut routes = SourceRoutes {
            distance: vec![None; n],
            incoming: vec![None; n],
        };
        let mut heap = BinaryHeap::new();

        routes.distance[source] = Some(0.0);
        heap.push(Visit {
            distance: 0.0,
            vertex: source,
        });

        while let Some(Visit { distance, vertex }) = heap.pop() {
            // Stale heap entry from a later improvement.
            if routes.distance[vertex].map_or(false, |best| distance > best) {
                continue;
            }

            for &edge_id in self.graph.edges_from(vertex) {
                let edge = self.graph.edge(edge_id);
                let candidate = distance + edge.weight;
                // Strict improvement only, so ties keep the first-inserted edge.
                if routes.distance[edge.to].map_or(true, |best| candidate < best) {
                    routes.distance[edge.to] = Some(candidate);
                    routes.incoming[edge.to] = Some(edge_id);
                    heap.push(Visit {
                        distance: candidate,
                        vertex: edge.to,
                    });
                }
            }
        }

        routes
    }
}
