pub type VertexId = usize;
pub type EdgeId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
    pub weight: f64,
}

/// A frozen-size directed weighted graph. Vertices are dense ids in
/// `0..vertex_count`; edges keep their insertion index, which callers use
/// as the join key back to edge metadata.
#[derive(Debug, Clone)]
pub struct DirectedWeightedGraph {
    edges: Vec<Edge>,
    incidence: Vec<Vec<EdgeId>>,
}

impl DirectedWeightedGraph {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            edges: Vec::new(),
            incidence: vec![Vec::new(); vertex_count],
        }
    }

    pub fn add_edge(&mut self, edge: Edge) -> EdgeId {
        let id = self.edges.len();
        self.incidence[edge.from].push(id);
        self.edges.push(edge);
        id
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    pub fn vertex_count(&self) -> usize {
        self.incidence.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outgoing edge ids of `vertex`, in insertion order.
    pub fn edges_from(&self, vertex: VertexId) -> &[EdgeId] {
        &self.incidence[vertex]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_keep_insertion_ids() {
        let mut graph = DirectedWeightedGraph::new(3);
        let a = graph.add_edge(Edge {
            from: 0,
            to: 1,
            weight: 1.0,
        });
        let b = graph.add_edge(Edge {
            from: 0,
            to: 2,
            weight: 2.0,
        });

        assert_eq!((a, b), (0, 1));
        assert_eq!(graph.edge(b).to, 2);
        assert_eq!(graph.edges_from(0), &[0, 1]);
        assert!(graph.edges_from(1).is_empty());
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }
}
