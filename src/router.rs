use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::dijkstra::PathEngine;
use crate::error::RouterError;
use crate::graph::{DirectedWeightedGraph, Edge, VertexId};

const METERS_PER_KM: f64 = 1000.0;
const MINUTES_PER_HOUR: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingSettings {
    /// Minutes spent waiting at a stop before boarding.
    pub bus_wait_time: f64,
    /// Bus velocity in km/h.
    pub bus_velocity: f64,
}

/// The two graph vertices backing one stop: a ride can only start after
/// the wait edge from `wait_start` to `wait_end` has been taken, so
/// waiting and riding through a stop are never interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopVertices {
    pub wait_start: VertexId,
    pub wait_end: VertexId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    Wait { stop: String },
    Ride { line: String, span_count: usize },
}

/// A graph edge plus the metadata needed to narrate it back to the caller.
/// Its index in the router's edge list doubles as the graph edge id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: VertexId,
    pub to: VertexId,
    pub time: f64,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteItem {
    Wait {
        stop_name: String,
        time: f64,
    },
    Ride {
        line_name: String,
        span_count: usize,
        time: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    pub total_time: f64,
    pub items: Vec<RouteItem>,
}

#[derive(Debug)]
enum State {
    Unbuilt,
    Built { engine: PathEngine },
}

/// Shortest-time itinerary router. Fed during the load phase with stops,
/// wait edges and pre-expanded bus edges, then frozen with [`Router::build`];
/// afterwards only [`Router::route`] is reachable.
#[derive(Debug)]
pub struct Router {
    settings: Option<RoutingSettings>,
    vertex_ids: HashMap<String, StopVertices>,
    stop_order: Vec<String>,
    edges: Vec<EdgeRecord>,
    state: State,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            settings: None,
            vertex_ids: HashMap::new(),
            stop_order: Vec::new(),
            edges: Vec::new(),
            state: State::Unbuilt,
        }
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstructs a loaded router from persisted parts. The caller still
    /// has to invoke [`Router::build`]; solver tables are never persisted.
    pub fn from_parts(
        settings: RoutingSettings,
        stops: Vec<(String, StopVertices)>,
        edges: Vec<EdgeRecord>,
    ) -> Self {
        let mut router = Self::new();
        router.settings = Some(settings);
        for (name, vertices) in stops {
            router.stop_order.push(name.clone());
            router.vertex_ids.insert(name, vertices);
        }
        router.edges = edges;
        router
    }

    pub fn set_settings(&mut self, settings: RoutingSettings) -> Result<(), RouterError> {
        self.ensure_unbuilt()?;
        if self.settings.is_some() {
            return Err(RouterError::SettingsAlreadySet);
        }
        self.settings = Some(settings);
        Ok(())
    }

    pub fn settings(&self) -> Option<RoutingSettings> {
        self.settings
    }

    /// Allocates the vertex pair for `stop_name` on first sight; repeat
    /// calls are no-ops.
    pub fn add_stop(&mut self, stop_name: &str) -> Result<(), RouterError> {
        self.ensure_unbuilt()?;
        if !self.vertex_ids.contains_key(stop_name) {
            let wait_start = self.vertex_ids.len() * 2;
            self.vertex_ids.insert(
                stop_name.to_owned(),
                StopVertices {
                    wait_start,
                    wait_end: wait_start + 1,
                },
            );
            self.stop_order.push(stop_name.to_owned());
        }
        Ok(())
    }

    pub fn add_wait_edge(&mut self, stop_name: &str) -> Result<(), RouterError> {
        self.ensure_unbuilt()?;
        let settings = self.settings.ok_or(RouterError::SettingsMissing)?;
        let vertices = self.require_stop(stop_name)?;

        self.edges.push(EdgeRecord {
            from: vertices.wait_start,
            to: vertices.wait_end,
            time: settings.bus_wait_time,
            kind: EdgeKind::Wait {
                stop: stop_name.to_owned(),
            },
        });
        Ok(())
    }

    /// Stores one pre-expanded ride edge covering `span_count` hops with
    /// `distance` cumulative road meters along `line_name`.
    pub fn add_bus_edge(
        &mut self,
        from: &str,
        to: &str,
        line_name: &str,
        span_count: usize,
        distance: f64,
    ) -> Result<(), RouterError> {
        self.ensure_unbuilt()?;
        let settings = self.settings.ok_or(RouterError::SettingsMissing)?;
        let from_vertices = self.require_stop(from)?;
        let to_vertices = self.require_stop(to)?;

        let time = distance / (settings.bus_velocity * METERS_PER_KM / MINUTES_PER_HOUR);
        self.edges.push(EdgeRecord {
            from: from_vertices.wait_end,
            to: to_vertices.wait_start,
            time,
            kind: EdgeKind::Ride {
                line: line_name.to_owned(),
                span_count,
            },
        });
        Ok(())
    }

    /// Freezes the vertex set, materializes the graph and constructs the
    /// path engine. Idempotent once built.
    pub fn build(&mut self) -> Result<(), RouterError> {
        if matches!(self.state, State::Built { .. }) {
            return Ok(());
        }
        if self.settings.is_none() {
            return Err(RouterError::SettingsMissing);
        }
        if self.vertex_ids.is_empty() {
            return Err(RouterError::NoStops);
        }

        let mut graph = DirectedWeightedGraph::new(self.vertex_ids.len() * 2);
        for record in &self.edges {
            graph.add_edge(Edge {
                from: record.from,
                to: record.to,
                weight: record.time,
            });
        }

        self.state = State::Built {
            engine: PathEngine::new(graph),
        };
        Ok(())
    }

    /// Shortest-time itinerary between two registered stops. `Ok(None)`
    /// means the stops are known but disconnected; unknown names and
    /// querying before [`Router::build`] are errors.
    pub fn route(&self, from: &str, to: &str) -> Result<Option<RouteInfo>, RouterError> {
        let engine = match &self.state {
            State::Built { engine } => engine,
            State::Unbuilt => return Err(RouterError::NotBuilt),
        };
        let from_vertices = self.require_stop(from)?;
        let to_vertices = self.require_stop(to)?;

        let Some(path) = engine.find_path(from_vertices.wait_start, to_vertices.wait_start)
        else {
            return Ok(None);
        };

        let items = path
            .edges
            .iter()
            .map(|&edge_id| {
                let record = &self.edges[edge_id];
                match &record.kind {
                    EdgeKind::Wait { stop } => RouteItem::Wait {
                        stop_name: stop.clone(),
                        time: record.time,
                    },
                    EdgeKind::Ride { line, span_count } => RouteItem::Ride {
                        line_name: line.clone(),
                        span_count: *span_count,
                        time: record.time,
                    },
                }
            })
            .collect();

        Ok(Some(RouteInfo {
            total_time: path.weight,
            items,
        }))
    }

    /// Stop names with their vertex pairs, in first-seen order.
    pub fn stop_vertices(&self) -> impl Iterator<Item = (&str, StopVertices)> {
        self.stop_order
            .iter()
            .map(|name| (name.as_str(), self.vertex_ids[name]))
    }

    pub fn edge_records(&self) -> &[EdgeRecord] {
        &self.edges
    }

    fn require_stop(&self, stop_name: &str) -> Result<StopVertices, RouterError> {
        self.vertex_ids
            .get(stop_name)
            .copied()
            .ok_or_else(|| RouterError::UnknownStop {
                stop: stop_name.to_owned(),
            })
    }

    fn ensure_unbuilt(&self) -> Result<(), RouterError> {
        match self.state {
            State::Unbuilt => Ok(()),
            State::Built { .. } => Err(RouterError::AlreadyBuilt),
        }
    }
}
