//! Persisted form of the loaded system: catalogue inputs, routing
//! settings, the vertex-id table and the full edge list. Solver tables
//! are never persisted; loading ends with an explicit [`Router::build`].

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::info;

use crate::catalogue::Catalogue;
use crate::error::{RequestError, RouterError};
use crate::router::{EdgeRecord, Router, RoutingSettings, StopVertices};

#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    stops: Vec<StopRecord>,
    distances: Vec<DistanceRecord>,
    lines: Vec<LineRecord>,
    routing_settings: RoutingSettings,
    stop_vertices: Vec<(String, StopVertices)>,
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StopRecord {
    name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct DistanceRecord {
    from: String,
    to: String,
    meters: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct LineRecord {
    name: String,
    stops: Vec<String>,
    is_roundtrip: bool,
}

impl Snapshot {
    pub fn capture(catalogue: &Catalogue, router: &Router) -> Result<Self, RequestError> {
        let settings = router.settings().ok_or(RouterError::SettingsMissing)?;

        let mut distances: Vec<DistanceRecord> = catalogue
            .declared_distances()
            .map(|(from, to, meters)| DistanceRecord {
                from: from.to_owned(),
                to: to.to_owned(),
                meters,
            })
            .collect();
        // Declared distances live in a hash map; order the snapshot.
        distances.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));

        Ok(Self {
            stops: catalogue
                .stops()
                .map(|stop| StopRecord {
                    name: stop.name.clone(),
                    latitude: stop.coordinates.lat,
                    longitude: stop.coordinates.lng,
                })
                .collect(),
            distances,
            lines: catalogue
                .lines()
                .map(|line| LineRecord {
                    name: line.name.clone(),
                    stops: line.stops.iter().map(|stop| stop.name.clone()).collect(),
                    is_roundtrip: line.is_roundtrip,
                })
                .collect(),
            routing_settings: settings,
            stop_vertices: router
                .stop_vertices()
                .map(|(name, vertices)| (name.to_owned(), vertices))
                .collect(),
            edges: router.edge_records().to_vec(),
        })
    }

    /// Reconstructs a structurally equivalent catalogue and a built router.
    pub fn restore(self) -> Result<(Catalogue, Router), RequestError> {
        let mut catalogue = Catalogue::new();
        for stop in &self.stops {
            catalogue.add_stop(&stop.name, stop.latitude, stop.longitude)?;
        }
        for distance in &self.distances {
            catalogue.add_distance(&distance.from, &distance.to, distance.meters)?;
        }
        for line in &self.lines {
            catalogue.add_line(&line.name, &line.stops, line.is_roundtrip)?;
        }

        let mut router =
            Router::from_parts(self.routing_settings, self.stop_vertices, self.edges);
        router.build()?;

        info!(
            stops = catalogue.stops().count(),
            lines = catalogue.lines().count(),
            "snapshot restored"
        );
        Ok((catalogue, router))
    }
}

pub fn save<W: Write>(
    catalogue: &Catalogue,
    router: &Router,
    writer: W,
) -> Result<(), RequestError> {
    let snapshot = Snapshot::capture(catalogue, router)?;
    serde_json::to_writer(writer, &snapshot)?;
    Ok(())
}

pub fn load<R: Read>(reader: R) -> Result<(Catalogue, Router), RequestError> {
    let snapshot: Snapshot = serde_json::from_reader(reader)?;
    snapshot.restore()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::{build_base, InputDocument};

    fn loaded_system() -> (Catalogue, Router) {
        let document: InputDocument = serde_json::from_str(
            r#"{
                "base_requests": [
                    {"type": "Stop", "name": "A", "latitude": 55.574371, "longitude": 37.6517,
                     "road_distances": {"B": 2600}},
                    {"type": "Stop", "name": "B", "latitude": 55.587655, "longitude": 37.645687,
                     "road_distances": {"A": 2500}},
                    {"type": "Stop", "name": "Depot", "latitude": 55.6, "longitude": 37.7,
                     "road_distances": {}},
                    {"type": "Bus", "name": "297", "stops": ["A", "B"], "is_roundtrip": false}
                ],
                "routing_settings": {"bus_wait_time": 6, "bus_velocity": 40}
            }"#,
        )
        .unwrap();
        let settings = document.routing_settings.unwrap();
        build_base(&document.base_requests, settings).unwrap()
    }

    #[test]
    fn round_trip_reproduces_every_answer() {
        let (catalogue, router) = loaded_system();

        let mut buffer = Vec::new();
        save(&catalogue, &router, &mut buffer).unwrap();
        let (restored_catalogue, restored_router) = load(buffer.as_slice()).unwrap();

        for stop in ["A", "B", "Depot", "Nowhere"] {
            assert_eq!(
                catalogue.stop_info(stop),
                restored_catalogue.stop_info(stop),
                "stop {stop}"
            );
        }
        assert_eq!(
            catalogue.line_info("297"),
            restored_catalogue.line_info("297")
        );
        assert_eq!(
            router.route("A", "B").unwrap(),
            restored_router.route("A", "B").unwrap()
        );
        assert_eq!(
            router.route("A", "Depot").unwrap(),
            restored_router.route("A", "Depot").unwrap()
        );
    }

    #[test]
    fn snapshot_preserves_directed_distances() {
        let (catalogue, router) = loaded_system();
        let mut buffer = Vec::new();
        save(&catalogue, &router, &mut buffer).unwrap();
        let (restored, _) = load(buffer.as_slice()).unwrap();

        assert_eq!(restored.distance("A", "B").unwrap(), 2600.0);
        assert_eq!(restored.distance("B", "A").unwrap(), 2500.0);
    }

    #[test]
    fn capture_requires_routing_settings() {
        let mut catalogue = Catalogue::new();
        catalogue.add_stop("A", 55.0, 37.0).unwrap();
        let router = Router::new();
        assert!(Snapshot::capture(&catalogue, &router).is_err());
    }

    #[test]
    fn restore_rejects_a_corrupt_line_reference() {
        let (catalogue, router) = loaded_system();
        let mut snapshot = Snapshot::capture(&catalogue, &router).unwrap();
        snapshot.lines.push(LineRecord {
            name: "ghost".to_owned(),
            stops: vec!["Missing".to_owned()],
            is_roundtrip: true,
        });
        assert!(snapshot.restore().is_err());
    }
}
