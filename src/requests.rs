//! JSON request protocol and the load-phase orchestration that feeds the
//! catalogue and router in their contractual order: all stops, then all
//! declared distances, then all lines; then the routing graph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::catalogue::Catalogue;
use crate::error::RequestError;
use crate::router::{RouteItem, Router, RoutingSettings};

#[derive(Debug, Deserialize)]
pub struct InputDocument {
    #[serde(default)]
    pub base_requests: Vec<BaseRequest>,
    pub routing_settings: Option<RoutingSettings>,
    #[serde(default)]
    pub stat_requests: Vec<StatRequest>,
    pub serialization_settings: Option<SerializationSettings>,
}

#[derive(Debug, Deserialize)]
pub struct SerializationSettings {
    pub file: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum BaseRequest {
    Stop(StopRequest),
    Bus(BusRequest),
}

#[derive(Debug, Deserialize)]
pub struct StopRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub road_distances: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
pub struct BusRequest {
    pub name: String,
    pub stops: Vec<String>,
    pub is_roundtrip: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StatRequest {
    Stop { id: u32, name: String },
    Bus { id: u32, name: String },
    Route { id: u32, from: String, to: String },
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum StatResponse {
    NotFound {
        request_id: u32,
        error_message: String,
    },
    Stop {
        request_id: u32,
        buses: Vec<String>,
    },
    Bus {
        request_id: u32,
        curvature: f64,
        route_length: f64,
        stop_count: usize,
        unique_stop_count: usize,
    },
    Route {
        request_id: u32,
        total_time: f64,
        items: Vec<ResponseItem>,
    },
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ResponseItem {
    Wait { stop_name: String, time: f64 },
    Bus { bus: String, span_count: usize, time: f64 },
}

impl StatResponse {
    fn not_found(request_id: u32) -> Self {
        Self::NotFound {
            request_id,
            error_message: "not found".to_owned(),
        }
    }
}

/// Runs the whole load phase: catalogue population followed by router
/// wiring and [`Router::build`]. Any configuration error aborts the load.
pub fn build_base(
    base_requests: &[BaseRequest],
    routing_settings: RoutingSettings,
) -> Result<(Catalogue, Router), RequestError> {
    let catalogue = build_catalogue(base_requests)?;
    let router = build_router(&catalogue, routing_settings)?;
    Ok((catalogue, router))
}

fn build_catalogue(base_requests: &[BaseRequest]) -> Result<Catalogue, RequestError> {
    let mut catalogue = Catalogue::new();

    for request in base_requests {
        if let BaseRequest::Stop(stop) = request {
            catalogue.add_stop(&stop.name, stop.latitude, stop.longitude)?;
        }
    }

    for request in base_requests {
        if let BaseRequest::Stop(stop) = request {
            for (neighbor, &meters) in &stop.road_distances {
                catalogue.add_distance(&stop.name, neighbor, meters)?;
            }
        }
    }

    for request in base_requests {
        if let BaseRequest::Bus(bus) = request {
            catalogue.add_line(&bus.name, &bus.stops, bus.is_roundtrip)?;
        }
    }

    info!(
        stops = catalogue.stops().count(),
        lines = catalogue.lines().count(),
        "catalogue loaded"
    );
    Ok(catalogue)
}

/// Wires the routing graph from catalogue data: a vertex pair and wait
/// edge per stop, then the O(stops²) per-line ride-edge expansion.
pub fn build_router(
    catalogue: &Catalogue,
    settings: RoutingSettings,
) -> Result<Router, RequestError> {
    let mut router = Router::new();
    router.set_settings(settings)?;

    for stop in catalogue.stops() {
        router.add_stop(&stop.name)?;
        router.add_wait_edge(&stop.name)?;
    }

    for line in catalogue.lines() {
        let names: Vec<&str> = line.stops.iter().map(|stop| stop.name.as_str()).collect();
        if line.is_roundtrip {
            let mut sequence = names.clone();
            if let Some(&first) = names.first() {
                if names.len() > 1 {
                    sequence.push(first);
                }
            }
            emit_ride_edges(catalogue, &mut router, &line.name, &sequence)?;
        } else {
            emit_ride_edges(catalogue, &mut router, &line.name, &names)?;
            let reversed: Vec<&str> = names.iter().rev().copied().collect();
            emit_ride_edges(catalogue, &mut router, &line.name, &reversed)?;
        }
    }

    router.build()?;
    debug!(edges = router.edge_records().len(), "routing graph built");
    Ok(router)
}

/// One ride edge per ordered position pair along `sequence`, with the
/// cumulative directed road distance between them.
fn emit_ride_edges(
    catalogue: &Catalogue,
    router: &mut Router,
    line_name: &str,
    sequence: &[&str],
) -> Result<(), RequestError> {
    for i in 0..sequence.len() {
        let mut cumulative = 0.0;
        for j in i + 1..sequence.len() {
            cumulative += catalogue.distance(sequence[j - 1], sequence[j])?;
            router.add_bus_edge(sequence[i], sequence[j], line_name, j - i, cumulative)?;
        }
    }
    Ok(())
}

/// Answers the query phase. Every request yields exactly one response
/// carrying its id; not-found and unreachable fold into the designated
/// `error_message` envelope.
pub fn process_stat_requests(
    catalogue: &Catalogue,
    router: &Router,
    stat_requests: &[StatRequest],
) -> Vec<StatResponse> {
    stat_requests
        .iter()
        .map(|request| match request {
            StatRequest::Stop { id, name } => match catalogue.stop_info(name) {
                Some(info) => StatResponse::Stop {
                    request_id: *id,
                    buses: info.lines.into_iter().collect(),
                },
                None => StatResponse::not_found(*id),
            },
            StatRequest::Bus { id, name } => match catalogue.line_info(name) {
                Some(info) => StatResponse::Bus {
                    request_id: *id,
                    curvature: info.curvature,
                    route_length: info.road_distance,
                    stop_count: info.stop_count,
                    unique_stop_count: info.unique_stop_count,
                },
                None => StatResponse::not_found(*id),
            },
            StatRequest::Route { id, from, to } => match router.route(from, to) {
                Ok(Some(info)) => StatResponse::Route {
                    request_id: *id,
                    total_time: info.total_time,
                    items: info.items.into_iter().map(ResponseItem::from).collect(),
                },
                Ok(None) => StatResponse::not_found(*id),
                Err(error) => {
                    warn!(%error, %from, %to, "route query failed");
                    StatResponse::not_found(*id)
                }
            },
        })
        .collect()
}

impl From<RouteItem> for ResponseItem {
    fn from(item: RouteItem) -> Self {
        match item {
            RouteItem::Wait { stop_name, time } => ResponseItem::Wait { stop_name, time },
            RouteItem::Ride {
                line_name,
                span_count,
                time,
            } => ResponseItem::Bus {
                bus: line_name,
                span_count,
                time,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_document() -> InputDocument {
        serde_json::from_str(
            r#"{
                "base_requests": [
                    {
                        "type": "Bus",
                        "name": "297",
                        "stops": ["Biryulyovo Zapadnoye", "Biryulyovo Tovarnaya", "Universam"],
                        "is_roundtrip": true
                    },
                    {
                        "type": "Stop",
                        "name": "Biryulyovo Zapadnoye",
                        "latitude": 55.574371,
                        "longitude": 37.6517,
                        "road_distances": {"Biryulyovo Tovarnaya": 2600}
                    },
                    {
                        "type": "Stop",
                        "name": "Universam",
                        "latitude": 55.587655,
                        "longitude": 37.645687,
                        "road_distances": {"Biryulyovo Zapadnoye": 2500, "Biryulyovo Tovarnaya": 1380}
                    },
                    {
                        "type": "Stop",
                        "name": "Biryulyovo Tovarnaya",
                        "latitude": 55.592028,
                        "longitude": 37.653656,
                        "road_distances": {"Universam": 890}
                    }
                ],
                "routing_settings": {"bus_wait_time": 6, "bus_velocity": 40},
                "stat_requests": [
                    {"id": 1, "type": "Bus", "name": "297"},
                    {"id": 2, "type": "Stop", "name": "Universam"},
                    {"id": 3, "type": "Route", "from": "Biryulyovo Zapadnoye", "to": "Universam"},
                    {"id": 4, "type": "Stop", "name": "Prazhskaya"},
                    {"id": 5, "type": "Bus", "name": "999"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn load_order_is_stops_distances_lines() {
        // The bus comes first in base_requests; building must still work.
        let document = sample_document();
        let settings = document.routing_settings.unwrap();
        let (catalogue, _router) = build_base(&document.base_requests, settings).unwrap();

        let info = catalogue.line_info("297").unwrap();
        assert_eq!(info.stop_count, 3);
        assert_relative_eq!(info.road_distance, 2600.0 + 890.0 + 2500.0);
    }

    #[test]
    fn stat_responses_carry_request_ids_and_envelopes() {
        let document = sample_document();
        let settings = document.routing_settings.unwrap();
        let (catalogue, router) = build_base(&document.base_requests, settings).unwrap();
        let responses =
            process_stat_requests(&catalogue, &router, &document.stat_requests);

        assert_eq!(responses.len(), 5);
        match &responses[1] {
            StatResponse::Stop { request_id, buses } => {
                assert_eq!(*request_id, 2);
                assert_eq!(buses, &["297".to_owned()]);
            }
            other => panic!("expected stop response, got {other:?}"),
        }
        assert_eq!(responses[3], StatResponse::not_found(4));
        assert_eq!(responses[4], StatResponse::not_found(5));
    }

    #[test]
    fn route_response_lists_wait_then_ride() {
        let document = sample_document();
        let settings = document.routing_settings.unwrap();
        let (catalogue, router) = build_base(&document.base_requests, settings).unwrap();
        let responses =
            process_stat_requests(&catalogue, &router, &document.stat_requests);

        match &responses[2] {
            StatResponse::Route {
                request_id,
                total_time,
                items,
            } => {
                assert_eq!(*request_id, 3);
                // wait 6 min, then 3490 m at 40 km/h = 5.235 min.
                assert_relative_eq!(*total_time, 11.235, max_relative = 1e-9);
                match items.as_slice() {
                    [ResponseItem::Wait { stop_name, time: wait }, ResponseItem::Bus { bus, span_count, time: ride }] =>
                    {
                        assert_eq!(stop_name, "Biryulyovo Zapadnoye");
                        assert_eq!(*wait, 6.0);
                        assert_eq!(bus, "297");
                        assert_eq!(*span_count, 2);
                        assert_relative_eq!(*ride, 5.235, max_relative = 1e-9);
                    }
                    other => panic!("unexpected items {other:?}"),
                }
            }
            other => panic!("expected route response, got {other:?}"),
        }
    }

    #[test]
    fn unreachable_route_folds_into_not_found_envelope() {
        let document: InputDocument = serde_json::from_str(
            r#"{
                "base_requests": [
                    {"type": "Stop", "name": "A", "latitude": 55.0, "longitude": 37.0, "road_distances": {}},
                    {"type": "Stop", "name": "B", "latitude": 55.1, "longitude": 37.1, "road_distances": {}}
                ],
                "routing_settings": {"bus_wait_time": 2, "bus_velocity": 30},
                "stat_requests": [{"id": 7, "type": "Route", "from": "A", "to": "B"}]
            }"#,
        )
        .unwrap();
        let settings = document.routing_settings.unwrap();
        let (catalogue, router) = build_base(&document.base_requests, settings).unwrap();
        let responses =
            process_stat_requests(&catalogue, &router, &document.stat_requests);
        assert_eq!(responses[0], StatResponse::not_found(7));
    }

    #[test]
    fn response_json_shape_matches_protocol() {
        let response = StatResponse::Route {
            request_id: 3,
            total_time: 11.235,
            items: vec![ResponseItem::Wait {
                stop_name: "A".to_owned(),
                time: 6.0,
            }],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "request_id": 3,
                "total_time": 11.235,
                "items": [{"type": "Wait", "stop_name": "A", "time": 6.0}]
            })
        );
    }

    #[test]
    fn unknown_stop_in_line_aborts_the_load() {
        let document: InputDocument = serde_json::from_str(
            r#"{
                "base_requests": [
                    {"type": "Stop", "name": "A", "latitude": 55.0, "longitude": 37.0, "road_distances": {}},
                    {"type": "Bus", "name": "1", "stops": ["A", "Ghost"], "is_roundtrip": false}
                ],
                "routing_settings": {"bus_wait_time": 2, "bus_velocity": 30}
            }"#,
        )
        .unwrap();
        let settings = document.routing_settings.unwrap();
        assert!(build_base(&document.base_requests, settings).is_err());
    }
}
