//! Transit catalogue and shortest-time itinerary router.
//!
//! The system runs in two phases. The load phase ingests stop and line
//! definitions plus directed road distances into the [`Catalogue`], then
//! wires and freezes the [`Router`]'s time-weighted graph. The query
//! phase answers read-only stop, line and itinerary requests, optionally
//! against a system restored from a [`snapshot`].

pub mod catalogue;
pub mod dijkstra;
pub mod error;
pub mod geo;
pub mod graph;
pub mod requests;
pub mod router;
pub mod snapshot;

pub use catalogue::{Catalogue, Line, LineInfo, Stop, StopInfo};
pub use error::{CatalogueError, RequestError, RouterError};
pub use router::{RouteInfo, RouteItem, Router, RoutingSettings};
