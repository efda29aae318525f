use itertools::Itertools;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::CatalogueError;
use crate::geo::{self, Coordinates};

#[derive(Debug, PartialEq)]
pub struct Stop {
    pub name: String,
    pub coordinates: Coordinates,
}

/// A bus line over an ordered stop sequence. For a roundtrip line the
/// declared sequence implicitly returns to its first stop; a linear line
/// is ridden forward and then back to its origin.
#[derive(Debug)]
pub struct Line {
    pub name: String,
    pub stops: Vec<Arc<Stop>>,
    pub is_roundtrip: bool,
    pub unique_stops: BTreeSet<String>,
    pub geo_distance: f64,
    pub road_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopInfo {
    pub name: String,
    pub lines: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineInfo {
    pub name: String,
    pub stop_count: usize,
    pub unique_stop_count: usize,
    pub road_distance: f64,
    pub curvature: f64,
}

/// The in-memory transit catalogue: stops, lines, directed road distances
/// and the per-stop line-membership index.
///
/// Callers must load it in order-classes: all stops, then all distances,
/// then all lines. Line statistics are computed once at insertion, so a
/// distance declared after a line does not retroactively change that line.
#[derive(Debug, Default)]
pub struct Catalogue {
    stops: Vec<Arc<Stop>>,
    lines: Vec<Line>,
    stop_index: HashMap<String, Arc<Stop>>,
    line_index: HashMap<String, usize>,
    lines_by_stop: HashMap<String, BTreeSet<String>>,
    distances: HashMap<(String, String), f64>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stop(&mut self, name: &str, lat: f64, lng: f64) -> Result<(), CatalogueError> {
        if self.stop_index.contains_key(name) {
            return Err(CatalogueError::DuplicateStop {
                name: name.to_owned(),
            });
        }

        let stop = Arc::new(Stop {
            name: name.to_owned(),
            coordinates: Coordinates { lat, lng },
        });

        self.stops.push(Arc::clone(&stop));
        self.stop_index.insert(name.to_owned(), stop);
        self.lines_by_stop.entry(name.to_owned()).or_default();

        Ok(())
    }

    /// Records a directed road distance in meters. The reverse direction is
    /// a separate entry; see [`Catalogue::distance`] for the lookup fallback.
    pub fn add_distance(&mut self, from: &str, to: &str, meters: f64) -> Result<(), CatalogueError> {
        for stop in [from, to] {
            if !self.stop_index.contains_key(stop) {
                return Err(CatalogueError::UnknownStop {
                    stop: stop.to_owned(),
                });
            }
        }

        self.distances
            .insert((from.to_owned(), to.to_owned()), meters);

        Ok(())
    }

    /// Road distance from `from` to `to`: the directed entry if declared,
    /// else the declared reverse entry, else the great-circle distance.
    pub fn distance(&self, from: &str, to: &str) -> Result<f64, CatalogueError> {
        let from_stop = self.require_stop(from)?;
        let to_stop = self.require_stop(to)?;

        if let Some(&d) = self.distances.get(&(from.to_owned(), to.to_owned())) {
            return Ok(d);
        }
        if let Some(&d) = self.distances.get(&(to.to_owned(), from.to_owned())) {
            return Ok(d);
        }

        Ok(geo::distance(from_stop.coordinates, to_stop.coordinates))
    }

    pub fn add_line(
        &mut self,
        name: &str,
        stop_names: &[String],
        is_roundtrip: bool,
    ) -> Result<(), CatalogueError> {
        if self.line_index.contains_key(name) {
            return Err(CatalogueError::DuplicateLine {
                name: name.to_owned(),
            });
        }

        let mut stops = Vec::with_capacity(stop_names.len());
        for stop_name in stop_names {
            let stop = self.stop_index.get(stop_name).ok_or_else(|| {
                CatalogueError::NoStopOnLine {
                    stop: stop_name.to_owned(),
                    line: name.to_owned(),
                }
            })?;
            stops.push(Arc::clone(stop));
        }

        let unique_stops: BTreeSet<String> =
            stops.iter().map(|stop| stop.name.clone()).collect();

        let (geo_distance, road_distance) = self.measure(&stops, is_roundtrip)?;

        for stop in &stops {
            self.lines_by_stop
                .entry(stop.name.clone())
                .or_default()
                .insert(name.to_owned());
        }

        self.line_index.insert(name.to_owned(), self.lines.len());
        self.lines.push(Line {
            name: name.to_owned(),
            stops,
            is_roundtrip,
            unique_stops,
            geo_distance,
            road_distance,
        });

        Ok(())
    }

    /// Aggregate geo and road length of a stop sequence, honoring the
    /// roundtrip / out-and-back traversal rules.
    fn measure(
        &self,
        stops: &[Arc<Stop>],
        is_roundtrip: bool,
    ) -> Result<(f64, f64), CatalogueError> {
        let mut geo_forward = 0.0;
        let mut road_forward = 0.0;
        let mut road_backward = 0.0;

        for (a, b) in stops.iter().tuple_windows() {
            geo_forward += geo::distance(a.coordinates, b.coordinates);
            road_forward += self.distance(&a.name, &b.name)?;
            road_backward += self.distance(&b.name, &a.name)?;
        }

        if is_roundtrip {
            // Close the loop back to the origin.
            if let (Some(last), Some(first)) = (stops.last(), stops.first()) {
                if stops.len() > 1 {
                    geo_forward += geo::distance(last.coordinates, first.coordinates);
                    road_forward += self.distance(&last.name, &first.name)?;
                }
            }
            Ok((geo_forward, road_forward))
        } else {
            Ok((geo_forward * 2.0, road_forward + road_backward))
        }
    }

    pub fn find_stop(&self, name: &str) -> Option<&Arc<Stop>> {
        self.stop_index.get(name)
    }

    pub fn find_line(&self, name: &str) -> Option<&Line> {
        self.line_index.get(name).map(|&i| &self.lines[i])
    }

    /// `None` means the stop was never added; a stop with no service yields
    /// `Some` with an empty line set.
    pub fn stop_info(&self, name: &str) -> Option<StopInfo> {
        let lines = self.lines_by_stop.get(name)?;
        Some(StopInfo {
            name: name.to_owned(),
            lines: lines.clone(),
        })
    }

    pub fn line_info(&self, name: &str) -> Option<LineInfo> {
        let line = self.find_line(name)?;

        let stop_count = if line.is_roundtrip {
            line.stops.len()
        } else {
            (2 * line.stops.len()).saturating_sub(1)
        };

        // A degenerate line with zero straight-line length is declared
        // exactly as curved as its straight-line path.
        let curvature = if line.geo_distance == 0.0 {
            1.0
        } else {
            line.road_distance / line.geo_distance
        };

        Some(LineInfo {
            name: line.name.clone(),
            stop_count,
            unique_stop_count: line.unique_stops.len(),
            road_distance: line.road_distance,
            curvature,
        })
    }

    /// Stops in insertion order.
    pub fn stops(&self) -> impl Iterator<Item = &Arc<Stop>> {
        self.stops.iter()
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    /// Every declared directed distance entry.
    pub fn declared_distances(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.distances
            .iter()
            .map(|((from, to), &d)| (from.as_str(), to.as_str(), d))
    }

    fn require_stop(&self, name: &str) -> Result<&Arc<Stop>, CatalogueError> {
        self.stop_index
            .get(name)
            .ok_or_else(|| CatalogueError::UnknownStop {
                stop: name.to_owned(),
            })
    }
}
