//! Waypoint routes and the dense hex paths expanded from them.
//!
//! A [`Route`] is an immutable value. Every edit takes the current waypoint
//! coordinates, applies the change, and rebuilds the whole route through
//! [`build_route`], so `path` and `total_distance` are always derived from
//! `waypoints` and never patched.

use serde::{Deserialize, Serialize};

use crate::hex::{AxialCoord, distance, line};

/// User- or system-placed control point of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Waypoint {
    pub coord: AxialCoord,
    /// Position in the waypoint list; 0 is the start.
    pub index: usize,
}

/// Ordered waypoints plus every hex crossed between them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RouteSnapshot")]
pub struct Route {
    waypoints: Vec<Waypoint>,
    path: Vec<AxialCoord>,
    total_distance: u32,
}

/// Deserialization shape: only the waypoints are trusted, the rest is rebuilt.
#[derive(Deserialize)]
struct RouteSnapshot {
    #[serde(default)]
    waypoints: Vec<Waypoint>,
}

impl From<RouteSnapshot> for Route {
    fn from(snapshot: RouteSnapshot) -> Self {
        let mut waypoints = snapshot.waypoints;
        waypoints.sort_by_key(|w| w.index);
        let coords: Vec<AxialCoord> = waypoints.iter().map(|w| w.coord).collect();
        build_route(&coords)
    }
}

impl Route {
    /// The canonical empty route.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            waypoints: Vec::new(),
            path: Vec::new(),
            total_distance: 0,
        }
    }

    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Dense, gap-free hex path starting at waypoint 0.
    #[must_use]
    pub fn path(&self) -> &[AxialCoord] {
        &self.path
    }

    /// Sum of hex distances between consecutive waypoints.
    #[must_use]
    pub const fn total_distance(&self) -> u32 {
        self.total_distance
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    #[must_use]
    pub fn start(&self) -> Option<AxialCoord> {
        self.path.first().copied()
    }

    #[must_use]
    pub fn destination(&self) -> Option<AxialCoord> {
        self.path.last().copied()
    }

    /// Index of the final path hex, 0 for empty and single-hex routes.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Expand a waypoint coordinate list into a route.
#[must_use]
pub fn build_route(coords: &[AxialCoord]) -> Route {
    let waypoints: Vec<Waypoint> = coords
        .iter()
        .enumerate()
        .map(|(index, coord)| Waypoint {
            coord: *coord,
            index,
        })
        .collect();

    let Some(first) = coords.first() else {
        return Route::empty();
    };

    let mut path = vec![*first];
    let mut total_distance = 0u32;
    for pair in coords.windows(2) {
        let segment = line(pair[0], pair[1]);
        path.extend(segment.into_iter().skip(1));
        total_distance = total_distance.saturating_add(distance(pair[0], pair[1]));
    }

    Route {
        waypoints,
        path,
        total_distance,
    }
}

/// Waypoint coordinates in list order.
#[must_use]
pub fn waypoint_coords(route: &Route) -> Vec<AxialCoord> {
    route.waypoints.iter().map(|w| w.coord).collect()
}

#[must_use]
pub fn append_waypoint(route: &Route, coord: AxialCoord) -> Route {
    let mut coords = waypoint_coords(route);
    coords.push(coord);
    build_route(&coords)
}

/// Remove the waypoint at `index`. The start (index 0) can never be removed.
#[must_use]
pub fn remove_waypoint(route: &Route, index: usize) -> Route {
    if index == 0 || index >= route.waypoints.len() {
        return route.clone();
    }
    let mut coords = waypoint_coords(route);
    coords.remove(index);
    build_route(&coords)
}

#[must_use]
pub fn move_waypoint(route: &Route, index: usize, coord: AxialCoord) -> Route {
    let mut coords = waypoint_coords(route);
    let Some(slot) = coords.get_mut(index) else {
        return route.clone();
    };
    *slot = coord;
    build_route(&coords)
}

/// First waypoint in list order sitting exactly on `coord`.
#[must_use]
pub fn find_waypoint_at(route: &Route, coord: AxialCoord) -> Option<&Waypoint> {
    route.waypoints.iter().find(|w| w.coord == coord)
}

/// Replace everything after the start with a single destination.
///
/// An empty route has no start, so the destination becomes a single-waypoint route.
#[must_use]
pub fn set_destination(route: &Route, coord: AxialCoord) -> Route {
    match route.waypoints.first() {
        Some(start) => build_route(&[start.coord, coord]),
        None => build_route(&[coord]),
    }
}

/// Remove the first non-start waypoint on `coord`, if there is one.
#[must_use]
pub fn remove_waypoint_at(route: &Route, coord: AxialCoord) -> Route {
    route
        .waypoints
        .iter()
        .find(|w| w.index > 0 && w.coord == coord)
        .map_or_else(|| route.clone(), |w| remove_waypoint(route, w.index))
}
