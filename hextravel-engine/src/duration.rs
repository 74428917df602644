//! Terrain-aware travel time estimates for a route.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::TravelTimeConfig;
use crate::constants::HOURS_PER_DAY;
use crate::numbers::{floor_f64_to_u32, round_f64_to_u32};
use crate::route::Route;
use crate::terrain::{Terrain, TerrainLookup};

/// Estimated game-time cost of a route.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TravelDuration {
    pub total_days: f64,
    pub days: u32,
    /// Remaining hours, always `0..=23`.
    pub hours: u32,
}

impl fmt::Display for TravelDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: u32| if n == 1 { "" } else { "s" };
        match (self.days, self.hours) {
            (0, hours) => write!(f, "{hours} hour{}", plural(hours)),
            (days, 0) => write!(f, "{days} day{}", plural(days)),
            (days, hours) => write!(
                f,
                "{days} day{}, {hours} hour{}",
                plural(days),
                plural(hours)
            ),
        }
    }
}

/// Days needed to cross one hex of `terrain`.
#[must_use]
pub fn calculate_hex_travel_time(terrain: Terrain, cfg: &TravelTimeConfig) -> f64 {
    (1.0 / cfg.base_hexes_per_day) * cfg.multiplier(terrain)
}

/// Days needed to walk the route. The starting hex costs nothing.
///
/// Multipliers are summed before dividing by the pace so whole-day routes
/// come out exact instead of accumulating per-hex rounding error.
#[must_use]
pub fn calculate_route_travel_time(
    route: &Route,
    tiles: &(impl TerrainLookup + ?Sized),
    cfg: &TravelTimeConfig,
) -> f64 {
    let weight: f64 = route
        .path()
        .iter()
        .skip(1)
        .map(|coord| cfg.multiplier(tiles.terrain_at(*coord)))
        .sum();
    weight / cfg.base_hexes_per_day
}

/// Split fractional days into whole days and rounded hours.
///
/// A remainder that rounds to a full 24 hours collapses to 0 hours without
/// carrying into `days`.
#[must_use]
pub fn days_to_travel_duration(total_days: f64) -> TravelDuration {
    let days = floor_f64_to_u32(total_days);
    let remainder = total_days - f64::from(days);
    let mut hours = round_f64_to_u32(remainder * f64::from(HOURS_PER_DAY));
    if hours == HOURS_PER_DAY {
        hours = 0;
    }
    TravelDuration {
        total_days,
        days,
        hours,
    }
}

/// Whole-hour budget of a duration.
#[must_use]
pub const fn travel_duration_to_hours(duration: &TravelDuration) -> u32 {
    duration
        .days
        .saturating_mul(HOURS_PER_DAY)
        .saturating_add(duration.hours)
}

#[must_use]
pub fn calculate_travel_duration(
    route: &Route,
    tiles: &(impl TerrainLookup + ?Sized),
    cfg: &TravelTimeConfig,
) -> TravelDuration {
    days_to_travel_duration(calculate_route_travel_time(route, tiles, cfg))
}
