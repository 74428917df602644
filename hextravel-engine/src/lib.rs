//! Hex Travel Engine
//!
//! Platform-agnostic core for moving a token across a hex map along a
//! user-edited route. It covers hex geometry, immutable routes, frame-driven
//! playback, terrain-aware travel time, and the hour synchronizer that keeps
//! a calendar and encounter checks in step with the token.
//! Rendering, persistence and encounter content live with the host.

pub mod calendar;
pub mod config;
pub mod constants;
pub mod duration;
pub mod encounters;
pub mod hex;
pub mod numbers;
#[cfg(feature = "async")]
pub mod queue;
pub mod route;
pub mod sync;
pub mod terrain;
pub mod travel;

use std::rc::Rc;

// Re-export commonly used types
pub use calendar::{Calendar, HourClock};
pub use config::{
    AnimationConfig, ConfigError, EncounterConfig, TokenConfig, TravelConfig, TravelTimeConfig,
};
pub use duration::{
    TravelDuration, calculate_hex_travel_time, calculate_route_travel_time,
    calculate_travel_duration, days_to_travel_duration, travel_duration_to_hours,
};
pub use encounters::{ChanceEncounterTable, EncounterCheck, EncounterRoll, NoEncounters};
pub use hex::{AxialCoord, ParseCoordError, coords_in_radius, distance, line, neighbors};
#[cfg(feature = "async")]
pub use queue::{AsyncEncounterCheck, HexEnterNotice, Immediate, SerializedSynchronizer};
pub use route::{
    Route, Waypoint, append_waypoint, build_route, find_waypoint_at, move_waypoint,
    remove_waypoint, remove_waypoint_at, set_destination, waypoint_coords,
};
pub use sync::{HourCheck, HourCursor, TravelSynchronizer, hour_at};
pub use terrain::{Terrain, TerrainLookup, TileMap};
pub use travel::{
    AnimationState, HexEnterControl, HexEnterHandler, SessionSnapshot, SubscriptionId,
    TickOutcome, TokenState, TravelController, TravelSession, TravelState,
};

/// Trait for abstracting map data loading
/// Platform-specific implementations should provide this
pub trait MapDataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the terrain of the current map
    ///
    /// # Errors
    ///
    /// Returns an error if the tile data cannot be loaded.
    fn load_tiles(&self) -> Result<TileMap, Self::Error>;

    /// Load travel configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config(&self) -> Result<TravelConfig, Self::Error>;
}

/// Session type produced by [`TravelEngine`].
pub type StandardSession = TravelSession<HourClock, ChanceEncounterTable>;

/// Builds travel sessions from platform-provided map data.
pub struct TravelEngine<L>
where
    L: MapDataLoader,
{
    data_loader: L,
}

impl<L> TravelEngine<L>
where
    L: MapDataLoader,
{
    /// Create a new engine with the provided data loader
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    #[must_use]
    pub const fn loader(&self) -> &L {
        &self.data_loader
    }

    /// Session with the token on `start`, a default clock and seeded
    /// encounter checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the tiles or configuration cannot be loaded.
    pub fn create_session(
        &self,
        start: AxialCoord,
        seed: u64,
    ) -> Result<StandardSession, L::Error> {
        self.create_session_with(start, HourClock::default(), seed)
    }

    /// Session continuing from an existing calendar.
    ///
    /// # Errors
    ///
    /// Returns an error if the tiles or configuration cannot be loaded.
    pub fn create_session_with(
        &self,
        start: AxialCoord,
        calendar: HourClock,
        seed: u64,
    ) -> Result<StandardSession, L::Error> {
        let tiles = self.data_loader.load_tiles()?;
        let cfg = self.data_loader.load_config()?;
        let encounters = ChanceEncounterTable::from_seed(seed, cfg.encounters.clone());
        Ok(TravelSession::new(
            start,
            cfg,
            Rc::new(tiles),
            calendar,
            encounters,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl MapDataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_tiles(&self) -> Result<TileMap, Self::Error> {
            Ok([
                (AxialCoord::new(1, 0), Terrain::Road),
                (AxialCoord::new(2, 0), Terrain::Forest),
            ]
            .into_iter()
            .collect())
        }

        fn load_config(&self) -> Result<TravelConfig, Self::Error> {
            let mut cfg = TravelConfig::default_config();
            cfg.encounters.base_chance = 0.0;
            cfg.encounters.terrain_chance.clear();
            Ok(cfg)
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("map store offline")]
    struct Offline;

    struct FailingLoader;

    impl MapDataLoader for FailingLoader {
        type Error = Offline;

        fn load_tiles(&self) -> Result<TileMap, Self::Error> {
            Err(Offline)
        }

        fn load_config(&self) -> Result<TravelConfig, Self::Error> {
            Ok(TravelConfig::default())
        }
    }

    #[test]
    fn engine_creates_session_from_loader() {
        let engine = TravelEngine::new(FixtureLoader);
        let mut session = engine.create_session(AxialCoord::ORIGIN, 7).unwrap();
        session.handle_map_click(AxialCoord::new(2, 0));
        let estimate = session.estimated_duration().unwrap();
        // road 0.5 + forest 1.5 over 24 hexes per day
        assert_eq!((estimate.days, estimate.hours), (0, 2));
        assert_eq!(session.state().token.name, "Party");
    }

    #[test]
    fn engine_sessions_walk_to_destination() {
        let engine = TravelEngine::new(FixtureLoader);
        let mut session = engine
            .create_session_with(AxialCoord::ORIGIN, HourClock::new(3, 22), 1)
            .unwrap();
        session.handle_map_click(AxialCoord::new(2, 0));
        assert!(session.start_travel());
        while session.frame_requested() {
            session.tick(1_000.0);
        }
        assert_eq!(session.state().token.position, AxialCoord::new(2, 0));
        assert_eq!(session.calendar().to_string(), "Day 4, 00:00");
    }

    #[test]
    fn loader_errors_propagate() {
        let engine = TravelEngine::new(FailingLoader);
        assert!(engine.create_session(AxialCoord::ORIGIN, 1).is_err());
    }
}
