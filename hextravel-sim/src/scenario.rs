use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

use hextravel_engine::{AxialCoord, HourClock, Terrain, TileMap, TravelConfig};

/// One painted tile in a scenario file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSpec {
    pub coord: AxialCoord,
    pub terrain: Terrain,
}

/// Starting calendar position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarStart {
    pub day: u32,
    pub hour: u32,
}

impl Default for CalendarStart {
    fn default() -> Self {
        let clock = HourClock::default();
        Self {
            day: clock.day,
            hour: clock.hour,
        }
    }
}

/// Scripted journey: where the party starts, where the user clicks, and the
/// map it crosses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start: AxialCoord,
    /// Map clicks in order. The first sets the destination, the rest append.
    pub waypoints: Vec<AxialCoord>,
    #[serde(default)]
    pub default_terrain: Terrain,
    #[serde(default)]
    pub tiles: Vec<TileSpec>,
    /// Overrides the embedded travel configuration.
    #[serde(default)]
    pub config: Option<TravelConfig>,
    #[serde(default)]
    pub calendar: CalendarStart,
}

impl Scenario {
    /// Load and validate a scenario file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let scenario: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scenario {}", path.display()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        if self.waypoints.is_empty() {
            bail!("scenario '{}' has no waypoints", self.name);
        }
        if let Some(cfg) = &self.config {
            cfg.validate()
                .with_context(|| format!("scenario '{}' has an invalid config", self.name))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn tile_map(&self) -> TileMap {
        let mut map = TileMap::with_fallback(self.default_terrain);
        for tile in &self.tiles {
            map.insert(tile.coord, tile.terrain);
        }
        map
    }

    #[must_use]
    pub fn travel_config(&self) -> TravelConfig {
        self.config
            .clone()
            .unwrap_or_else(TravelConfig::default_config)
    }

    #[must_use]
    pub const fn clock(&self) -> HourClock {
        HourClock::new(self.calendar.day, self.calendar.hour)
    }
}

const BUILTIN_SCENARIOS: &[(&str, &str)] = &[
    ("demo", "Road, forest and hills on a three-waypoint route"),
    ("mountain-pass", "Single long leg through a mountain range"),
    ("swamp-loop", "Loop through swamp that returns to the start"),
];

/// Built-in scenario keys with descriptions.
pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    BUILTIN_SCENARIOS.iter().copied()
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<Scenario> {
    let description = BUILTIN_SCENARIOS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, description)| (*description).to_string())?;
    let c = AxialCoord::new;
    let band = |terrain: Terrain, coords: &[AxialCoord]| -> Vec<TileSpec> {
        coords
            .iter()
            .map(|&coord| TileSpec { coord, terrain })
            .collect()
    };

    let (waypoints, default_terrain, tiles) = match key {
        "demo" => {
            let mut tiles = band(Terrain::Road, &[c(1, 0), c(2, 0), c(3, 0), c(4, 0)]);
            tiles.extend(band(Terrain::Forest, &[c(4, 1), c(4, 2), c(4, 3)]));
            tiles.extend(band(Terrain::Hills, &[c(3, 4), c(2, 5), c(1, 6)]));
            (vec![c(4, 0), c(4, 3), c(1, 6)], Terrain::Plains, tiles)
        }
        "mountain-pass" => {
            let tiles = band(
                Terrain::Road,
                &[c(5, -2), c(6, -3), c(7, -3)],
            );
            (vec![c(12, -6)], Terrain::Mountains, tiles)
        }
        "swamp-loop" => (
            vec![c(3, 0), c(3, 3), c(0, 3), c(0, 0)],
            Terrain::Swamp,
            band(Terrain::Water, &[c(2, 2)]),
        ),
        _ => return None,
    };

    Some(Scenario {
        name: key.to_string(),
        description,
        start: AxialCoord::ORIGIN,
        waypoints,
        default_terrain,
        tiles,
        config: None,
        calendar: CalendarStart::default(),
    })
}
