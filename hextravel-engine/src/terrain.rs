//! Terrain kinds and the lookup contract used by travel time and encounters.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::hex::AxialCoord;

/// Closed set of terrain kinds a tile can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    #[default]
    Plains,
    Road,
    Forest,
    Hills,
    Mountains,
    Swamp,
    Desert,
    Water,
}

impl Terrain {
    pub const ALL: [Self; 8] = [
        Self::Plains,
        Self::Road,
        Self::Forest,
        Self::Hills,
        Self::Mountains,
        Self::Swamp,
        Self::Desert,
        Self::Water,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Plains => "plains",
            Self::Road => "road",
            Self::Forest => "forest",
            Self::Hills => "hills",
            Self::Mountains => "mountains",
            Self::Swamp => "swamp",
            Self::Desert => "desert",
            Self::Water => "water",
        }
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Source of terrain for a coordinate.
///
/// Implementations must answer for every coordinate; unmapped hexes get a
/// default terrain instead of an error.
pub trait TerrainLookup {
    fn terrain_at(&self, coord: AxialCoord) -> Terrain;
}

impl<T: TerrainLookup + ?Sized> TerrainLookup for &T {
    fn terrain_at(&self, coord: AxialCoord) -> Terrain {
        (**self).terrain_at(coord)
    }
}

/// In-memory tile map keyed by coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TileMap {
    tiles: HashMap<AxialCoord, Terrain>,
    fallback: Terrain,
}

impl TileMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map whose unmapped hexes answer `fallback`.
    #[must_use]
    pub fn with_fallback(fallback: Terrain) -> Self {
        Self {
            tiles: HashMap::new(),
            fallback,
        }
    }

    pub fn insert(&mut self, coord: AxialCoord, terrain: Terrain) -> Option<Terrain> {
        self.tiles.insert(coord, terrain)
    }

    #[must_use]
    pub fn get(&self, coord: AxialCoord) -> Option<Terrain> {
        self.tiles.get(&coord).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[must_use]
    pub const fn fallback(&self) -> Terrain {
        self.fallback
    }
}

impl FromIterator<(AxialCoord, Terrain)> for TileMap {
    fn from_iter<I: IntoIterator<Item = (AxialCoord, Terrain)>>(iter: I) -> Self {
        Self {
            tiles: iter.into_iter().collect(),
            fallback: Terrain::default(),
        }
    }
}

impl TerrainLookup for TileMap {
    fn terrain_at(&self, coord: AxialCoord) -> Terrain {
        self.get(coord).unwrap_or(self.fallback)
    }
}
