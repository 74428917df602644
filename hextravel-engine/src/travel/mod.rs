//! Token travel along a route: state types, the playback controller, and the
//! session that binds playback to the hour synchronizer.
use serde::{Deserialize, Serialize};

use crate::config::TokenConfig;
use crate::hex::AxialCoord;
use crate::numbers::usize_to_f64;
use crate::route::{Route, build_route};

pub mod controller;
pub mod session;

pub use controller::{HexEnterHandler, SubscriptionId, TickOutcome, TravelController};
pub use session::{SessionSnapshot, TravelSession};

/// Playback status of the token.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnimationState {
    #[default]
    Idle,
    Traveling {
        /// Hex the token last entered.
        path_index: usize,
        /// Fraction of the way to the next hex, `0.0..1.0`.
        progress: f64,
    },
    Paused {
        path_index: usize,
    },
}

impl AnimationState {
    /// Path index for travelling and paused states.
    #[must_use]
    pub const fn path_index(&self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Traveling { path_index, .. } | Self::Paused { path_index } => Some(*path_index),
        }
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub const fn is_traveling(&self) -> bool {
        matches!(self, Self::Traveling { .. })
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }
}

/// The travelling party marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub position: AxialCoord,
    pub name: String,
    pub color: String,
}

impl TokenState {
    #[must_use]
    pub fn new(position: AxialCoord, token: &TokenConfig) -> Self {
        Self {
            position,
            name: token.name.clone(),
            color: token.color.clone(),
        }
    }
}

/// Everything a view needs to draw the token and its route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelState {
    pub token: TokenState,
    pub route: Route,
    pub animation: AnimationState,
}

impl TravelState {
    /// Idle state with a single-hex route on the token.
    #[must_use]
    pub fn at(token: TokenState) -> Self {
        let route = build_route(&[token.position]);
        Self {
            token,
            route,
            animation: AnimationState::Idle,
        }
    }

    /// Hex the token logically occupies.
    #[must_use]
    pub fn logical_position(&self) -> AxialCoord {
        self.animation
            .path_index()
            .and_then(|index| self.route.path().get(index).copied())
            .unwrap_or(self.token.position)
    }

    /// Fractional axial position for smooth rendering between hexes.
    #[must_use]
    pub fn interpolated_position(&self) -> (f64, f64) {
        let here = self.logical_position();
        let base = (f64::from(here.q), f64::from(here.r));
        let AnimationState::Traveling { path_index, progress } = self.animation else {
            return base;
        };
        let Some(next) = self.route.path().get(path_index + 1) else {
            return base;
        };
        (
            base.0 + (f64::from(next.q) - base.0) * progress,
            base.1 + (f64::from(next.r) - base.1) * progress,
        )
    }

    /// Share of the path already walked, `0.0..=1.0`.
    #[must_use]
    pub fn route_progress(&self) -> f64 {
        let last = self.route.last_index();
        if last == 0 {
            return 0.0;
        }
        match self.animation {
            AnimationState::Idle => 0.0,
            AnimationState::Paused { path_index } => {
                usize_to_f64(path_index.min(last)) / usize_to_f64(last)
            }
            AnimationState::Traveling {
                path_index,
                progress,
            } => ((usize_to_f64(path_index) + progress) / usize_to_f64(last)).min(1.0),
        }
    }
}

/// What the hex-enter handler asks the controller to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HexEnterControl {
    #[default]
    Continue,
    Pause,
}
