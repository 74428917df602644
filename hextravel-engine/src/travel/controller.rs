//! Playback state machine that walks the token along its route.
//!
//! The controller is driven by host frame deltas through [`TravelController::tick`].
//! It advances at most one hex per tick, runs the hex-enter handler
//! synchronously on entry, and only then checks whether the journey is over.
use smallvec::SmallVec;
use std::fmt;

use super::{AnimationState, HexEnterControl, TokenState, TravelState};
use crate::config::{TokenConfig, TravelConfig};
use crate::constants::DEFAULT_SPEED_MS_PER_HEX;
use crate::hex::AxialCoord;
use crate::route::{self, Route, Waypoint, build_route};

/// Callback run each time the token enters a path hex.
pub type HexEnterHandler = Box<dyn FnMut(usize, &TravelState) -> HexEnterControl>;

type Subscriber = Box<dyn FnMut(&TravelState)>;

/// Handle returned by [`TravelController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No frame was pending or the controller is not travelling.
    Inactive,
    /// Still between hexes.
    Moving { path_index: usize, progress: f64 },
    /// Entered a new hex and kept going.
    Entered { path_index: usize },
    /// Entered a new hex and the handler paused playback.
    PausedAt { path_index: usize },
    /// Reached the end of the route.
    Finished { destination: AxialCoord },
}

pub struct TravelController {
    state: TravelState,
    speed_ms_per_hex: f64,
    frame_requested: bool,
    on_hex_enter: Option<HexEnterHandler>,
    subscribers: SmallVec<[(SubscriptionId, Subscriber); 2]>,
    next_subscription: u64,
}

impl fmt::Debug for TravelController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TravelController")
            .field("state", &self.state)
            .field("speed_ms_per_hex", &self.speed_ms_per_hex)
            .field("frame_requested", &self.frame_requested)
            .field("has_hex_enter_handler", &self.on_hex_enter.is_some())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl TravelController {
    /// Idle controller with the token parked on `start`.
    #[must_use]
    ///
    /// A non-positive or non-finite speed falls back to the default.
    pub fn new(start: AxialCoord, token: &TokenConfig, speed_ms_per_hex: f64) -> Self {
        let speed_ms_per_hex = if is_valid_speed(speed_ms_per_hex) {
            speed_ms_per_hex
        } else {
            log::warn!("invalid speed {speed_ms_per_hex} ms/hex, using {DEFAULT_SPEED_MS_PER_HEX}");
            DEFAULT_SPEED_MS_PER_HEX
        };
        Self {
            state: TravelState::at(TokenState::new(start, token)),
            speed_ms_per_hex,
            frame_requested: false,
            on_hex_enter: None,
            subscribers: SmallVec::new(),
            next_subscription: 0,
        }
    }

    #[must_use]
    pub fn from_config(start: AxialCoord, cfg: &TravelConfig) -> Self {
        Self::new(start, &cfg.token, cfg.animation.speed_ms_per_hex)
    }

    #[must_use]
    pub const fn state(&self) -> &TravelState {
        &self.state
    }

    #[must_use]
    pub const fn route(&self) -> &Route {
        &self.state.route
    }

    #[must_use]
    pub const fn animation(&self) -> AnimationState {
        self.state.animation
    }

    #[must_use]
    pub const fn token(&self) -> &TokenState {
        &self.state.token
    }

    #[must_use]
    pub const fn speed_ms_per_hex(&self) -> f64 {
        self.speed_ms_per_hex
    }

    /// Change playback speed. Non-positive or non-finite speeds are ignored.
    pub fn set_speed_ms_per_hex(&mut self, speed_ms_per_hex: f64) {
        if is_valid_speed(speed_ms_per_hex) {
            self.speed_ms_per_hex = speed_ms_per_hex;
        }
    }

    /// Whether the host should deliver another frame.
    #[must_use]
    pub const fn frame_requested(&self) -> bool {
        self.frame_requested
    }

    /// Register a listener. It is called immediately with the current state
    /// and then once per state change.
    pub fn subscribe(
        &mut self,
        mut listener: impl FnMut(&TravelState) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        listener(&self.state);
        let listener: Subscriber = Box::new(listener);
        self.subscribers.push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` when the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// Install the hex-enter handler, replacing any previous one.
    pub fn set_on_hex_enter(&mut self, handler: HexEnterHandler) {
        self.on_hex_enter = Some(handler);
    }

    pub fn clear_on_hex_enter(&mut self) {
        self.on_hex_enter = None;
    }

    /// Begin a journey from the first path hex. Needs an idle controller and
    /// a path of at least two hexes.
    pub fn start_travel(&mut self) -> bool {
        if !self.state.animation.is_idle() || self.state.route.path().len() < 2 {
            return false;
        }
        if let Some(start) = self.state.route.start() {
            self.state.token.position = start;
        }
        self.state.animation = AnimationState::Traveling {
            path_index: 0,
            progress: 0.0,
        };
        self.frame_requested = true;
        log::debug!(
            "travel started: {} hexes from {}",
            self.state.route.path().len(),
            self.state.token.position
        );
        self.notify();
        true
    }

    pub fn pause_travel(&mut self) -> bool {
        let AnimationState::Traveling { path_index, .. } = self.state.animation else {
            return false;
        };
        self.state.animation = AnimationState::Paused { path_index };
        self.frame_requested = false;
        log::debug!("travel paused at path index {path_index}");
        self.notify();
        true
    }

    /// Continue a paused journey.
    ///
    /// On the final hex the hex-enter handler runs again so it can finish
    /// work the pause interrupted. The journey finishes once it continues.
    pub fn resume_travel(&mut self) -> bool {
        let AnimationState::Paused { path_index } = self.state.animation else {
            return false;
        };
        if path_index >= self.state.route.last_index() {
            if self.fire_hex_enter(path_index) == HexEnterControl::Pause {
                log::debug!("still paused on the destination hex");
                self.notify();
            } else {
                self.finish_travel();
            }
            return true;
        }
        self.state.animation = AnimationState::Traveling {
            path_index,
            progress: 0.0,
        };
        self.frame_requested = true;
        log::debug!("travel resumed at path index {path_index}");
        self.notify();
        true
    }

    /// Snap the token to the destination and collapse the route onto it.
    pub fn finish_travel(&mut self) {
        if let Some(destination) = self.state.route.destination() {
            self.state.token.position = destination;
        }
        self.state.route = build_route(&[self.state.token.position]);
        self.state.animation = AnimationState::Idle;
        self.frame_requested = false;
        log::debug!("travel finished at {}", self.state.token.position);
        self.notify();
    }

    /// Drop the route and stop wherever the token currently is.
    pub fn clear_route(&mut self) {
        self.state.route = build_route(&[self.state.token.position]);
        self.state.animation = AnimationState::Idle;
        self.frame_requested = false;
        log::debug!("route cleared at {}", self.state.token.position);
        self.notify();
    }

    pub fn set_destination(&mut self, coord: AxialCoord) {
        let next = route::set_destination(&self.state.route, coord);
        self.apply_route(next);
    }

    pub fn add_waypoint(&mut self, coord: AxialCoord) {
        let next = route::append_waypoint(&self.state.route, coord);
        self.apply_route(next);
    }

    pub fn remove_waypoint(&mut self, index: usize) {
        let next = route::remove_waypoint(&self.state.route, index);
        self.apply_route(next);
    }

    pub fn remove_waypoint_at(&mut self, coord: AxialCoord) {
        let next = route::remove_waypoint_at(&self.state.route, coord);
        self.apply_route(next);
    }

    pub fn move_waypoint(&mut self, index: usize, coord: AxialCoord) {
        let next = route::move_waypoint(&self.state.route, index, coord);
        self.apply_route(next);
    }

    #[must_use]
    pub fn waypoint_at(&self, coord: AxialCoord) -> Option<Waypoint> {
        route::find_waypoint_at(&self.state.route, coord).copied()
    }

    /// Install a rebuilt route. A journey in progress keeps its index,
    /// clamped to the new path, and restarts the current step.
    fn apply_route(&mut self, next: Route) {
        self.state.route = next;
        let last = self.state.route.last_index();
        let clamped = match &mut self.state.animation {
            AnimationState::Idle => None,
            AnimationState::Traveling {
                path_index,
                progress,
            } => {
                *path_index = (*path_index).min(last);
                *progress = 0.0;
                Some(*path_index)
            }
            AnimationState::Paused { path_index } => {
                *path_index = (*path_index).min(last);
                Some(*path_index)
            }
        };
        if let Some(coord) = clamped.and_then(|index| self.state.route.path().get(index).copied())
        {
            self.state.token.position = coord;
        }
        self.notify();
    }

    /// Advance playback by `delta_ms` of wall time.
    pub fn tick(&mut self, delta_ms: f64) -> TickOutcome {
        if !self.frame_requested {
            return TickOutcome::Inactive;
        }
        let AnimationState::Traveling {
            path_index,
            progress,
        } = self.state.animation
        else {
            self.frame_requested = false;
            return TickOutcome::Inactive;
        };

        let entered = path_index + 1;
        let Some(next_hex) = self.state.route.path().get(entered).copied() else {
            return self.finish();
        };

        let step = if delta_ms.is_finite() && delta_ms > 0.0 {
            delta_ms / self.speed_ms_per_hex
        } else {
            0.0
        };
        let progress = progress + step;
        if progress < 1.0 {
            self.state.animation = AnimationState::Traveling {
                path_index,
                progress,
            };
            log::trace!("tick: index {path_index}, progress {progress:.3}");
            self.notify();
            return TickOutcome::Moving {
                path_index,
                progress,
            };
        }

        self.state.animation = AnimationState::Traveling {
            path_index: entered,
            progress: 0.0,
        };
        self.state.token.position = next_hex;
        log::trace!("entered hex {next_hex} at path index {entered}");
        if self.fire_hex_enter(entered) == HexEnterControl::Pause {
            self.pause_travel();
        }

        match self.state.animation {
            AnimationState::Traveling { path_index, .. }
                if path_index >= self.state.route.last_index() =>
            {
                self.finish()
            }
            AnimationState::Traveling { path_index, .. } => {
                self.notify();
                TickOutcome::Entered { path_index }
            }
            AnimationState::Paused { path_index } => TickOutcome::PausedAt { path_index },
            AnimationState::Idle => TickOutcome::Inactive,
        }
    }

    fn finish(&mut self) -> TickOutcome {
        self.finish_travel();
        TickOutcome::Finished {
            destination: self.state.token.position,
        }
    }

    fn fire_hex_enter(&mut self, path_index: usize) -> HexEnterControl {
        match self.on_hex_enter.as_mut() {
            Some(handler) => handler(path_index, &self.state),
            None => HexEnterControl::Continue,
        }
    }

    fn notify(&mut self) {
        let state = &self.state;
        for (_, listener) in &mut self.subscribers {
            listener(state);
        }
    }
}

fn is_valid_speed(speed_ms_per_hex: f64) -> bool {
    speed_ms_per_hex.is_finite() && speed_ms_per_hex > 0.0
}
