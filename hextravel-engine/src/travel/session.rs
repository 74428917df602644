//! Map-interaction session tying playback to the calendar and encounters.
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use super::{SubscriptionId, TickOutcome, TravelController, TravelState};
use crate::calendar::Calendar;
use crate::config::TravelConfig;
use crate::duration::{TravelDuration, calculate_travel_duration};
use crate::encounters::EncounterCheck;
use crate::hex::AxialCoord;
use crate::route::Waypoint;
use crate::sync::{HourCheck, TravelSynchronizer};
use crate::terrain::TerrainLookup;

/// Render data for one frame of the travel view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub travel: TravelState,
    pub estimated_duration: Option<TravelDuration>,
    pub last_checked_hour: u32,
    #[serde(default)]
    pub dragging: Option<Waypoint>,
}

/// High-level session binding playback, the hour synchronizer, terrain and
/// the calendar/encounter collaborators behind map-interaction handlers.
pub struct TravelSession<C, E> {
    controller: TravelController,
    synchronizer: Rc<RefCell<TravelSynchronizer<C, E>>>,
    terrain: Rc<dyn TerrainLookup>,
    cfg: TravelConfig,
    dragging: Option<Waypoint>,
}

impl<C: std::fmt::Debug, E: std::fmt::Debug> std::fmt::Debug for TravelSession<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TravelSession")
            .field("controller", &self.controller)
            .field("synchronizer", &self.synchronizer)
            .field("dragging", &self.dragging)
            .finish_non_exhaustive()
    }
}

impl<C, E> TravelSession<C, E>
where
    C: Calendar + 'static,
    E: EncounterCheck + 'static,
{
    /// Idle session with the token parked on `start`.
    #[must_use]
    pub fn new(
        start: AxialCoord,
        cfg: TravelConfig,
        terrain: Rc<dyn TerrainLookup>,
        calendar: C,
        encounters: E,
    ) -> Self {
        let synchronizer = Rc::new(RefCell::new(TravelSynchronizer::new(
            calendar,
            encounters,
            Rc::clone(&terrain),
        )));
        let mut controller = TravelController::from_config(start, &cfg);
        let handler_sync = Rc::clone(&synchronizer);
        controller.set_on_hex_enter(Box::new(move |path_index, state| {
            handler_sync.borrow_mut().on_hex_enter(path_index, state)
        }));
        Self {
            controller,
            synchronizer,
            terrain,
            cfg,
            dragging: None,
        }
    }

    /// Left click: the first click sets a destination, later clicks extend
    /// the route. Ignored while a waypoint is being dragged.
    pub fn handle_map_click(&mut self, coord: AxialCoord) {
        if self.dragging.is_some() {
            return;
        }
        if self.controller.route().waypoints().len() <= 1 {
            self.controller.set_destination(coord);
        } else {
            self.controller.add_waypoint(coord);
        }
        self.refresh_estimate();
    }

    /// Right click removes the waypoint under the cursor, never the start.
    pub fn handle_right_click(&mut self, coord: AxialCoord) {
        self.controller.remove_waypoint_at(coord);
        self.refresh_estimate();
    }

    /// Pick up the waypoint on `coord`. The start waypoint cannot be dragged.
    pub fn begin_drag(&mut self, coord: AxialCoord) -> bool {
        match self.controller.waypoint_at(coord) {
            Some(waypoint) if waypoint.index > 0 => {
                self.dragging = Some(waypoint);
                true
            }
            _ => false,
        }
    }

    pub fn drag_to(&mut self, coord: AxialCoord) {
        let Some(waypoint) = self.dragging.as_mut() else {
            return;
        };
        if waypoint.coord == coord {
            return;
        }
        waypoint.coord = coord;
        let index = waypoint.index;
        self.controller.move_waypoint(index, coord);
        self.refresh_estimate();
    }

    pub fn end_drag(&mut self) -> Option<Waypoint> {
        self.dragging.take()
    }

    #[must_use]
    pub const fn dragging(&self) -> Option<Waypoint> {
        self.dragging
    }

    /// Start a fresh journey, or resume a paused one. A fresh journey
    /// discards the previous journey's hour log.
    pub fn start_travel(&mut self) -> bool {
        let animation = self.controller.animation();
        if animation.is_paused() {
            let resumed = self.controller.resume_travel();
            if self.controller.animation().is_idle() {
                self.complete_journey();
            }
            return resumed;
        }
        if animation.is_traveling() {
            return false;
        }
        self.synchronizer.borrow_mut().reset();
        self.refresh_estimate();
        self.controller.start_travel()
    }

    pub fn pause_travel(&mut self) -> bool {
        self.controller.pause_travel()
    }

    pub fn clear_route(&mut self) {
        self.controller.clear_route();
        self.synchronizer.borrow_mut().reset();
        self.refresh_estimate();
    }

    /// Forward a frame to the controller.
    pub fn tick(&mut self, delta_ms: f64) -> TickOutcome {
        let outcome = self.controller.tick(delta_ms);
        if matches!(outcome, TickOutcome::Finished { .. }) {
            self.complete_journey();
        }
        outcome
    }

    #[must_use]
    pub const fn frame_requested(&self) -> bool {
        self.controller.frame_requested()
    }

    /// Advance the calendar outside of travel, e.g. for resting.
    pub fn advance_hours(&mut self, hours: u32) {
        self.synchronizer.borrow_mut().calendar_mut().advance_hours(hours);
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TravelState) + 'static) -> SubscriptionId {
        self.controller.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.controller.unsubscribe(id)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let sync = self.synchronizer.borrow();
        SessionSnapshot {
            travel: self.controller.state().clone(),
            estimated_duration: sync.estimate(),
            last_checked_hour: sync.last_checked_hour(),
            dragging: self.dragging,
        }
    }

    #[must_use]
    pub const fn controller(&self) -> &TravelController {
        &self.controller
    }

    /// Mutable access for speed changes and direct route edits. Call
    /// [`Self::refresh_estimate`] after editing the route this way.
    pub const fn controller_mut(&mut self) -> &mut TravelController {
        &mut self.controller
    }

    #[must_use]
    pub const fn state(&self) -> &TravelState {
        self.controller.state()
    }

    #[must_use]
    pub fn estimated_duration(&self) -> Option<TravelDuration> {
        self.synchronizer.borrow().estimate()
    }

    #[must_use]
    pub fn last_checked_hour(&self) -> u32 {
        self.synchronizer.borrow().last_checked_hour()
    }

    #[must_use]
    pub fn calendar(&self) -> Ref<'_, C> {
        Ref::map(self.synchronizer.borrow(), TravelSynchronizer::calendar)
    }

    pub fn calendar_mut(&mut self) -> RefMut<'_, C> {
        RefMut::map(self.synchronizer.borrow_mut(), TravelSynchronizer::calendar_mut)
    }

    #[must_use]
    pub fn encounters(&self) -> Ref<'_, E> {
        Ref::map(self.synchronizer.borrow(), TravelSynchronizer::encounters)
    }

    pub fn take_hour_log(&mut self) -> Vec<HourCheck> {
        self.synchronizer.borrow_mut().take_hour_log()
    }

    #[must_use]
    pub const fn config(&self) -> &TravelConfig {
        &self.cfg
    }

    #[must_use]
    pub fn terrain(&self) -> &dyn TerrainLookup {
        self.terrain.as_ref()
    }

    /// Recompute the duration estimate from the current route.
    pub fn refresh_estimate(&mut self) {
        let route = self.controller.route();
        let estimate = (route.path().len() > 1)
            .then(|| calculate_travel_duration(route, self.terrain.as_ref(), &self.cfg.travel));
        self.synchronizer.borrow_mut().set_estimate(estimate);
    }

    fn complete_journey(&mut self) {
        self.synchronizer.borrow_mut().end_journey();
        self.refresh_estimate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::HourClock;
    use crate::encounters::{EncounterRoll, NoEncounters};
    use crate::terrain::{Terrain, TileMap};
    use crate::travel::AnimationState;

    fn c(q: i32, r: i32) -> AxialCoord {
        AxialCoord::new(q, r)
    }

    fn config(hexes_per_day: f64) -> TravelConfig {
        let mut cfg = TravelConfig::default();
        cfg.travel.base_hexes_per_day = hexes_per_day;
        cfg.animation.speed_ms_per_hex = 100.0;
        cfg
    }

    fn session(hexes_per_day: f64) -> TravelSession<HourClock, NoEncounters> {
        TravelSession::new(
            c(0, 0),
            config(hexes_per_day),
            Rc::new(TileMap::new()),
            HourClock::default(),
            NoEncounters,
        )
    }

    fn drive<C: Calendar + 'static, E: EncounterCheck + 'static>(s: &mut TravelSession<C, E>) {
        for _ in 0..10_000 {
            if !s.frame_requested() {
                break;
            }
            s.tick(100.0);
        }
    }

    #[derive(Debug, Default)]
    struct EveryHour;

    impl EncounterCheck for EveryHour {
        fn check_for_encounter(&mut self, _terrain: Terrain, _hour: u32) -> EncounterRoll {
            EncounterRoll::forced()
        }
    }

    /// Triggers on the listed hours.
    #[derive(Debug, Default)]
    struct ScriptedHours(Vec<u32>);

    impl EncounterCheck for ScriptedHours {
        fn check_for_encounter(&mut self, _terrain: Terrain, hour: u32) -> EncounterRoll {
            if self.0.contains(&hour) {
                EncounterRoll::forced()
            } else {
                EncounterRoll::quiet()
            }
        }
    }

    #[test]
    fn clicks_build_the_route_and_estimate() {
        let mut s = session(12.0);
        assert_eq!(s.estimated_duration(), None);
        s.handle_map_click(c(3, 0));
        assert_eq!(s.state().route.waypoints().len(), 2);
        s.handle_map_click(c(3, 3));
        assert_eq!(s.state().route.waypoints().len(), 3);
        let estimate = s.estimated_duration().unwrap();
        assert_eq!((estimate.days, estimate.hours), (0, 12));

        s.handle_right_click(c(3, 0));
        assert_eq!(s.state().route.waypoints().len(), 2);
        s.handle_right_click(c(0, 0));
        assert_eq!(s.state().route.waypoints().len(), 2);
    }

    #[test]
    fn dragging_moves_only_non_start_waypoints() {
        let mut s = session(24.0);
        s.handle_map_click(c(2, 0));
        assert!(!s.begin_drag(c(0, 0)));
        assert!(!s.begin_drag(c(5, 5)));
        assert!(s.begin_drag(c(2, 0)));
        s.handle_map_click(c(9, 9));
        assert_eq!(s.state().route.waypoints().len(), 2);
        s.drag_to(c(0, 4));
        assert_eq!(s.state().route.destination(), Some(c(0, 4)));
        assert_eq!(s.end_drag().map(|w| w.coord), Some(c(0, 4)));
        assert_eq!(s.dragging(), None);
    }

    #[test]
    fn journey_advances_calendar_by_estimate() {
        let mut s = session(2.0);
        s.handle_map_click(c(4, 0));
        assert_eq!(s.estimated_duration().map(|d| (d.days, d.hours)), Some((2, 0)));
        assert!(s.start_travel());
        drive(&mut s);

        assert!(s.state().animation.is_idle());
        assert_eq!(s.state().token.position, c(4, 0));
        assert_eq!(s.calendar().elapsed_hours, 48);
        assert_eq!(s.estimated_duration(), None);
        assert_eq!(s.last_checked_hour(), 0);
        let hours: Vec<u32> = s.take_hour_log().iter().map(|h| h.hour).collect();
        assert_eq!(hours, (1..=48).collect::<Vec<_>>());
    }

    #[test]
    fn encounters_pause_and_start_resumes_without_reset() {
        let mut s = TravelSession::new(
            c(0, 0),
            config(3.0),
            Rc::new(TileMap::new()),
            HourClock::default(),
            EveryHour,
        );
        s.handle_map_click(c(3, 0));
        assert_eq!(s.estimated_duration().map(|d| (d.days, d.hours)), Some((1, 0)));
        assert!(s.start_travel());
        drive(&mut s);
        assert_eq!(s.state().animation, AnimationState::Paused { path_index: 1 });
        assert_eq!(s.last_checked_hour(), 1);

        assert!(s.start_travel());
        drive(&mut s);
        assert_eq!(s.state().animation, AnimationState::Paused { path_index: 2 });
        assert_eq!(s.last_checked_hour(), 2);

        assert!(s.start_travel());
        drive(&mut s);
        assert_eq!(s.state().animation, AnimationState::Paused { path_index: 3 });
        assert_eq!(s.last_checked_hour(), 3);

        // Every remaining hour is still checked on the destination hex, and
        // each one pauses again until the last has been processed.
        let mut resumes = 0;
        while !s.state().animation.is_idle() {
            assert!(s.start_travel());
            drive(&mut s);
            resumes += 1;
            assert!(resumes <= 24, "journey never finished");
        }
        assert_eq!(resumes, 22);
        assert_eq!(s.state().token.position, c(3, 0));
        assert_eq!(s.calendar().elapsed_hours, 24);
        assert_eq!(s.last_checked_hour(), 0);
        assert_eq!(s.estimated_duration(), None);
        let hours: Vec<u32> = s.take_hour_log().iter().map(|h| h.hour).collect();
        assert_eq!(hours, (1..=24).collect::<Vec<_>>());
    }

    #[test]
    fn destination_pause_still_spends_the_whole_estimate() {
        let mut s = TravelSession::new(
            c(0, 0),
            config(3.0),
            Rc::new(TileMap::new()),
            HourClock::default(),
            ScriptedHours(vec![20]),
        );
        s.handle_map_click(c(3, 0));
        assert!(s.start_travel());
        drive(&mut s);
        assert_eq!(s.state().animation, AnimationState::Paused { path_index: 3 });
        assert_eq!(s.last_checked_hour(), 20);
        assert_eq!(s.calendar().elapsed_hours, 20);

        assert!(s.start_travel());
        assert!(s.state().animation.is_idle());
        assert_eq!(s.calendar().elapsed_hours, 24);
        let log = s.take_hour_log();
        assert_eq!(log.len(), 24);
        let fired: Vec<u32> = log.iter().filter(|h| h.triggered()).map(|h| h.hour).collect();
        assert_eq!(fired, vec![20]);
    }

    #[test]
    fn hour_log_does_not_grow_across_journeys() {
        let mut s = session(24.0);
        for round in 0..50 {
            let dest = if round % 2 == 0 { c(3, 0) } else { c(0, 0) };
            s.handle_map_click(dest);
            assert!(s.start_travel());
            drive(&mut s);
            assert!(s.state().animation.is_idle());
        }
        assert_eq!(s.calendar().elapsed_hours, 150);
        assert_eq!(s.synchronizer.borrow().hour_log().len(), 3);
    }

    #[test]
    fn invalid_configured_speed_uses_default() {
        let mut cfg = config(24.0);
        cfg.animation.speed_ms_per_hex = -1.0;
        let mut s = TravelSession::new(
            c(0, 0),
            cfg,
            Rc::new(TileMap::new()),
            HourClock::default(),
            NoEncounters,
        );
        assert!(s.controller().speed_ms_per_hex() > 0.0);
        s.handle_map_click(c(2, 0));
        assert!(s.start_travel());
        drive(&mut s);
        assert_eq!(s.state().token.position, c(2, 0));
    }

    #[test]
    fn clear_resets_cursor_and_estimate() {
        let mut s = session(1.0);
        s.handle_map_click(c(2, 0));
        s.start_travel();
        s.tick(100.0);
        assert!(s.last_checked_hour() > 0);
        s.clear_route();
        assert_eq!(s.last_checked_hour(), 0);
        assert_eq!(s.estimated_duration(), None);
        assert_eq!(s.state().token.position, c(1, 0));
        assert!(!s.frame_requested());
    }

    #[test]
    fn manual_advance_and_snapshot() {
        let mut s = session(24.0);
        s.advance_hours(5);
        assert_eq!(s.calendar().hour, 13);
        s.handle_map_click(c(0, 2));
        let snapshot = s.snapshot();
        assert_eq!(snapshot.travel.route.path().len(), 3);
        assert_eq!(snapshot.estimated_duration.map(|d| d.hours), Some(2));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["travel"]["animation"]["status"], "idle");
    }
}
