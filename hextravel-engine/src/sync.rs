//! Converts hex-enter events into elapsed game hours.
//!
//! Every hour crossed advances the calendar by one and runs one encounter
//! check on the terrain under the token. A triggered encounter pauses travel
//! and leaves the remaining hours for the next hex-enter after resuming.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::calendar::Calendar;
use crate::constants::HOUR_LOG_CAPACITY;
use crate::duration::{TravelDuration, travel_duration_to_hours};
use crate::encounters::{EncounterCheck, EncounterRoll};
use crate::hex::AxialCoord;
use crate::terrain::{Terrain, TerrainLookup};
use crate::travel::{HexEnterControl, TravelState};

/// Hour reached after entering `path_index` of a `path_len`-hex path that
/// takes `total_hours` to walk.
///
/// Computed in integers so the last hex lands exactly on `total_hours`.
#[must_use]
pub fn hour_at(path_index: usize, path_len: usize, total_hours: u32) -> u32 {
    let steps = u64::try_from(path_len.saturating_sub(1).max(1)).unwrap_or(u64::MAX);
    let index = u64::try_from(path_index).unwrap_or(u64::MAX);
    let hour = index.saturating_mul(u64::from(total_hours)) / steps;
    u32::try_from(hour).map_or(total_hours, |hour| hour.min(total_hours))
}

/// Last hour already processed for the current journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HourCursor {
    last_checked_hour: u32,
}

impl HourCursor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_checked_hour: 0,
        }
    }

    #[must_use]
    pub const fn last_checked(&self) -> u32 {
        self.last_checked_hour
    }

    pub const fn reset(&mut self) {
        self.last_checked_hour = 0;
    }

    /// Claim the next unprocessed hour up to `current_hour`.
    pub const fn next_due(&mut self, current_hour: u32) -> Option<u32> {
        if self.last_checked_hour >= current_hour {
            return None;
        }
        self.last_checked_hour += 1;
        Some(self.last_checked_hour)
    }
}

/// One processed hour: a calendar tick plus its encounter check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourCheck {
    pub hour: u32,
    pub path_index: usize,
    pub coord: AxialCoord,
    pub terrain: Terrain,
    pub roll: EncounterRoll,
}

impl HourCheck {
    #[must_use]
    pub const fn triggered(&self) -> bool {
        self.roll.triggered
    }
}

/// Hour bookkeeping shared by the synchronous and serialized synchronizers:
/// the cursor, the calendar step and a bounded log of processed hours.
#[derive(Debug, Clone, Default)]
pub(crate) struct HourLedger {
    cursor: HourCursor,
    log: VecDeque<HourCheck>,
}

impl HourLedger {
    pub(crate) const fn last_checked(&self) -> u32 {
        self.cursor.last_checked()
    }

    /// Start the cursor over while keeping the log for the host to drain.
    pub(crate) const fn rewind(&mut self) {
        self.cursor.reset();
    }

    /// Start over and discard the log.
    pub(crate) fn clear(&mut self) {
        self.cursor.reset();
        self.log.clear();
    }

    /// Claim the next hour up to `current_hour` and advance `calendar` by it.
    pub(crate) fn claim_hour<C: Calendar>(
        &mut self,
        calendar: &mut C,
        current_hour: u32,
    ) -> Option<u32> {
        let hour = self.cursor.next_due(current_hour)?;
        calendar.advance_hours(1);
        Some(hour)
    }

    /// Log a checked hour and decide whether travel goes on.
    pub(crate) fn record(&mut self, check: HourCheck) -> HexEnterControl {
        log::debug!("hour {} at {} ({})", check.hour, check.coord, check.terrain);
        if self.log.len() >= HOUR_LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(check);
        if check.triggered() {
            log::info!("encounter at hour {} on {} hex {}", check.hour, check.terrain, check.coord);
            HexEnterControl::Pause
        } else {
            HexEnterControl::Continue
        }
    }

    pub(crate) fn log(&self) -> impl ExactSizeIterator<Item = &HourCheck> {
        self.log.iter()
    }

    pub(crate) fn take_log(&mut self) -> Vec<HourCheck> {
        self.log.drain(..).collect()
    }
}

/// Hour the token has reached on entering `path_index`, or `None` when no
/// estimate is set.
pub(crate) fn target_hour(
    estimate: Option<TravelDuration>,
    path_index: usize,
    path_len: usize,
) -> Option<u32> {
    let total_hours = travel_duration_to_hours(&estimate?);
    Some(hour_at(path_index, path_len, total_hours))
}

/// Hex-enter handler that keeps the calendar and encounter checks in step
/// with the token.
pub struct TravelSynchronizer<C, E> {
    ledger: HourLedger,
    estimate: Option<TravelDuration>,
    calendar: C,
    encounters: E,
    terrain: Rc<dyn TerrainLookup>,
}

impl<C: std::fmt::Debug, E: std::fmt::Debug> std::fmt::Debug for TravelSynchronizer<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TravelSynchronizer")
            .field("last_checked_hour", &self.ledger.last_checked())
            .field("estimate", &self.estimate)
            .field("calendar", &self.calendar)
            .field("encounters", &self.encounters)
            .field("log", &self.ledger.log().len())
            .finish_non_exhaustive()
    }
}

impl<C: Calendar, E: EncounterCheck> TravelSynchronizer<C, E> {
    #[must_use]
    pub fn new(calendar: C, encounters: E, terrain: Rc<dyn TerrainLookup>) -> Self {
        Self {
            ledger: HourLedger::default(),
            estimate: None,
            calendar,
            encounters,
            terrain,
        }
    }

    /// Duration of the route being walked. Without one, hex-enters are ignored.
    pub const fn set_estimate(&mut self, estimate: Option<TravelDuration>) {
        self.estimate = estimate;
    }

    #[must_use]
    pub const fn estimate(&self) -> Option<TravelDuration> {
        self.estimate
    }

    #[must_use]
    pub const fn last_checked_hour(&self) -> u32 {
        self.ledger.last_checked()
    }

    /// Forget processed hours and the hour log; the next journey starts
    /// from hour 0.
    pub fn reset(&mut self) {
        self.ledger.clear();
    }

    /// Close out a finished journey. The cursor goes back to hour 0 and the
    /// log stays available until drained or the next journey starts.
    pub const fn end_journey(&mut self) {
        self.ledger.rewind();
    }

    /// Process every hour crossed up to the hex at `path_index`.
    pub fn on_hex_enter(&mut self, path_index: usize, state: &TravelState) -> HexEnterControl {
        let Some(current_hour) = target_hour(self.estimate, path_index, state.route.path().len())
        else {
            return HexEnterControl::Continue;
        };
        let coord = state.token.position;

        while let Some(hour) = self.ledger.claim_hour(&mut self.calendar, current_hour) {
            let terrain = self.terrain.terrain_at(coord);
            let roll = self.encounters.check_for_encounter(terrain, hour);
            let check = HourCheck {
                hour,
                path_index,
                coord,
                terrain,
                roll,
            };
            if self.ledger.record(check) == HexEnterControl::Pause {
                return HexEnterControl::Pause;
            }
        }
        HexEnterControl::Continue
    }

    #[must_use]
    pub const fn calendar(&self) -> &C {
        &self.calendar
    }

    pub const fn calendar_mut(&mut self) -> &mut C {
        &mut self.calendar
    }

    #[must_use]
    pub const fn encounters(&self) -> &E {
        &self.encounters
    }

    pub const fn encounters_mut(&mut self) -> &mut E {
        &mut self.encounters
    }

    /// Hours processed since the log was last drained, oldest first. At most
    /// [`HOUR_LOG_CAPACITY`] entries are kept.
    pub fn hour_log(&self) -> impl ExactSizeIterator<Item = &HourCheck> {
        self.ledger.log()
    }

    pub fn take_hour_log(&mut self) -> Vec<HourCheck> {
        self.ledger.take_log()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::HourClock;
    use crate::config::TokenConfig;
    use crate::duration::days_to_travel_duration;
    use crate::encounters::NoEncounters;
    use crate::route::build_route;
    use crate::terrain::TileMap;
    use crate::travel::{AnimationState, TokenState};

    /// Triggers on a fixed set of hours.
    #[derive(Debug, Default)]
    struct ScriptedEncounters {
        trigger_hours: Vec<u32>,
        seen: Vec<u32>,
    }

    impl EncounterCheck for ScriptedEncounters {
        fn check_for_encounter(&mut self, _terrain: Terrain, hour: u32) -> EncounterRoll {
            self.seen.push(hour);
            if self.trigger_hours.contains(&hour) {
                EncounterRoll::forced()
            } else {
                EncounterRoll::quiet()
            }
        }
    }

    fn five_hex_state() -> TravelState {
        let token = TokenState::new(AxialCoord::ORIGIN, &TokenConfig::default());
        let mut state = TravelState::at(token);
        state.route = build_route(&[AxialCoord::ORIGIN, AxialCoord::new(4, 0)]);
        state
    }

    fn enter(state: &mut TravelState, path_index: usize) {
        state.token.position = state.route.path()[path_index];
        state.animation = AnimationState::Traveling {
            path_index,
            progress: 0.0,
        };
    }

    fn eight_hours() -> Option<TravelDuration> {
        Some(days_to_travel_duration(8.0 / 24.0))
    }

    #[test]
    fn hour_at_spreads_hours_over_path() {
        assert_eq!(hour_at(1, 5, 8), 2);
        assert_eq!(hour_at(4, 5, 8), 8);
        assert_eq!(hour_at(1, 4, 3), 1);
        assert_eq!(hour_at(2, 4, 3), 2);
        assert_eq!(hour_at(0, 1, 5), 0);
        assert_eq!(hour_at(9, 5, 8), 8);
    }

    #[test]
    fn cursor_claims_each_hour_once() {
        let mut cursor = HourCursor::new();
        assert_eq!(cursor.next_due(2), Some(1));
        assert_eq!(cursor.next_due(2), Some(2));
        assert_eq!(cursor.next_due(2), None);
        cursor.reset();
        assert_eq!(cursor.last_checked(), 0);
    }

    #[test]
    fn eight_hour_route_checks_two_hours_per_hex() {
        let mut sync =
            TravelSynchronizer::new(HourClock::default(), NoEncounters, Rc::new(TileMap::new()));
        sync.set_estimate(eight_hours());
        let mut state = five_hex_state();
        for index in 1..=4 {
            enter(&mut state, index);
            assert_eq!(sync.on_hex_enter(index, &state), HexEnterControl::Continue);
            assert_eq!(sync.last_checked_hour(), u32::try_from(index * 2).unwrap());
        }
        assert_eq!(sync.calendar().elapsed_hours, 8);
        assert_eq!(sync.calendar().hour, 16);
        let hours: Vec<u32> = sync.take_hour_log().iter().map(|c| c.hour).collect();
        assert_eq!(hours, (1..=8).collect::<Vec<_>>());
        assert_eq!(sync.hour_log().len(), 0);
    }

    #[test]
    fn encounter_stops_the_hour_loop_and_resumes_later() {
        let encounters = ScriptedEncounters {
            trigger_hours: vec![3],
            seen: Vec::new(),
        };
        let mut sync =
            TravelSynchronizer::new(HourClock::default(), encounters, Rc::new(TileMap::new()));
        sync.set_estimate(eight_hours());
        let mut state = five_hex_state();

        enter(&mut state, 1);
        assert_eq!(sync.on_hex_enter(1, &state), HexEnterControl::Continue);
        enter(&mut state, 2);
        assert_eq!(sync.on_hex_enter(2, &state), HexEnterControl::Pause);
        assert_eq!(sync.last_checked_hour(), 3);
        assert_eq!(sync.calendar().elapsed_hours, 3);

        enter(&mut state, 3);
        assert_eq!(sync.on_hex_enter(3, &state), HexEnterControl::Continue);
        assert_eq!(sync.encounters().seen, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(sync.calendar().elapsed_hours, 6);
    }

    #[test]
    fn missing_estimate_is_a_no_op() {
        let mut sync =
            TravelSynchronizer::new(HourClock::default(), NoEncounters, Rc::new(TileMap::new()));
        let mut state = five_hex_state();
        enter(&mut state, 2);
        assert_eq!(sync.on_hex_enter(2, &state), HexEnterControl::Continue);
        assert_eq!(sync.last_checked_hour(), 0);
        assert_eq!(sync.calendar().elapsed_hours, 0);
    }

    #[test]
    fn checks_use_terrain_under_the_token() {
        let mut tiles = TileMap::new();
        tiles.insert(AxialCoord::new(1, 0), Terrain::Swamp);
        let mut sync = TravelSynchronizer::new(HourClock::default(), NoEncounters, Rc::new(tiles));
        sync.set_estimate(eight_hours());
        let mut state = five_hex_state();
        enter(&mut state, 1);
        sync.on_hex_enter(1, &state);
        let log = sync.take_hour_log();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|c| c.terrain == Terrain::Swamp && c.path_index == 1));
    }

    #[test]
    fn reset_discards_the_log_but_end_journey_keeps_it() {
        let mut sync =
            TravelSynchronizer::new(HourClock::default(), NoEncounters, Rc::new(TileMap::new()));
        sync.set_estimate(eight_hours());
        let mut state = five_hex_state();
        enter(&mut state, 4);
        sync.on_hex_enter(4, &state);
        sync.end_journey();
        assert_eq!(sync.last_checked_hour(), 0);
        assert_eq!(sync.hour_log().len(), 8);

        sync.reset();
        assert_eq!(sync.hour_log().len(), 0);
        assert_eq!(sync.calendar().elapsed_hours, 8);
    }

    #[test]
    fn hour_log_keeps_only_the_newest_entries() {
        let mut sync =
            TravelSynchronizer::new(HourClock::default(), NoEncounters, Rc::new(TileMap::new()));
        sync.set_estimate(Some(days_to_travel_duration(40.0)));
        let mut state = five_hex_state();
        enter(&mut state, 4);
        assert_eq!(sync.on_hex_enter(4, &state), HexEnterControl::Continue);
        assert_eq!(sync.calendar().elapsed_hours, 960);

        let log = sync.take_hour_log();
        assert_eq!(log.len(), HOUR_LOG_CAPACITY);
        assert_eq!(log.first().map(|c| c.hour), Some(241));
        assert_eq!(log.last().map(|c| c.hour), Some(960));
    }
}
