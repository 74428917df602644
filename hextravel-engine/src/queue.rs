//! Hex-enter processing for hosts whose encounter checks are asynchronous.
//!
//! Each notification holds the lock for its whole hour loop, awaited checks
//! included, so overlapping notifications drain one after another and hours
//! are always processed in order.
use std::future::Future;
use tokio::sync::Mutex;

use crate::calendar::Calendar;
use crate::duration::TravelDuration;
use crate::encounters::{EncounterCheck, EncounterRoll};
use crate::hex::AxialCoord;
use crate::sync::{HourCheck, HourLedger, target_hour};
use crate::terrain::{Terrain, TerrainLookup};
use crate::travel::{HexEnterControl, TravelState};

/// Encounter check that may wait on I/O or user input.
pub trait AsyncEncounterCheck {
    fn check_for_encounter(
        &mut self,
        terrain: Terrain,
        hour: u32,
    ) -> impl Future<Output = EncounterRoll>;
}

/// Adapts a synchronous check to the async contract.
#[derive(Debug, Clone, Default)]
pub struct Immediate<T>(pub T);

impl<T: EncounterCheck> AsyncEncounterCheck for Immediate<T> {
    async fn check_for_encounter(&mut self, terrain: Terrain, hour: u32) -> EncounterRoll {
        self.0.check_for_encounter(terrain, hour)
    }
}

/// Everything the hour loop needs from one hex-enter, captured when the
/// controller fired it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexEnterNotice {
    pub path_index: usize,
    pub path_len: usize,
    pub position: AxialCoord,
    pub terrain: Terrain,
}

impl HexEnterNotice {
    #[must_use]
    pub fn capture(path_index: usize, state: &TravelState, terrain: &dyn TerrainLookup) -> Self {
        Self {
            path_index,
            path_len: state.route.path().len(),
            position: state.token.position,
            terrain: terrain.terrain_at(state.token.position),
        }
    }
}

#[derive(Debug)]
struct QueueState<C, E> {
    ledger: HourLedger,
    estimate: Option<TravelDuration>,
    calendar: C,
    encounters: E,
}

/// Synchronizer whose hex-enter handling is serialized behind a lock.
#[derive(Debug)]
pub struct SerializedSynchronizer<C, E> {
    inner: Mutex<QueueState<C, E>>,
}

impl<C: Calendar, E: AsyncEncounterCheck> SerializedSynchronizer<C, E> {
    #[must_use]
    pub fn new(calendar: C, encounters: E) -> Self {
        Self {
            inner: Mutex::new(QueueState {
                ledger: HourLedger::default(),
                estimate: None,
                calendar,
                encounters,
            }),
        }
    }

    pub async fn set_estimate(&self, estimate: Option<TravelDuration>) {
        self.inner.lock().await.estimate = estimate;
    }

    /// Forget processed hours and the hour log.
    pub async fn reset(&self) {
        self.inner.lock().await.ledger.clear();
    }

    pub async fn last_checked_hour(&self) -> u32 {
        self.inner.lock().await.ledger.last_checked()
    }

    /// Process every hour crossed up to the notice's hex.
    pub async fn on_hex_enter(&self, notice: HexEnterNotice) -> HexEnterControl {
        let mut guard = self.inner.lock().await;
        let state = &mut *guard;
        let Some(current_hour) = target_hour(state.estimate, notice.path_index, notice.path_len)
        else {
            return HexEnterControl::Continue;
        };

        while let Some(hour) = state.ledger.claim_hour(&mut state.calendar, current_hour) {
            let roll = state
                .encounters
                .check_for_encounter(notice.terrain, hour)
                .await;
            let check = HourCheck {
                hour,
                path_index: notice.path_index,
                coord: notice.position,
                terrain: notice.terrain,
                roll,
            };
            if state.ledger.record(check) == HexEnterControl::Pause {
                return HexEnterControl::Pause;
            }
        }
        HexEnterControl::Continue
    }

    pub async fn take_hour_log(&self) -> Vec<HourCheck> {
        self.inner.lock().await.ledger.take_log()
    }

    /// Consume the synchronizer, returning its calendar and encounter check.
    pub fn into_parts(self) -> (C, E) {
        let state = self.inner.into_inner();
        (state.calendar, state.encounters)
    }
}
