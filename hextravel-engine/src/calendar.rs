//! Calendar collaborator contract and a minimal hour clock.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{DEFAULT_START_HOUR, HOURS_PER_DAY};

/// External date/time state the synchronizer advances once per elapsed hour.
pub trait Calendar {
    fn advance_hours(&mut self, hours: u32);
}

impl<T: Calendar + ?Sized> Calendar for Box<T> {
    fn advance_hours(&mut self, hours: u32) {
        (**self).advance_hours(hours);
    }
}

/// Day counter plus hour of day. Knows nothing about months or seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourClock {
    /// One-based day counter.
    pub day: u32,
    /// Hour of day, `0..=23`.
    pub hour: u32,
    /// Total hours advanced since construction.
    #[serde(default)]
    pub elapsed_hours: u64,
}

impl HourClock {
    /// Clock at `day`/`hour`; out-of-range hours roll into following days.
    #[must_use]
    pub const fn new(day: u32, hour: u32) -> Self {
        Self {
            day: day.saturating_add(hour / HOURS_PER_DAY),
            hour: hour % HOURS_PER_DAY,
            elapsed_hours: 0,
        }
    }
}

impl Default for HourClock {
    fn default() -> Self {
        Self::new(1, DEFAULT_START_HOUR)
    }
}

impl Calendar for HourClock {
    fn advance_hours(&mut self, hours: u32) {
        let total = self.hour.saturating_add(hours);
        self.day = self.day.saturating_add(total / HOURS_PER_DAY);
        self.hour = total % HOURS_PER_DAY;
        self.elapsed_hours = self.elapsed_hours.saturating_add(u64::from(hours));
    }
}

impl fmt::Display for HourClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {}, {:02}:00", self.day, self.hour)
    }
}
