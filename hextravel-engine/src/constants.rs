//! Centralized tuning constants for the hex travel engine.
//!
//! Anything a table should be able to tune lives in [`crate::config`]; these
//! are the compiled fallbacks and the fixed facts of the calendar.

// Calendar -----------------------------------------------------------------
pub const HOURS_PER_DAY: u32 = 24;
pub(crate) const DEFAULT_START_HOUR: u32 = 8;

// Travel pacing ------------------------------------------------------------
pub(crate) const DEFAULT_HEXES_PER_DAY: f64 = 24.0;
pub(crate) const NEUTRAL_TERRAIN_MULTIPLIER: f64 = 1.0;
pub(crate) const DEFAULT_SPEED_MS_PER_HEX: f64 = 200.0;

// Hour log -----------------------------------------------------------------
/// Processed hours kept for the host before the oldest are dropped.
pub const HOUR_LOG_CAPACITY: usize = 720;

// Encounters ---------------------------------------------------------------
pub(crate) const DEFAULT_ENCOUNTER_CHANCE: f64 = 0.05;
pub(crate) const ENCOUNTER_STREAM_TAG: &[u8] = b"encounter";

// Token --------------------------------------------------------------------
pub(crate) const DEFAULT_TOKEN_NAME: &str = "Party";
pub(crate) const DEFAULT_TOKEN_COLOR: &str = "#ff6b35";

// Hex geometry -------------------------------------------------------------
/// Offset applied to both line endpoints so interpolated samples never sit
/// exactly on a hex edge.
pub(crate) const LINE_NUDGE: f64 = 1e-6;
