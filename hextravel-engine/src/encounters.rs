//! Encounter-check collaborator contract and a seeded chance table.
//!
//! The engine only needs to know whether an hour's check triggered; what the
//! encounter contains is decided elsewhere.
use hmac::{Hmac, Mac};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::EncounterConfig;
use crate::constants::ENCOUNTER_STREAM_TAG;
use crate::terrain::Terrain;

/// Outcome of a single hourly encounter check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncounterRoll {
    pub triggered: bool,
    /// Probability the check was made against.
    pub chance: f64,
    /// Draw in `[0, 1)`; triggered when below `chance`.
    pub roll: f64,
}

impl EncounterRoll {
    #[must_use]
    pub const fn quiet() -> Self {
        Self {
            triggered: false,
            chance: 0.0,
            roll: 1.0,
        }
    }

    #[must_use]
    pub const fn forced() -> Self {
        Self {
            triggered: true,
            chance: 1.0,
            roll: 0.0,
        }
    }
}

/// Performs one encounter check for one elapsed hour.
pub trait EncounterCheck {
    fn check_for_encounter(&mut self, terrain: Terrain, hour: u32) -> EncounterRoll;
}

impl<T: EncounterCheck + ?Sized> EncounterCheck for Box<T> {
    fn check_for_encounter(&mut self, terrain: Terrain, hour: u32) -> EncounterRoll {
        (**self).check_for_encounter(terrain, hour)
    }
}

/// Check that never triggers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoEncounters;

impl EncounterCheck for NoEncounters {
    fn check_for_encounter(&mut self, _terrain: Terrain, _hour: u32) -> EncounterRoll {
        EncounterRoll::quiet()
    }
}

/// Rolls each hour against the configured per-terrain probability.
#[derive(Debug, Clone)]
pub struct ChanceEncounterTable {
    cfg: EncounterConfig,
    rng: ChaCha20Rng,
    checks: u64,
}

impl ChanceEncounterTable {
    /// Table whose draws are a pure function of the user seed.
    #[must_use]
    pub fn from_seed(seed: u64, cfg: EncounterConfig) -> Self {
        Self {
            cfg,
            rng: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, ENCOUNTER_STREAM_TAG)),
            checks: 0,
        }
    }

    /// Number of checks rolled so far.
    #[must_use]
    pub const fn checks(&self) -> u64 {
        self.checks
    }

    #[must_use]
    pub const fn config(&self) -> &EncounterConfig {
        &self.cfg
    }
}

impl EncounterCheck for ChanceEncounterTable {
    fn check_for_encounter(&mut self, terrain: Terrain, hour: u32) -> EncounterRoll {
        let chance = self.cfg.chance_for(terrain);
        let roll = self.rng.gen_range(0.0..1.0);
        self.checks = self.checks.saturating_add(1);
        let triggered = roll < chance;
        log::trace!("encounter check hour {hour} on {terrain}: roll {roll:.3} vs {chance:.3}");
        EncounterRoll {
            triggered,
            chance,
            roll,
        }
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
