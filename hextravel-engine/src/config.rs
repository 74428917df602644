//! Travel, animation, encounter and token configuration.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::constants::{
    DEFAULT_ENCOUNTER_CHANCE, DEFAULT_HEXES_PER_DAY, DEFAULT_SPEED_MS_PER_HEX, DEFAULT_TOKEN_COLOR,
    DEFAULT_TOKEN_NAME, NEUTRAL_TERRAIN_MULTIPLIER,
};
use crate::terrain::Terrain;

const DEFAULT_TRAVEL_DATA: &str = include_str!("../data/travel.json");

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TravelConfig {
    #[serde(default)]
    pub travel: TravelTimeConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub encounters: EncounterConfig,
    #[serde(default)]
    pub token: TokenConfig,
}

impl TravelConfig {
    /// Parse and validate configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and a range error when
    /// any value violates the documented bounds.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Embedded default configuration, falling back to compiled defaults.
    #[must_use]
    pub fn default_config() -> Self {
        Self::from_json(DEFAULT_TRAVEL_DATA).unwrap_or_else(|err| {
            log::warn!("embedded travel config rejected ({err}); using compiled defaults");
            Self::default()
        })
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.travel.validate()?;
        self.animation.validate()?;
        self.encounters.validate()?;
        Ok(())
    }
}

/// Pace and per-terrain time multipliers used by the duration calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelTimeConfig {
    #[serde(default = "TravelTimeConfig::default_hexes_per_day")]
    pub base_hexes_per_day: f64,
    /// Time multiplier per terrain; 2.0 means the hex takes twice as long.
    #[serde(default)]
    pub multipliers: HashMap<Terrain, f64>,
}

impl TravelTimeConfig {
    const fn default_hexes_per_day() -> f64 {
        DEFAULT_HEXES_PER_DAY
    }

    /// Uniform pace with no terrain multipliers.
    #[must_use]
    pub fn uniform(base_hexes_per_day: f64) -> Self {
        Self {
            base_hexes_per_day,
            multipliers: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_multiplier(mut self, terrain: Terrain, multiplier: f64) -> Self {
        self.multipliers.insert(terrain, multiplier);
        self
    }

    /// Multiplier for `terrain`, neutral when unmapped.
    #[must_use]
    pub fn multiplier(&self, terrain: Terrain) -> f64 {
        self.multipliers
            .get(&terrain)
            .copied()
            .unwrap_or(NEUTRAL_TERRAIN_MULTIPLIER)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_hexes_per_day.is_finite() && self.base_hexes_per_day > 0.0) {
            return Err(ConfigError::NotPositive {
                field: "travel.base_hexes_per_day".to_string(),
                value: self.base_hexes_per_day,
            });
        }
        let mut entries: Vec<_> = self.multipliers.iter().collect();
        entries.sort_by_key(|(terrain, _)| **terrain);
        for (terrain, value) in entries {
            if !(value.is_finite() && *value > 0.0) {
                return Err(ConfigError::NotPositive {
                    field: format!("travel.multipliers.{terrain}"),
                    value: *value,
                });
            }
        }
        Ok(())
    }
}

impl Default for TravelTimeConfig {
    fn default() -> Self {
        Self::uniform(Self::default_hexes_per_day())
    }
}

/// Cosmetic playback speed; has no effect on elapsed game time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "AnimationConfig::default_speed")]
    pub speed_ms_per_hex: f64,
}

impl AnimationConfig {
    const fn default_speed() -> f64 {
        DEFAULT_SPEED_MS_PER_HEX
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.speed_ms_per_hex.is_finite() && self.speed_ms_per_hex > 0.0) {
            return Err(ConfigError::NotPositive {
                field: "animation.speed_ms_per_hex".to_string(),
                value: self.speed_ms_per_hex,
            });
        }
        Ok(())
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            speed_ms_per_hex: Self::default_speed(),
        }
    }
}

/// Per-hour encounter probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    #[serde(default = "EncounterConfig::default_base_chance")]
    pub base_chance: f64,
    #[serde(default)]
    pub terrain_chance: HashMap<Terrain, f64>,
}

impl EncounterConfig {
    const fn default_base_chance() -> f64 {
        DEFAULT_ENCOUNTER_CHANCE
    }

    /// Chance for one hourly check on `terrain`.
    #[must_use]
    pub fn chance_for(&self, terrain: Terrain) -> f64 {
        self.terrain_chance
            .get(&terrain)
            .copied()
            .unwrap_or(self.base_chance)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_probability("encounters.base_chance".to_string(), self.base_chance)?;
        let mut entries: Vec<_> = self.terrain_chance.iter().collect();
        entries.sort_by_key(|(terrain, _)| **terrain);
        for (terrain, value) in entries {
            check_probability(format!("encounters.terrain_chance.{terrain}"), *value)?;
        }
        Ok(())
    }
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            base_chance: Self::default_base_chance(),
            terrain_chance: HashMap::new(),
        }
    }
}

fn check_probability(field: String, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::RangeViolation {
            field,
            min: 0.0,
            max: 1.0,
            value,
        });
    }
    Ok(())
}

/// Presentation of the travelling token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "TokenConfig::default_name")]
    pub name: String,
    #[serde(default = "TokenConfig::default_color")]
    pub color: String,
}

impl TokenConfig {
    fn default_name() -> String {
        DEFAULT_TOKEN_NAME.to_string()
    }

    fn default_color() -> String {
        DEFAULT_TOKEN_COLOR.to_string()
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            color: Self::default_color(),
        }
    }
}

/// Errors raised when configuration cannot be parsed or violates its bounds.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be a finite value greater than zero (got {value})")]
    NotPositive { field: String, value: f64 },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse_and_validate() {
        let cfg = TravelConfig::default_config();
        assert!(cfg.validate().is_ok());
        assert!((cfg.travel.base_hexes_per_day - 24.0).abs() < f64::EPSILON);
        assert!((cfg.travel.multiplier(Terrain::Hills) - 2.0).abs() < f64::EPSILON);
        assert!((cfg.encounters.chance_for(Terrain::Swamp) - 0.1).abs() < f64::EPSILON);
        assert!((cfg.encounters.chance_for(Terrain::Hills) - 0.05).abs() < f64::EPSILON);
        assert_eq!(cfg.token.name, "Party");
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg = TravelConfig::from_json("{}").unwrap();
        assert_eq!(cfg, TravelConfig::default());
        assert!((cfg.travel.multiplier(Terrain::Mountains) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let rejected_field = |json: &str| match TravelConfig::from_json(json) {
            Err(
                ConfigError::NotPositive { field, .. } | ConfigError::RangeViolation { field, .. },
            ) => Some(field),
            _ => None,
        };

        assert_eq!(
            rejected_field(r#"{"travel":{"base_hexes_per_day":0}}"#).as_deref(),
            Some("travel.base_hexes_per_day")
        );
        assert_eq!(
            rejected_field(r#"{"travel":{"multipliers":{"hills":-1}}}"#).as_deref(),
            Some("travel.multipliers.hills")
        );

        let err = TravelConfig::from_json(r#"{"animation":{"speed_ms_per_hex":0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { .. }));

        assert_eq!(
            rejected_field(r#"{"encounters":{"terrain_chance":{"forest":1.5}}}"#).as_deref(),
            Some("encounters.terrain_chance.forest")
        );

        let err = TravelConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
