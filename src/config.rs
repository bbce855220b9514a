use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    speed_for_level, AMBUSH_LOOKAHEAD, ERRATIC_RANDOM_CHANCE, GAME_OVER_RESET_DELAY_MS,
    LEVEL_UP_DELAY_MS, MIN_SPEED_MS, PICKUP_SCORE, PLAYER_BASE_SPEED_MS, PLAYER_SPEED_DECAY,
    POWER_PICKUP_SCORE, PURSUER_BASE_SPEED_MS, PURSUER_EATEN_SCORE, PURSUER_SPEED_DECAY,
    RELEASE_STAGGER_MS, VULNERABLE_DURATION_MS,
};
use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub player_base_speed_ms: u64,
    pub player_speed_decay: f64,
    pub pursuer_base_speed_ms: u64,
    pub pursuer_speed_decay: f64,
    pub min_speed_ms: u64,
    pub vulnerable_duration_ms: u64,
    pub release_stagger_ms: u64,
    pub level_up_delay_ms: u64,
    pub game_over_reset_delay_ms: u64,
    pub pickup_score: u32,
    pub power_pickup_score: u32,
    pub pursuer_eaten_score: u32,
    pub ambush_lookahead: i32,
    pub erratic_random_chance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            player_base_speed_ms: PLAYER_BASE_SPEED_MS,
            player_speed_decay: PLAYER_SPEED_DECAY,
            pursuer_base_speed_ms: PURSUER_BASE_SPEED_MS,
            pursuer_speed_decay: PURSUER_SPEED_DECAY,
            min_speed_ms: MIN_SPEED_MS,
            vulnerable_duration_ms: VULNERABLE_DURATION_MS,
            release_stagger_ms: RELEASE_STAGGER_MS,
            level_up_delay_ms: LEVEL_UP_DELAY_MS,
            game_over_reset_delay_ms: GAME_OVER_RESET_DELAY_MS,
            pickup_score: PICKUP_SCORE,
            power_pickup_score: POWER_PICKUP_SCORE,
            pursuer_eaten_score: PURSUER_EATEN_SCORE,
            ambush_lookahead: AMBUSH_LOOKAHEAD,
            erratic_random_chance: ERRATIC_RANDOM_CHANCE,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn player_speed(&self, level: u32) -> u64 {
        speed_for_level(
            self.player_base_speed_ms,
            self.player_speed_decay,
            self.min_speed_ms,
            level,
        )
    }

    pub fn pursuer_speed(&self, level: u32) -> u64 {
        speed_for_level(
            self.pursuer_base_speed_ms,
            self.pursuer_speed_decay,
            self.min_speed_ms,
            level,
        )
    }

    pub fn returning_speed(&self, speed_ms: u64) -> u64 {
        (speed_ms / 2).max(self.min_speed_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::EngineConfig;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config = EngineConfig::from_json_str(r#"{"levelUpDelayMs": 500, "pickupScore": 20}"#)
            .expect("partial config should parse");
        assert_eq!(config.level_up_delay_ms, 500);
        assert_eq!(config.pickup_score, 20);
        assert_eq!(config.vulnerable_duration_ms, 10_000);
        assert_eq!(config.player_speed(1), 150);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(EngineConfig::from_json_str("{not json").is_err());
    }

    #[test]
    fn returning_speed_is_halved_but_floored() {
        let config = EngineConfig::default();
        assert_eq!(config.returning_speed(200), 100);
        assert_eq!(config.returning_speed(60), 50);
    }
}
