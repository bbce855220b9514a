pub const TICK_MS: u64 = 16;

pub const PURSUER_COUNT: usize = 4;

pub const PLAYER_BASE_SPEED_MS: u64 = 150;
pub const PLAYER_SPEED_DECAY: f64 = 0.95;
pub const PURSUER_BASE_SPEED_MS: u64 = 200;
pub const PURSUER_SPEED_DECAY: f64 = 0.92;
pub const MIN_SPEED_MS: u64 = 50;

pub const VULNERABLE_DURATION_MS: u64 = 10_000;
pub const RELEASE_STAGGER_MS: u64 = 1_000;
pub const LEVEL_UP_DELAY_MS: u64 = 2_000;
pub const GAME_OVER_RESET_DELAY_MS: u64 = 3_000;

pub const PICKUP_SCORE: u32 = 10;
pub const POWER_PICKUP_SCORE: u32 = 100;
pub const PURSUER_EATEN_SCORE: u32 = 500;

pub const AMBUSH_LOOKAHEAD: i32 = 4;
pub const ERRATIC_RANDOM_CHANCE: f64 = 0.5;

pub fn speed_for_level(base_ms: u64, decay: f64, floor_ms: u64, level: u32) -> u64 {
    let exponent = level.saturating_sub(1).min(i32::MAX as u32) as i32;
    let scaled = (base_ms as f64 * decay.powi(exponent)).floor();
    if !scaled.is_finite() || scaled < floor_ms as f64 {
        return floor_ms;
    }
    (scaled as u64).max(floor_ms)
}

pub fn player_speed_for_level(level: u32) -> u64 {
    speed_for_level(
        PLAYER_BASE_SPEED_MS,
        PLAYER_SPEED_DECAY,
        MIN_SPEED_MS,
        level,
    )
}

pub fn pursuer_speed_for_level(level: u32) -> u64 {
    speed_for_level(
        PURSUER_BASE_SPEED_MS,
        PURSUER_SPEED_DECAY,
        MIN_SPEED_MS,
        level,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_uses_base_speeds() {
        assert_eq!(player_speed_for_level(1), 150);
        assert_eq!(pursuer_speed_for_level(1), 200);
    }

    #[test]
    fn level_two_decays_and_floors_fraction() {
        assert_eq!(player_speed_for_level(2), 142);
        assert_eq!(pursuer_speed_for_level(2), 184);
    }

    #[test]
    fn speeds_never_increase_and_respect_floor() {
        let mut last_player = u64::MAX;
        let mut last_pursuer = u64::MAX;
        for level in 1..=500 {
            let player = player_speed_for_level(level);
            let pursuer = pursuer_speed_for_level(level);
            assert!(player <= last_player);
            assert!(pursuer <= last_pursuer);
            assert!(player >= MIN_SPEED_MS);
            assert!(pursuer >= MIN_SPEED_MS);
            last_player = player;
            last_pursuer = pursuer;
        }
        assert_eq!(player_speed_for_level(u32::MAX), MIN_SPEED_MS);
        assert_eq!(pursuer_speed_for_level(u32::MAX), MIN_SPEED_MS);
    }

    #[test]
    fn level_zero_is_treated_as_first_level() {
        assert_eq!(player_speed_for_level(0), PLAYER_BASE_SPEED_MS);
    }
}
