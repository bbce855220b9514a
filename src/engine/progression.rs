use tracing::info;

use super::*;

impl GameEngine {
    pub(super) fn check_win(&mut self) {
        if self.phase != Phase::Playing || self.world.remaining_collectibles() > 0 {
            return;
        }
        self.phase = Phase::LevelComplete;
        let level = self.player.level;
        self.events.push(RuntimeEvent::WinPending { level });
        self.scheduler
            .schedule_once(TimerKey::LevelUp, self.config.level_up_delay_ms);
        info!(level, score = self.player.score, "board cleared, level-up pending");
    }

    pub(super) fn level_up(&mut self) {
        if self.phase != Phase::LevelComplete {
            return;
        }
        self.player.level = self.player.level.saturating_add(1);
        let level = self.player.level;
        self.player.speed_ms = self.config.player_speed(level);
        self.world.reset_collectibles();
        self.coordinator
            .level_reset(&mut self.scheduler, self.config.pursuer_speed(level));
        self.scheduler.cancel(TimerKey::PlayerStep);
        self.player.respawn(self.world.player_spawn());
        self.phase = Phase::Playing;
        self.stats.level_ups += 1;

        self.events.push(RuntimeEvent::LevelChanged { level });
        self.events.push(RuntimeEvent::LevelStarted { level });
        info!(
            level,
            player_speed_ms = self.player.speed_ms,
            pursuer_speed_ms = self.config.pursuer_speed(level),
            "level started"
        );
    }

    pub(super) fn game_over(&mut self) {
        if self.phase == Phase::GameOver {
            return;
        }
        self.phase = Phase::GameOver;
        self.scheduler.cancel_all();
        self.coordinator
            .level_reset(&mut self.scheduler, self.config.pursuer_speed(self.player.level));
        self.player.on_board = false;
        self.stats.losses += 1;
        self.stats.best_score = self.stats.best_score.max(self.player.score);

        self.events.push(RuntimeEvent::GameOver {
            score: self.player.score,
            level: self.player.level,
        });
        self.scheduler
            .schedule_once(TimerKey::GameOverReset, self.config.game_over_reset_delay_ms);
        info!(
            score = self.player.score,
            level = self.player.level,
            "game over"
        );
    }

    pub(super) fn reset_after_game_over(&mut self) {
        if self.phase != Phase::GameOver {
            return;
        }
        self.player.score = 0;
        self.player.level = 1;
        self.player.speed_ms = self.config.player_speed(1);
        self.world.reset_collectibles();
        self.coordinator
            .full_reset(&mut self.scheduler, &self.config);
        self.player.respawn(self.world.player_spawn());
        self.phase = Phase::Playing;

        self.events.push(RuntimeEvent::ScoreChanged { score: 0 });
        self.events.push(RuntimeEvent::LevelChanged { level: 1 });
        self.events.push(RuntimeEvent::GameReset);
        info!("session reset after game over");
    }
}
