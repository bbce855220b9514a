use tracing::debug;

use crate::config::EngineConfig;
use crate::layout::MazeLayout;
use crate::rng::{RandomSource, SeededRng};
use crate::types::{
    Intent, Phase, RuntimeEvent, SessionStats, Snapshot, Tag, WorldInit,
};
use crate::world::GridWorld;

pub mod coordinator;
pub mod motion;
pub mod player;
pub mod policy;
pub mod scheduler;
mod progression;
mod utils;

use self::coordinator::PursuerCoordinator;
use self::motion::{Mover, StepOutcome};
use self::player::PlayerController;
use self::policy::ChaseTarget;
use self::scheduler::{Scheduler, TimerKey};

pub struct GameEngine {
    world: GridWorld,
    config: EngineConfig,
    scheduler: Scheduler,
    rng: Box<dyn RandomSource + Send>,
    player: PlayerController,
    coordinator: PursuerCoordinator,
    phase: Phase,
    events: Vec<RuntimeEvent>,
    stats: SessionStats,
}

impl GameEngine {
    pub fn new(layout: &MazeLayout, config: EngineConfig, seed: u32) -> Self {
        Self::with_rng(layout, config, Box::new(SeededRng::new(seed)))
    }

    pub fn with_rng(
        layout: &MazeLayout,
        config: EngineConfig,
        rng: Box<dyn RandomSource + Send>,
    ) -> Self {
        let world = GridWorld::new(layout);
        let player = PlayerController::new(world.player_spawn(), config.player_speed(1));
        let coordinator = PursuerCoordinator::new(&world, config.pursuer_speed(1));
        Self {
            world,
            config,
            scheduler: Scheduler::new(),
            rng,
            player,
            coordinator,
            phase: Phase::Playing,
            events: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.player.score
    }

    pub fn level(&self) -> u32 {
        self.player.level
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn coordinator(&self) -> &PursuerCoordinator {
        &self.coordinator
    }

    pub fn is_player_moving(&self) -> bool {
        self.scheduler.is_active(TimerKey::PlayerStep)
    }

    pub fn world_init(&self) -> WorldInit {
        self.world.to_world_init()
    }

    pub fn apply_intent(&mut self, intent: Intent) {
        if !self.player.on_board {
            return;
        }
        match intent {
            Intent::Move(dir) => {
                self.player.dir = dir;
                if self.is_player_moving() {
                    return;
                }
                self.player_step();
                if self.player.on_board {
                    self.scheduler
                        .schedule_every(TimerKey::PlayerStep, self.player.speed_ms);
                }
            }
            Intent::Release => self.scheduler.cancel(TimerKey::PlayerStep),
        }
    }

    pub fn advance(&mut self, dt_ms: u64) {
        let target = self.now_ms().saturating_add(dt_ms);
        self.advance_to(target);
    }

    pub fn advance_to(&mut self, target_ms: u64) {
        while let Some(fired) = self.scheduler.pop_due(target_ms) {
            self.dispatch(fired.key);
        }
        self.scheduler.set_now(target_ms);
    }

    pub fn drain_events(&mut self) -> Vec<RuntimeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        Snapshot {
            now_ms: self.now_ms(),
            phase: self.phase,
            score: self.player.score,
            level: self.player.level,
            door_open: self.coordinator.door_open(),
            player: self.player.view(self.is_player_moving()),
            pursuers: self.coordinator.views(),
            collectibles: self.world.collectible_views(),
            events: if include_events {
                self.drain_events()
            } else {
                Vec::new()
            },
        }
    }

    fn dispatch(&mut self, key: TimerKey) {
        match key {
            TimerKey::PlayerStep => self.player_step(),
            TimerKey::PursuerStep(index) => self.pursuer_step(index),
            TimerKey::PursuerRelease(index) => self.coordinator.release(
                index,
                &mut self.scheduler,
                &self.config,
                &mut self.events,
            ),
            TimerKey::VulnerabilityExpiry(index) => {
                if self.coordinator.expire_vulnerability(index) {
                    self.events.push(RuntimeEvent::VulnerabilityEnded { index });
                }
            }
            TimerKey::LevelUp => self.level_up(),
            TimerKey::GameOverReset => self.reset_after_game_over(),
        }
    }

    fn player_step(&mut self) {
        if !self.player.on_board {
            return;
        }
        let resolved = match motion::step(
            &self.world,
            self.player.position,
            self.player.dir,
            Mover::Player,
        ) {
            StepOutcome::Moved(resolved) => resolved,
            StepOutcome::Blocked => return,
        };
        self.player.position = resolved.to;

        if self.player.take_first_move_latch() {
            self.coordinator
                .open_doors(&mut self.scheduler, &self.config, &mut self.events);
        }
        self.consume_collectible();
        for index in 0..self.coordinator.len() {
            self.resolve_collision(index);
        }
    }

    fn consume_collectible(&mut self) {
        let pos = self.player.position;
        let Some(is_power) = self.world.take_collectible(pos) else {
            return;
        };
        self.stats.collectibles_eaten += 1;
        self.events.push(RuntimeEvent::CollectibleEaten {
            row: pos.row,
            col: pos.col,
            is_power,
        });
        if is_power {
            self.award(self.config.power_pickup_score);
            self.coordinator
                .make_all_vulnerable(&mut self.scheduler, &self.config);
            self.events.push(RuntimeEvent::PursuersVulnerable);
        } else {
            self.award(self.config.pickup_score);
        }
        self.check_win();
    }

    fn pursuer_step(&mut self, index: usize) {
        if self.phase == Phase::GameOver {
            return;
        }
        let candidates = policy::admissible_moves(
            &self.world,
            self.coordinator.pursuers(),
            index,
            self.coordinator.door_open(),
        );
        let Some(pursuer) = self.coordinator.pursuer(index) else {
            return;
        };
        let was_dead = pursuer.is_dead;
        let target = ChaseTarget {
            position: self.player.position,
            facing: self.player.dir,
        };
        let Some(choice) = policy::choose_move(
            pursuer.mode(),
            pursuer.strategy,
            &candidates,
            target,
            &self.config,
            &mut *self.rng,
        ) else {
            return;
        };
        if !self.coordinator.commit_move(index, choice.to, choice.dir) {
            return;
        }
        if was_dead && self.world.has_tag(choice.to.row, choice.to.col, Tag::HomeDoor) {
            self.try_revive(index);
            return;
        }
        self.resolve_collision(index);
    }

    fn try_revive(&mut self, index: usize) {
        if self
            .coordinator
            .revive(index, &self.world, &mut self.scheduler, &self.config)
        {
            self.events.push(RuntimeEvent::PursuerRespawned { index });
        }
    }

    fn resolve_collision(&mut self, index: usize) {
        if !self.player.on_board {
            return;
        }
        let Some(pursuer) = self.coordinator.pursuer(index) else {
            return;
        };
        if pursuer.is_dead || pursuer.position != self.player.position {
            return;
        }
        if pursuer.is_vulnerable {
            self.coordinator
                .kill(index, &mut self.scheduler, &self.config);
            self.stats.pursuers_eaten += 1;
            self.events.push(RuntimeEvent::PursuerEaten { index });
            self.award(self.config.pursuer_eaten_score);
            debug!(index, score = self.player.score, "pursuer eaten");
        } else {
            self.game_over();
        }
    }

    fn award(&mut self, points: u32) {
        let score = self.player.add_score(points);
        self.stats.best_score = self.stats.best_score.max(score);
        self.events.push(RuntimeEvent::ScoreChanged { score });
    }
}
