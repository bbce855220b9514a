use tracing::debug;

use crate::config::EngineConfig;
use crate::types::{
    Direction, Position, PursuerColor, PursuerMode, PursuerView, RuntimeEvent, Strategy, Tag,
};
use crate::world::GridWorld;

use super::policy::blocked_by_other;
use super::scheduler::{Scheduler, TimerKey};
use super::utils::euclidean;

#[derive(Clone, Debug, PartialEq)]
pub struct Pursuer {
    pub index: usize,
    pub color: PursuerColor,
    pub strategy: Strategy,
    pub home: Position,
    pub position: Position,
    pub dir: Direction,
    pub speed_ms: u64,
    pub is_vulnerable: bool,
    pub is_dead: bool,
}

impl Pursuer {
    pub fn new(index: usize, color: PursuerColor, home: Position, speed_ms: u64) -> Self {
        Self {
            index,
            color,
            strategy: color.strategy(),
            home,
            position: home,
            dir: Direction::None,
            speed_ms,
            is_vulnerable: false,
            is_dead: false,
        }
    }

    pub fn mode(&self) -> PursuerMode {
        if self.is_dead {
            PursuerMode::Dead
        } else if self.is_vulnerable {
            PursuerMode::Vulnerable
        } else {
            PursuerMode::Chasing
        }
    }

    pub fn respawn(&mut self) {
        self.position = self.home;
        self.dir = Direction::None;
        self.is_dead = false;
        self.is_vulnerable = false;
    }

    pub fn view(&self) -> PursuerView {
        PursuerView {
            index: self.index,
            color: self.color,
            strategy: self.strategy,
            row: self.position.row,
            col: self.position.col,
            dir: self.dir,
            mode: self.mode(),
            is_vulnerable: self.is_vulnerable,
            is_dead: self.is_dead,
            speed_ms: self.speed_ms,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PursuerCoordinator {
    pursuers: Vec<Pursuer>,
    door_open: bool,
}

impl PursuerCoordinator {
    pub fn new(world: &GridWorld, speed_ms: u64) -> Self {
        let pursuers = PursuerColor::ROSTER
            .iter()
            .enumerate()
            .map(|(index, color)| {
                let home = world
                    .pursuer_home(index)
                    .unwrap_or_else(|| world.player_spawn());
                Pursuer::new(index, *color, home, speed_ms)
            })
            .collect();
        Self {
            pursuers,
            door_open: false,
        }
    }

    pub fn door_open(&self) -> bool {
        self.door_open
    }

    pub fn pursuers(&self) -> &[Pursuer] {
        &self.pursuers
    }

    pub fn pursuer(&self, index: usize) -> Option<&Pursuer> {
        self.pursuers.get(index)
    }

    pub fn len(&self) -> usize {
        self.pursuers.len()
    }

    pub fn open_doors(
        &mut self,
        scheduler: &mut Scheduler,
        config: &EngineConfig,
        events: &mut Vec<RuntimeEvent>,
    ) -> bool {
        if self.door_open {
            return false;
        }
        self.door_open = true;
        events.push(RuntimeEvent::DoorsOpened);
        debug!(at_ms = scheduler.now_ms(), "home doors opened");
        for index in 0..self.pursuers.len() {
            let offset = config.release_stagger_ms.saturating_mul(index as u64);
            if offset == 0 {
                self.release(index, scheduler, config, events);
            } else {
                scheduler.schedule_once(TimerKey::PursuerRelease(index), offset);
            }
        }
        true
    }

    pub fn release(
        &mut self,
        index: usize,
        scheduler: &mut Scheduler,
        config: &EngineConfig,
        events: &mut Vec<RuntimeEvent>,
    ) {
        if index >= self.pursuers.len() || scheduler.is_active(TimerKey::PursuerStep(index)) {
            return;
        }
        scheduler.schedule_every(TimerKey::PursuerStep(index), self.period(index, config));
        events.push(RuntimeEvent::PursuerReleased {
            index,
            at_ms: scheduler.now_ms(),
        });
        debug!(index, at_ms = scheduler.now_ms(), "pursuer released");
    }

    pub fn make_all_vulnerable(&mut self, scheduler: &mut Scheduler, config: &EngineConfig) {
        for pursuer in &mut self.pursuers {
            if pursuer.is_dead {
                continue;
            }
            pursuer.is_vulnerable = true;
            scheduler.schedule_once(
                TimerKey::VulnerabilityExpiry(pursuer.index),
                config.vulnerable_duration_ms,
            );
        }
    }

    pub fn expire_vulnerability(&mut self, index: usize) -> bool {
        let Some(pursuer) = self.pursuers.get_mut(index) else {
            return false;
        };
        if pursuer.is_dead || !pursuer.is_vulnerable {
            return false;
        }
        pursuer.is_vulnerable = false;
        true
    }

    pub fn kill(&mut self, index: usize, scheduler: &mut Scheduler, config: &EngineConfig) {
        let Some(pursuer) = self.pursuers.get_mut(index) else {
            return;
        };
        if pursuer.is_dead {
            return;
        }
        pursuer.is_dead = true;
        pursuer.is_vulnerable = false;
        scheduler.cancel(TimerKey::VulnerabilityExpiry(index));
        self.restart_timer(index, scheduler, config);
        debug!(index, "pursuer died");
    }

    /// Respawns a dead pursuer at its home, or at the nearest home cell no
    /// living pursuer holds. Returns false when every home cell is taken.
    pub fn revive(
        &mut self,
        index: usize,
        world: &GridWorld,
        scheduler: &mut Scheduler,
        config: &EngineConfig,
    ) -> bool {
        let Some(spot) = self.free_home_cell(index, world) else {
            return false;
        };
        let pursuer = &mut self.pursuers[index];
        pursuer.respawn();
        pursuer.position = spot;
        scheduler.cancel(TimerKey::VulnerabilityExpiry(index));
        self.restart_timer(index, scheduler, config);
        debug!(index, row = spot.row, col = spot.col, "pursuer respawned");
        true
    }

    fn free_home_cell(&self, index: usize, world: &GridWorld) -> Option<Position> {
        let home = self.pursuers.get(index)?.home;
        if !blocked_by_other(&self.pursuers, index, home) {
            return Some(home);
        }
        world
            .cells_with_tag(Tag::Home)
            .filter(|pos| world.is_walkable(pos.row, pos.col))
            .filter(|pos| !blocked_by_other(&self.pursuers, index, *pos))
            .min_by(|a, b| euclidean(*a, home).total_cmp(&euclidean(*b, home)))
    }

    // Occupancy is re-checked here since candidates may be stale.
    pub fn commit_move(&mut self, index: usize, to: Position, dir: Direction) -> bool {
        let Some(mover) = self.pursuers.get(index) else {
            return false;
        };
        if !mover.is_dead && blocked_by_other(&self.pursuers, index, to) {
            return false;
        }
        let pursuer = &mut self.pursuers[index];
        pursuer.position = to;
        pursuer.dir = dir;
        true
    }

    pub fn level_reset(&mut self, scheduler: &mut Scheduler, speed_ms: u64) {
        self.door_open = false;
        self.halt(scheduler);
        for pursuer in &mut self.pursuers {
            pursuer.speed_ms = speed_ms;
            pursuer.respawn();
        }
    }

    pub fn full_reset(&mut self, scheduler: &mut Scheduler, config: &EngineConfig) {
        self.level_reset(scheduler, config.pursuer_speed(1));
    }

    pub fn halt(&mut self, scheduler: &mut Scheduler) {
        scheduler.cancel_where(|key| {
            matches!(
                key,
                TimerKey::PursuerStep(_)
                    | TimerKey::PursuerRelease(_)
                    | TimerKey::VulnerabilityExpiry(_)
            )
        });
    }

    pub fn views(&self) -> Vec<PursuerView> {
        self.pursuers.iter().map(Pursuer::view).collect()
    }

    #[cfg(test)]
    pub(crate) fn pursuer_mut(&mut self, index: usize) -> Option<&mut Pursuer> {
        self.pursuers.get_mut(index)
    }

    fn period(&self, index: usize, config: &EngineConfig) -> u64 {
        let pursuer = &self.pursuers[index];
        if pursuer.is_dead {
            config.returning_speed(pursuer.speed_ms)
        } else {
            pursuer.speed_ms
        }
    }

    fn restart_timer(&mut self, index: usize, scheduler: &mut Scheduler, config: &EngineConfig) {
        let key = TimerKey::PursuerStep(index);
        if scheduler.is_active(key) {
            scheduler.schedule_every(key, self.period(index, config));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MazeLayout;

    fn setup() -> (GridWorld, PursuerCoordinator, Scheduler, EngineConfig) {
        let world = GridWorld::new(&MazeLayout::classic());
        let config = EngineConfig::default();
        let coordinator = PursuerCoordinator::new(&world, config.pursuer_speed(1));
        (world, coordinator, Scheduler::new(), config)
    }

    fn release_times(scheduler: &mut Scheduler, coordinator: &mut PursuerCoordinator, config: &EngineConfig, events: &mut Vec<RuntimeEvent>) {
        while let Some(fired) = scheduler.pop_due(10_000) {
            if let TimerKey::PursuerRelease(index) = fired.key {
                coordinator.release(index, scheduler, config, events);
            }
        }
    }

    #[test]
    fn roster_has_fixed_strategies_at_home() {
        let (world, coordinator, _, _) = setup();
        assert_eq!(coordinator.len(), 4);
        let strategies: Vec<Strategy> = coordinator.pursuers().iter().map(|p| p.strategy).collect();
        assert_eq!(
            strategies,
            vec![Strategy::Direct, Strategy::Ambush, Strategy::Erratic, Strategy::Direct]
        );
        for (index, pursuer) in coordinator.pursuers().iter().enumerate() {
            assert_eq!(Some(pursuer.position), world.pursuer_home(index));
            assert_eq!(pursuer.mode(), PursuerMode::Chasing);
        }
        assert!(!coordinator.door_open());
    }

    #[test]
    fn open_doors_is_idempotent_and_staggers_release() {
        let (_, mut coordinator, mut scheduler, config) = setup();
        let mut events = Vec::new();
        assert!(coordinator.open_doors(&mut scheduler, &config, &mut events));
        assert!(!coordinator.open_doors(&mut scheduler, &config, &mut events));
        assert!(coordinator.door_open());
        release_times(&mut scheduler, &mut coordinator, &config, &mut events);

        let released: Vec<(usize, u64)> = events
            .iter()
            .filter_map(|event| match event {
                RuntimeEvent::PursuerReleased { index, at_ms } => Some((*index, *at_ms)),
                _ => None,
            })
            .collect();
        assert_eq!(released, vec![(0, 0), (1, 1_000), (2, 2_000), (3, 3_000)]);
        let opened = events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::DoorsOpened))
            .count();
        assert_eq!(opened, 1);
    }

    #[test]
    fn dead_pursuer_cannot_become_vulnerable() {
        let (_, mut coordinator, mut scheduler, config) = setup();
        coordinator.kill(1, &mut scheduler, &config);
        coordinator.make_all_vulnerable(&mut scheduler, &config);
        let modes: Vec<PursuerMode> = coordinator.pursuers().iter().map(Pursuer::mode).collect();
        assert_eq!(
            modes,
            vec![
                PursuerMode::Vulnerable,
                PursuerMode::Dead,
                PursuerMode::Vulnerable,
                PursuerMode::Vulnerable
            ]
        );
        assert!(!scheduler.is_active(TimerKey::VulnerabilityExpiry(1)));
    }

    #[test]
    fn death_clears_vulnerability_and_expiry_does_not_resurrect_it() {
        let (_, mut coordinator, mut scheduler, config) = setup();
        coordinator.make_all_vulnerable(&mut scheduler, &config);
        coordinator.kill(0, &mut scheduler, &config);
        assert!(!coordinator.pursuers()[0].is_vulnerable);
        assert!(!scheduler.is_active(TimerKey::VulnerabilityExpiry(0)));
        assert!(!coordinator.expire_vulnerability(0));
        assert!(coordinator.pursuers()[0].is_dead);
        assert!(coordinator.expire_vulnerability(1));
        assert!(!coordinator.pursuers()[1].is_vulnerable);
    }

    #[test]
    fn death_switches_a_running_loop_to_the_returning_speed() {
        let (_, mut coordinator, mut scheduler, config) = setup();
        let mut events = Vec::new();
        coordinator.release(0, &mut scheduler, &config, &mut events);
        coordinator.kill(0, &mut scheduler, &config);
        let fired = scheduler.pop_due(u64::MAX).expect("loop keeps running");
        assert_eq!(fired.key, TimerKey::PursuerStep(0));
        assert_eq!(fired.at_ms, config.returning_speed(200));
    }

    #[test]
    fn commit_rechecks_occupancy() {
        let (_, mut coordinator, _, _) = setup();
        let occupied = coordinator.pursuers()[2].position;
        assert!(!coordinator.commit_move(0, occupied, Direction::Left));
        assert_eq!(coordinator.pursuers()[0].position, Position::new(13, 13));
        if let Some(pursuer) = coordinator.pursuer_mut(0) {
            pursuer.is_dead = true;
        }
        assert!(coordinator.commit_move(0, occupied, Direction::Left));
    }

    #[test]
    fn revive_falls_back_to_the_nearest_free_home_cell() {
        let (world, mut coordinator, mut scheduler, config) = setup();
        let home = coordinator.pursuers()[0].home;
        if let Some(pursuer) = coordinator.pursuer_mut(1) {
            pursuer.position = home;
        }
        coordinator.kill(0, &mut scheduler, &config);
        assert!(coordinator.revive(0, &world, &mut scheduler, &config));

        let revived = coordinator.pursuers()[0].clone();
        assert_eq!(revived.mode(), PursuerMode::Chasing);
        assert_ne!(revived.position, home);
        assert!(world.has_tag(revived.position.row, revived.position.col, Tag::Home));
        assert!(world.is_walkable(revived.position.row, revived.position.col));
        let taken: Vec<Position> = coordinator.pursuers()[1..]
            .iter()
            .map(|p| p.position)
            .collect();
        assert!(!taken.contains(&revived.position));
    }

    #[test]
    fn level_reset_closes_door_and_respawns_everyone() {
        let (_, mut coordinator, mut scheduler, config) = setup();
        let mut events = Vec::new();
        coordinator.open_doors(&mut scheduler, &config, &mut events);
        coordinator.make_all_vulnerable(&mut scheduler, &config);
        coordinator.kill(3, &mut scheduler, &config);
        assert!(coordinator.commit_move(0, Position::new(12, 13), Direction::Up));

        coordinator.level_reset(&mut scheduler, 150);
        assert!(!coordinator.door_open());
        assert_eq!(scheduler.next_due_ms(), None);
        for pursuer in coordinator.pursuers() {
            assert_eq!(pursuer.position, pursuer.home);
            assert_eq!(pursuer.mode(), PursuerMode::Chasing);
            assert_eq!(pursuer.speed_ms, 150);
        }

        coordinator.full_reset(&mut scheduler, &config);
        assert!(coordinator.pursuers().iter().all(|p| p.speed_ms == 200));
    }
}
