use crate::config::EngineConfig;
use crate::rng::RandomSource;
use crate::types::{Direction, Position, PursuerMode, Strategy, Tag};
use crate::world::GridWorld;

use super::coordinator::Pursuer;
use super::motion::{self, Mover, StepOutcome};
use super::utils::euclidean;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub dir: Direction,
    pub to: Position,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChaseTarget {
    pub position: Position,
    pub facing: Direction,
}

pub fn home_rule_allows(
    world: &GridWorld,
    from: Position,
    to: Position,
    door_open: bool,
    is_dead: bool,
) -> bool {
    let inside = world.has_tag(from.row, from.col, Tag::Home);
    let to_home = world.has_tag(to.row, to.col, Tag::Home);
    let to_door = world.has_tag(to.row, to.col, Tag::HomeDoor);
    if inside {
        to_home || (to_door && door_open)
    } else {
        (!to_home && !to_door) || (to_door && is_dead)
    }
}

pub fn blocked_by_other(pursuers: &[Pursuer], index: usize, to: Position) -> bool {
    pursuers
        .iter()
        .any(|other| other.index != index && !other.is_dead && other.position == to)
}

pub fn admissible_moves(
    world: &GridWorld,
    pursuers: &[Pursuer],
    index: usize,
    door_open: bool,
) -> Vec<Candidate> {
    let Some(pursuer) = pursuers.get(index) else {
        return Vec::new();
    };
    Direction::AXES
        .iter()
        .filter_map(|&dir| match motion::step(world, pursuer.position, dir, Mover::Pursuer) {
            StepOutcome::Moved(resolved) => Some(Candidate {
                dir,
                to: resolved.to,
            }),
            StepOutcome::Blocked => None,
        })
        .filter(|candidate| {
            home_rule_allows(
                world,
                pursuer.position,
                candidate.to,
                door_open,
                pursuer.is_dead,
            )
        })
        .filter(|candidate| pursuer.is_dead || !blocked_by_other(pursuers, index, candidate.to))
        .collect()
}

pub fn choose_move<R: RandomSource + ?Sized>(
    mode: PursuerMode,
    strategy: Strategy,
    candidates: &[Candidate],
    target: ChaseTarget,
    config: &EngineConfig,
    rng: &mut R,
) -> Option<Candidate> {
    if candidates.is_empty() {
        return None;
    }
    let chance = config.erratic_random_chance;
    match mode {
        PursuerMode::Dead | PursuerMode::Vulnerable => {
            erratic(candidates, target.position, false, chance, rng)
        }
        PursuerMode::Chasing => match strategy {
            Strategy::Direct => closest(candidates, target.position),
            Strategy::Ambush => {
                let projected = target
                    .position
                    .offset(target.facing, config.ambush_lookahead);
                closest(candidates, projected)
            }
            Strategy::Erratic => erratic(candidates, target.position, true, chance, rng),
        },
    }
}

fn closest(candidates: &[Candidate], target: Position) -> Option<Candidate> {
    let mut best: Option<(f64, Candidate)> = None;
    for candidate in candidates {
        let distance = euclidean(candidate.to, target);
        if best.map(|(d, _)| distance < d).unwrap_or(true) {
            best = Some((distance, *candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}

fn farthest(candidates: &[Candidate], target: Position) -> Option<Candidate> {
    let mut best: Option<(f64, Candidate)> = None;
    for candidate in candidates {
        let distance = euclidean(candidate.to, target);
        if best.map(|(d, _)| distance > d).unwrap_or(true) {
            best = Some((distance, *candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}

fn erratic<R: RandomSource + ?Sized>(
    candidates: &[Candidate],
    target: Position,
    toward: bool,
    chance: f64,
    rng: &mut R,
) -> Option<Candidate> {
    if rng.chance(chance) {
        return candidates.get(rng.pick_index(candidates.len())).copied();
    }
    if toward {
        closest(candidates, target)
    } else {
        farthest(candidates, target)
    }
}
