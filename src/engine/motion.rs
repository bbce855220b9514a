use crate::types::{Direction, Position, Tag};
use crate::world::GridWorld;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mover {
    Player,
    Pursuer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedMove {
    pub to: Position,
    pub dir: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Moved(ResolvedMove),
    Blocked,
}

pub fn step(world: &GridWorld, from: Position, dir: Direction, mover: Mover) -> StepOutcome {
    if dir == Direction::None {
        return StepOutcome::Blocked;
    }
    let candidate = from.offset(dir, 1);
    let (row, col) = if world.tunnel_row() == Some(from.row) {
        world.resolve_tunnel(candidate.row, candidate.col)
    } else {
        (candidate.row, candidate.col)
    };
    if !world.is_walkable(row, col) {
        return StepOutcome::Blocked;
    }
    if mover == Mover::Player
        && (world.has_tag(row, col, Tag::Home) || world.has_tag(row, col, Tag::HomeDoor))
    {
        return StepOutcome::Blocked;
    }
    StepOutcome::Moved(ResolvedMove {
        to: Position::new(row, col),
        dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MazeLayout;

    fn classic() -> GridWorld {
        GridWorld::new(&MazeLayout::classic())
    }

    fn moved_to(outcome: StepOutcome) -> Option<Position> {
        match outcome {
            StepOutcome::Moved(resolved) => Some(resolved.to),
            StepOutcome::Blocked => None,
        }
    }

    #[test]
    fn walls_block_and_corridors_pass() {
        let world = classic();
        let spawn = world.player_spawn();
        assert_eq!(
            moved_to(step(&world, spawn, Direction::Left, Mover::Player)),
            Some(Position::new(21, 12))
        );
        assert_eq!(step(&world, spawn, Direction::Down, Mover::Player), StepOutcome::Blocked);
        assert_eq!(step(&world, spawn, Direction::None, Mover::Player), StepOutcome::Blocked);
    }

    #[test]
    fn tunnel_wraps_both_ways_for_any_mover() {
        let world = classic();
        for mover in [Mover::Player, Mover::Pursuer] {
            assert_eq!(
                moved_to(step(&world, Position::new(13, 1), Direction::Left, mover)),
                Some(Position::new(13, 26))
            );
            assert_eq!(
                moved_to(step(&world, Position::new(13, 26), Direction::Right, mover)),
                Some(Position::new(13, 1))
            );
        }
    }

    #[test]
    fn wrap_only_applies_on_the_tunnel_row() {
        let world = classic();
        // (5,1) -> (5,0) is a border wall; it must not wrap to (5,26).
        assert_eq!(
            step(&world, Position::new(5, 1), Direction::Left, Mover::Pursuer),
            StepOutcome::Blocked
        );
    }

    #[test]
    fn player_can_never_enter_the_home_region() {
        let world = classic();
        let below_door = Position::new(11, 13);
        assert_eq!(
            step(&world, below_door, Direction::Down, Mover::Player),
            StepOutcome::Blocked
        );
        assert_eq!(
            moved_to(step(&world, below_door, Direction::Down, Mover::Pursuer)),
            Some(Position::new(12, 13))
        );
    }
}
