use crate::types::{Direction, PlayerView, Position};

#[derive(Clone, Debug)]
pub struct PlayerController {
    pub position: Position,
    pub dir: Direction,
    pub speed_ms: u64,
    pub score: u32,
    pub level: u32,
    pub on_board: bool,
    awaiting_first_move: bool,
}

impl PlayerController {
    pub fn new(spawn: Position, speed_ms: u64) -> Self {
        Self {
            position: spawn,
            dir: Direction::Right,
            speed_ms,
            score: 0,
            level: 1,
            on_board: true,
            awaiting_first_move: true,
        }
    }

    pub fn respawn(&mut self, spawn: Position) {
        self.position = spawn;
        self.dir = Direction::Right;
        self.on_board = true;
        self.awaiting_first_move = true;
    }

    pub fn take_first_move_latch(&mut self) -> bool {
        std::mem::replace(&mut self.awaiting_first_move, false)
    }

    pub fn awaiting_first_move(&self) -> bool {
        self.awaiting_first_move
    }

    pub fn add_score(&mut self, points: u32) -> u32 {
        self.score = self.score.saturating_add(points);
        self.score
    }

    pub fn view(&self, moving: bool) -> PlayerView {
        PlayerView {
            row: self.position.row,
            col: self.position.col,
            dir: self.dir,
            speed_ms: self.speed_ms,
            on_board: self.on_board,
            moving,
        }
    }
}
