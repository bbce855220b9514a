use std::collections::BTreeMap;

use crate::constants::PURSUER_COUNT;
use crate::layout::MazeLayout;
use crate::types::{CellKind, CellTags, CollectibleView, Position, Tag, WorldInit};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
    pub kind: CellKind,
    pub walkable: bool,
    pub tags: CellTags,
}

#[derive(Clone, Debug)]
pub struct GridWorld {
    rows: i32,
    cols: i32,
    cells: Vec<Cell>,
    tunnel_row: Option<i32>,
    player_spawn: Position,
    pursuer_homes: [Position; PURSUER_COUNT],
    initial_collectibles: BTreeMap<Position, bool>,
    collectibles: BTreeMap<Position, bool>,
}

impl GridWorld {
    pub fn new(layout: &MazeLayout) -> Self {
        let cols = layout.cols as i32;
        let mut cells = Vec::with_capacity(layout.cells.len());
        let mut initial_collectibles = BTreeMap::new();
        let mut tunnel_row = None;

        for (index, source) in layout.cells.iter().enumerate() {
            let row = index as i32 / cols;
            let col = index as i32 % cols;
            match source.kind {
                CellKind::Pickup => {
                    initial_collectibles.insert(Position::new(row, col), false);
                }
                CellKind::PowerPickup => {
                    initial_collectibles.insert(Position::new(row, col), true);
                }
                _ => {}
            }
            if tunnel_row.is_none() && source.tags.contains(Tag::Tunnel) {
                tunnel_row = Some(row);
            }
            cells.push(Cell {
                row,
                col,
                kind: source.kind,
                walkable: source.walkable,
                tags: source.tags,
            });
        }

        Self {
            rows: layout.rows as i32,
            cols,
            cells,
            tunnel_row,
            player_spawn: layout.player_spawn,
            pursuer_homes: layout.pursuer_homes,
            collectibles: initial_collectibles.clone(),
            initial_collectibles,
        }
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn tunnel_row(&self) -> Option<i32> {
        self.tunnel_row
    }

    pub fn player_spawn(&self) -> Position {
        self.player_spawn
    }

    pub fn pursuer_home(&self, index: usize) -> Option<Position> {
        self.pursuer_homes.get(index).copied()
    }

    pub fn cell(&self, row: i32, col: i32) -> Option<&Cell> {
        if row < 0 || col < 0 || row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get((row * self.cols + col) as usize)
    }

    pub fn is_walkable(&self, row: i32, col: i32) -> bool {
        self.cell(row, col).map(|cell| cell.walkable).unwrap_or(false)
    }

    pub fn has_tag(&self, row: i32, col: i32, tag: Tag) -> bool {
        self.cell(row, col)
            .map(|cell| cell.tags.contains(tag))
            .unwrap_or(false)
    }

    pub fn cells_with_tag(&self, tag: Tag) -> impl Iterator<Item = Position> + '_ {
        self.cells
            .iter()
            .filter(move |cell| cell.tags.contains(tag))
            .map(|cell| Position::new(cell.row, cell.col))
    }

    /// Wraps a horizontal step that left the interior on the tunnel row: the
    /// outer column on one side maps to the far interior column on the other.
    pub fn resolve_tunnel(&self, row: i32, col: i32) -> (i32, i32) {
        if self.tunnel_row != Some(row) {
            return (row, col);
        }
        if col <= 0 {
            return (row, self.cols - 2);
        }
        if col >= self.cols - 1 {
            return (row, 1);
        }
        (row, col)
    }

    pub fn collectible_at(&self, pos: Position) -> Option<bool> {
        self.collectibles.get(&pos).copied()
    }

    pub fn take_collectible(&mut self, pos: Position) -> Option<bool> {
        self.collectibles.remove(&pos)
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.collectibles.len()
    }

    pub fn collectible_views(&self) -> Vec<CollectibleView> {
        self.collectibles
            .iter()
            .map(|(pos, is_power)| CollectibleView {
                row: pos.row,
                col: pos.col,
                is_power: *is_power,
            })
            .collect()
    }

    pub fn reset_collectibles(&mut self) {
        self.collectibles.clear();
        self.collectibles
            .extend(self.initial_collectibles.iter().map(|(pos, power)| (*pos, *power)));
    }

    pub fn to_world_init(&self) -> WorldInit {
        let mut tiles = Vec::with_capacity(self.rows as usize);
        for row in 0..self.rows {
            let mut line = String::with_capacity(self.cols as usize);
            for col in 0..self.cols {
                line.push(self.tile_symbol(row, col));
            }
            tiles.push(line);
        }
        WorldInit {
            rows: self.rows,
            cols: self.cols,
            tunnel_row: self.tunnel_row,
            tiles,
        }
    }

    fn tile_symbol(&self, row: i32, col: i32) -> char {
        let Some(cell) = self.cell(row, col) else {
            return '#';
        };
        let pos = Position::new(row, col);
        if let Some(index) = self.pursuer_homes.iter().position(|home| *home == pos) {
            return char::from(b'0' + index as u8);
        }
        match cell.kind {
            CellKind::Wall => '#',
            CellKind::Pickup => '.',
            CellKind::PowerPickup => 'o',
            CellKind::Tunnel => 'T',
            CellKind::Home if cell.tags.contains(Tag::HomeDoor) => 'D',
            CellKind::Home if cell.walkable => 'H',
            CellKind::Home => '=',
            CellKind::Empty if cell.tags.contains(Tag::PlayerSpawn) => 'P',
            CellKind::Empty => ' ',
        }
    }
}
