use std::path::Path;

use crate::constants::PURSUER_COUNT;
use crate::error::{Error, LayoutError};
use crate::types::{CellKind, CellTags, Position, Tag};

pub const CLASSIC_MAZE: &str = "\
############################
#............##............#
#.####.#####.##.#####.####.#
#o####.#####.##.#####.####o#
#.####.#####.##.#####.####.#
#..........................#
#.####.##.########.##.####.#
#.####.##.########.##.####.#
#..... ##    ##    ## .....#
###### ##### ## ##### ######
###### ##### ## ##### ######
###### ##          ## ######
###### ## ===DD=== ## ######
TTTTTT    =H2013H=    TTTTTT
###### ## ======== ## ######
###### ##          ## ######
###### ## ######## ## ######
###### ## ######## ## ######
#.....       ##       .....#
#.####.#####.##.#####.####.#
#.####.#####.##.#####.####.#
#o..##.......P .......##..o#
###.##.##.########.##.##.###
###.##.##.########.##.##.###
#......##....##....##......#
#.##########.##.##########.#
#.##########.##.##########.#
#..........................#
############################";

pub const CODE_EMPTY: u8 = 0;
pub const CODE_WALL: u8 = 1;
pub const CODE_PICKUP: u8 = 2;
pub const CODE_POWER: u8 = 3;
pub const CODE_HOME: u8 = 4;
pub const CODE_TUNNEL: u8 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutCell {
    pub kind: CellKind,
    pub walkable: bool,
    pub tags: CellTags,
}

impl LayoutCell {
    fn new(kind: CellKind, walkable: bool) -> Self {
        Self {
            kind,
            walkable,
            tags: CellTags::default(),
        }
    }

    fn tagged(mut self, tag: Tag) -> Self {
        self.tags = self.tags.with(tag);
        self
    }
}

#[derive(Clone, Debug)]
pub struct Zones {
    pub doors: Vec<Position>,
    pub player_spawn: Position,
    pub pursuer_homes: [Position; PURSUER_COUNT],
}

#[derive(Clone, Debug)]
pub struct MazeLayout {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<LayoutCell>,
    pub player_spawn: Position,
    pub pursuer_homes: [Position; PURSUER_COUNT],
}

impl MazeLayout {
    pub fn classic() -> Self {
        match Self::parse(CLASSIC_MAZE) {
            Ok(layout) => layout,
            Err(error) => unreachable!("built-in maze is valid: {error}"),
        }
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&raw)?)
    }

    pub fn parse(raw: &str) -> Result<Self, LayoutError> {
        let lines: Vec<&str> = raw
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect();
        let rows = lines.len();
        if rows == 0 {
            return Err(LayoutError::Empty);
        }
        let cols = lines[0].chars().count();
        check_dimensions(rows, cols)?;

        let mut cells = Vec::with_capacity(rows * cols);
        let mut spawns = Vec::new();
        let mut homes: [Option<Position>; PURSUER_COUNT] = [None; PURSUER_COUNT];
        let mut has_door = false;

        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != cols {
                return Err(LayoutError::RaggedRow {
                    row,
                    expected: cols,
                    found,
                });
            }
            for (col, symbol) in line.chars().enumerate() {
                let pos = Position::new(row as i32, col as i32);
                let cell = match symbol {
                    '#' => LayoutCell::new(CellKind::Wall, false),
                    ' ' => LayoutCell::new(CellKind::Empty, true),
                    '.' => LayoutCell::new(CellKind::Pickup, true),
                    'o' => LayoutCell::new(CellKind::PowerPickup, true),
                    'T' => LayoutCell::new(CellKind::Tunnel, true).tagged(Tag::Tunnel),
                    '=' => LayoutCell::new(CellKind::Home, false).tagged(Tag::Home),
                    'H' => LayoutCell::new(CellKind::Home, true).tagged(Tag::Home),
                    'D' => {
                        has_door = true;
                        LayoutCell::new(CellKind::Home, true).tagged(Tag::HomeDoor)
                    }
                    'P' => {
                        spawns.push(pos);
                        LayoutCell::new(CellKind::Empty, true).tagged(Tag::PlayerSpawn)
                    }
                    '0'..='3' => {
                        let index = symbol as usize - '0' as usize;
                        if homes[index].replace(pos).is_some() {
                            return Err(LayoutError::DuplicatePursuerHome(index));
                        }
                        LayoutCell::new(CellKind::Home, true).tagged(Tag::Home)
                    }
                    other => {
                        return Err(LayoutError::UnknownSymbol {
                            symbol: other,
                            row,
                            col,
                        })
                    }
                };
                cells.push(cell);
            }
        }

        if spawns.len() != 1 {
            return Err(LayoutError::PlayerSpawn(spawns.len()));
        }
        if !has_door {
            return Err(LayoutError::MissingDoor);
        }
        let pursuer_homes = collect_homes(homes)?;

        Ok(Self {
            rows,
            cols,
            cells,
            player_spawn: spawns[0],
            pursuer_homes,
        })
    }

    /// Builds a layout from the integer cell codes (0 empty, 1 wall, 2 pickup,
    /// 3 power pickup, 4 home, 5 tunnel) plus explicit zones.
    pub fn from_codes(codes: &[Vec<u8>], zones: &Zones) -> Result<Self, LayoutError> {
        let rows = codes.len();
        if rows == 0 {
            return Err(LayoutError::Empty);
        }
        let cols = codes[0].len();
        check_dimensions(rows, cols)?;

        let mut cells = Vec::with_capacity(rows * cols);
        for (row, line) in codes.iter().enumerate() {
            if line.len() != cols {
                return Err(LayoutError::RaggedRow {
                    row,
                    expected: cols,
                    found: line.len(),
                });
            }
            for (col, &code) in line.iter().enumerate() {
                let pos = Position::new(row as i32, col as i32);
                let cell = match code {
                    CODE_EMPTY => LayoutCell::new(CellKind::Empty, true),
                    CODE_WALL => LayoutCell::new(CellKind::Wall, false),
                    CODE_PICKUP => LayoutCell::new(CellKind::Pickup, true),
                    CODE_POWER => LayoutCell::new(CellKind::PowerPickup, true),
                    CODE_HOME if zones.doors.contains(&pos) => {
                        LayoutCell::new(CellKind::Home, true).tagged(Tag::HomeDoor)
                    }
                    CODE_HOME => LayoutCell::new(CellKind::Home, true).tagged(Tag::Home),
                    CODE_TUNNEL => LayoutCell::new(CellKind::Tunnel, true).tagged(Tag::Tunnel),
                    other => {
                        return Err(LayoutError::UnknownCode {
                            code: other,
                            row,
                            col,
                        })
                    }
                };
                cells.push(cell);
            }
        }

        if zones.doors.is_empty() {
            return Err(LayoutError::MissingDoor);
        }
        let cell_at = |pos: Position| -> Option<LayoutCell> {
            if pos.row < 0 || pos.col < 0 || pos.row as usize >= rows || pos.col as usize >= cols {
                return None;
            }
            cells.get(pos.row as usize * cols + pos.col as usize).copied()
        };
        for door in &zones.doors {
            if !cell_at(*door).is_some_and(|cell| cell.tags.contains(Tag::HomeDoor)) {
                return Err(invalid_zone(*door, "not a home cell"));
            }
        }
        for (index, home) in zones.pursuer_homes.iter().enumerate() {
            if !cell_at(*home).is_some_and(|cell| cell.tags.contains(Tag::Home)) {
                return Err(invalid_zone(*home, "not a home interior cell"));
            }
            if zones.pursuer_homes[..index].contains(home) {
                return Err(LayoutError::DuplicatePursuerHome(index));
            }
        }
        let spawn = zones.player_spawn;
        match cell_at(spawn) {
            Some(cell) if cell.walkable && cell.kind != CellKind::Home => {}
            _ => return Err(invalid_zone(spawn, "not a walkable corridor")),
        }
        let spawn_index = spawn.row as usize * cols + spawn.col as usize;
        cells[spawn_index] = cells[spawn_index].tagged(Tag::PlayerSpawn);

        Ok(Self {
            rows,
            cols,
            cells,
            player_spawn: spawn,
            pursuer_homes: zones.pursuer_homes,
        })
    }
}

fn check_dimensions(rows: usize, cols: usize) -> Result<(), LayoutError> {
    if rows < 3 || cols < 3 {
        return Err(LayoutError::TooSmall { rows, cols });
    }
    Ok(())
}

fn collect_homes(
    homes: [Option<Position>; PURSUER_COUNT],
) -> Result<[Position; PURSUER_COUNT], LayoutError> {
    let mut out = [Position::new(0, 0); PURSUER_COUNT];
    for (index, home) in homes.into_iter().enumerate() {
        out[index] = home.ok_or(LayoutError::MissingPursuerHome(index))?;
    }
    Ok(out)
}

fn invalid_zone(pos: Position, reason: &'static str) -> LayoutError {
    LayoutError::InvalidZone {
        row: pos.row,
        col: pos.col,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_maze_matches_reference_dimensions_and_zones() {
        let layout = MazeLayout::classic();
        assert_eq!((layout.rows, layout.cols), (29, 28));
        assert_eq!(layout.player_spawn, Position::new(21, 13));
        assert_eq!(
            layout.pursuer_homes,
            [
                Position::new(13, 13),
                Position::new(13, 14),
                Position::new(13, 12),
                Position::new(13, 15),
            ]
        );
        let pickups = layout
            .cells
            .iter()
            .filter(|cell| matches!(cell.kind, CellKind::Pickup | CellKind::PowerPickup))
            .count();
        let powers = layout
            .cells
            .iter()
            .filter(|cell| cell.kind == CellKind::PowerPickup)
            .count();
        assert_eq!(pickups, 198);
        assert_eq!(powers, 4);
    }

    #[test]
    fn parse_rejects_ragged_rows_and_unknown_symbols() {
        let ragged = "#####\n#P D#\n#0123\n####";
        assert!(matches!(
            MazeLayout::parse(ragged),
            Err(LayoutError::RaggedRow { row: 3, .. })
        ));
        let unknown = "#####\n#P?D#\n#0123\n#####";
        assert_eq!(
            MazeLayout::parse(unknown).unwrap_err(),
            LayoutError::UnknownSymbol {
                symbol: '?',
                row: 1,
                col: 2
            }
        );
    }

    #[test]
    fn parse_requires_spawn_door_and_all_homes() {
        assert_eq!(
            MazeLayout::parse("######\n#  D #\n#0123#\n######").unwrap_err(),
            LayoutError::PlayerSpawn(0)
        );
        assert_eq!(
            MazeLayout::parse("######\n#P   #\n#0123#\n######").unwrap_err(),
            LayoutError::MissingDoor
        );
        assert_eq!(
            MazeLayout::parse("######\n#P D #\n#012H#\n######").unwrap_err(),
            LayoutError::MissingPursuerHome(3)
        );
        assert_eq!(
            MazeLayout::parse("#######\n#P D  #\n#01230#\n#######").unwrap_err(),
            LayoutError::DuplicatePursuerHome(0)
        );
    }

    #[test]
    fn codes_build_the_same_zones_as_ascii() {
        let codes = vec![
            vec![1, 1, 1, 1, 1, 1],
            vec![5, 0, 2, 3, 0, 5],
            vec![1, 4, 4, 4, 4, 1],
            vec![1, 4, 4, 4, 4, 1],
            vec![1, 1, 1, 1, 1, 1],
        ];
        let zones = Zones {
            doors: vec![Position::new(2, 2)],
            player_spawn: Position::new(1, 1),
            pursuer_homes: [
                Position::new(3, 1),
                Position::new(3, 2),
                Position::new(3, 3),
                Position::new(3, 4),
            ],
        };
        let layout = MazeLayout::from_codes(&codes, &zones).expect("codes are valid");
        let door = layout.cells[2 * 6 + 2];
        assert!(door.tags.contains(Tag::HomeDoor));
        assert!(!door.tags.contains(Tag::Home));
        assert!(layout.cells[6 + 1].tags.contains(Tag::PlayerSpawn));
        assert!(layout.cells[6].tags.contains(Tag::Tunnel));
    }

    #[test]
    fn codes_reject_unknown_values_and_bad_zones() {
        let zones = Zones {
            doors: vec![Position::new(1, 1)],
            player_spawn: Position::new(1, 1),
            pursuer_homes: [Position::new(1, 1); PURSUER_COUNT],
        };
        let unknown = vec![vec![1, 1, 1], vec![1, 9, 1], vec![1, 1, 1]];
        assert!(matches!(
            MazeLayout::from_codes(&unknown, &zones),
            Err(LayoutError::UnknownCode { code: 9, .. })
        ));
        let no_home = vec![vec![1, 1, 1], vec![1, 0, 1], vec![1, 1, 1]];
        assert!(matches!(
            MazeLayout::from_codes(&no_home, &zones),
            Err(LayoutError::InvalidZone { row: 1, col: 1, .. })
        ));

        let home = vec![
            vec![1, 1, 1, 1, 1, 1],
            vec![1, 0, 2, 3, 0, 1],
            vec![1, 4, 4, 4, 4, 1],
            vec![1, 4, 4, 4, 4, 1],
            vec![1, 1, 1, 1, 1, 1],
        ];
        let stacked = Zones {
            doors: vec![Position::new(2, 2)],
            player_spawn: Position::new(1, 1),
            pursuer_homes: [
                Position::new(3, 1),
                Position::new(3, 2),
                Position::new(3, 1),
                Position::new(3, 4),
            ],
        };
        assert_eq!(
            MazeLayout::from_codes(&home, &stacked).err(),
            Some(LayoutError::DuplicatePursuerHome(2))
        );
    }
}
