use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Candidate evaluation order; earlier entries win distance ties.
    pub const AXES: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
            Self::None => (0, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Move(Direction),
    Release,
}

impl Intent {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "release" | "stop" | "none" => Some(Self::Release),
            other => match Direction::parse_move(other)? {
                Direction::None => Some(Self::Release),
                dir => Some(Self::Move(dir)),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(self, dir: Direction, steps: i32) -> Self {
        let (dr, dc) = dir.delta();
        Self {
            row: self.row + dr * steps,
            col: self.col + dc * steps,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Empty,
    Wall,
    Pickup,
    PowerPickup,
    Home,
    Tunnel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Tag {
    Home,
    HomeDoor,
    PlayerSpawn,
    Tunnel,
}

impl Tag {
    fn bit(self) -> u8 {
        match self {
            Self::Home => 1,
            Self::HomeDoor => 1 << 1,
            Self::PlayerSpawn => 1 << 2,
            Self::Tunnel => 1 << 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellTags(u8);

impl CellTags {
    pub fn with(mut self, tag: Tag) -> Self {
        self.0 |= tag.bit();
        self
    }

    pub fn contains(self, tag: Tag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PursuerColor {
    Red,
    Pink,
    Cyan,
    Orange,
}

impl PursuerColor {
    pub const ROSTER: [PursuerColor; 4] = [
        PursuerColor::Red,
        PursuerColor::Pink,
        PursuerColor::Cyan,
        PursuerColor::Orange,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Pink => "pink",
            Self::Cyan => "cyan",
            Self::Orange => "orange",
        }
    }

    pub fn strategy(self) -> Strategy {
        Strategy::from_color_id(self.id())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Direct,
    Ambush,
    Erratic,
}

impl Strategy {
    pub fn from_color_id(color_id: &str) -> Self {
        match color_id {
            "pink" => Self::Ambush,
            "cyan" => Self::Erratic,
            _ => Self::Direct,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PursuerMode {
    Chasing,
    Vulnerable,
    Dead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Playing,
    LevelComplete,
    GameOver,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub row: i32,
    pub col: i32,
    pub dir: Direction,
    pub speed_ms: u64,
    pub on_board: bool,
    pub moving: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PursuerView {
    pub index: usize,
    pub color: PursuerColor,
    pub strategy: Strategy,
    pub row: i32,
    pub col: i32,
    pub dir: Direction,
    pub mode: PursuerMode,
    pub is_vulnerable: bool,
    pub is_dead: bool,
    pub speed_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectibleView {
    pub row: i32,
    pub col: i32,
    pub is_power: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    ScoreChanged {
        score: u32,
    },
    LevelChanged {
        level: u32,
    },
    CollectibleEaten {
        row: i32,
        col: i32,
        #[serde(rename = "isPower")]
        is_power: bool,
    },
    WinPending {
        level: u32,
    },
    LevelStarted {
        level: u32,
    },
    DoorsOpened,
    PursuerReleased {
        index: usize,
        #[serde(rename = "atMs")]
        at_ms: u64,
    },
    PursuersVulnerable,
    VulnerabilityEnded {
        index: usize,
    },
    PursuerEaten {
        index: usize,
    },
    PursuerRespawned {
        index: usize,
    },
    GameOver {
        score: u32,
        level: u32,
    },
    GameReset,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub now_ms: u64,
    pub phase: Phase,
    pub score: u32,
    pub level: u32,
    pub door_open: bool,
    pub player: PlayerView,
    pub pursuers: Vec<PursuerView>,
    pub collectibles: Vec<CollectibleView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub losses: u32,
    pub level_ups: u32,
    pub pursuers_eaten: u32,
    pub collectibles_eaten: u32,
    pub best_score: u32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldInit {
    pub rows: i32,
    pub cols: i32,
    pub tunnel_row: Option<i32>,
    pub tiles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_parsing_ignores_unknown_input() {
        assert_eq!(Intent::parse("up"), Some(Intent::Move(Direction::Up)));
        assert_eq!(Intent::parse("release"), Some(Intent::Release));
        assert_eq!(Intent::parse("none"), Some(Intent::Release));
        assert_eq!(Intent::parse("jump"), None);
    }

    #[test]
    fn roster_strategies_follow_color_ids() {
        let strategies: Vec<Strategy> = PursuerColor::ROSTER
            .iter()
            .map(|color| color.strategy())
            .collect();
        assert_eq!(
            strategies,
            vec![
                Strategy::Direct,
                Strategy::Ambush,
                Strategy::Erratic,
                Strategy::Direct
            ]
        );
        assert_eq!(Strategy::from_color_id("purple"), Strategy::Direct);
    }

    #[test]
    fn tags_combine_independently() {
        let tags = CellTags::default().with(Tag::Home).with(Tag::Tunnel);
        assert!(tags.contains(Tag::Home));
        assert!(tags.contains(Tag::Tunnel));
        assert!(!tags.contains(Tag::HomeDoor));
        assert!(CellTags::default().is_empty());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let raw = serde_json::to_string(&RuntimeEvent::CollectibleEaten {
            row: 1,
            col: 2,
            is_power: true,
        })
        .expect("event should serialize");
        assert_eq!(
            raw,
            r#"{"type":"collectible_eaten","row":1,"col":2,"isPower":true}"#
        );
    }
}
