use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout is empty")]
    Empty,
    #[error("layout must be at least 3x3, got {rows}x{cols}")]
    TooSmall { rows: usize, cols: usize },
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown layout symbol {symbol:?} at ({row},{col})")]
    UnknownSymbol { symbol: char, row: usize, col: usize },
    #[error("unknown cell code {code} at ({row},{col})")]
    UnknownCode { code: u8, row: usize, col: usize },
    #[error("layout needs exactly one player spawn, found {0}")]
    PlayerSpawn(usize),
    #[error("layout has no home door")]
    MissingDoor,
    #[error("pursuer home {0} is missing")]
    MissingPursuerHome(usize),
    #[error("pursuer home {0} is declared more than once")]
    DuplicatePursuerHome(usize),
    #[error("zone cell ({row},{col}) is {reason}")]
    InvalidZone {
        row: i32,
        col: i32,
        reason: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}
