use crate::types::Position;

pub(super) fn euclidean(a: Position, b: Position) -> f64 {
    let dr = f64::from(a.row - b.row);
    let dc = f64::from(a.col - b.col);
    (dr * dr + dc * dc).sqrt()
}
