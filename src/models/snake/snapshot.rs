//! Render feed handed out once per finished tick.
use std::fmt;

use super::tile::{Position, TileKind};

/// Copy of a board after a tick has fully resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub tick: u64,
    pub width: usize,
    pub height: usize,
    /// Row-major from `y = 0`.
    pub tiles: Vec<TileKind>,
    pub score: usize,
    pub snake_length: usize,
    pub food_eaten: usize,
    pub enemies_killed: usize,
}

impl BoardSnapshot {
    #[must_use]
    pub fn kind_at(&self, pos: Position) -> Option<TileKind> {
        if pos.0 >= self.width || pos.1 >= self.height {
            return None;
        }
        self.tiles.get(pos.1 * self.width + pos.0).copied()
    }

    #[must_use]
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|k| **k == kind).count()
    }
}

/// Draws the board top row first, matching how it appears on screen.
impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let c = self.kind_at((x, y)).map_or('?', TileKind::as_char);
                write!(f, "{c}  ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::snake::{levels::BoardParams, snake_game::{Board, ScoreWeights}};

    #[test]
    fn renders_top_row_first() {
        let board = Board::from_params(BoardParams::new(2, 6, 1, 0, 0, 0).with_seed(1)).unwrap();
        let snapshot = board.snapshot(0, ScoreWeights::default());
        let text = snapshot.to_string();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 6);
        assert!(rows[5].starts_with("u  -") || rows[5].starts_with("u  f"));
        assert!(rows[1].starts_with('u'));
        assert_eq!(snapshot.count(TileKind::PlayerBody), 5);
        assert_eq!(snapshot.count(TileKind::Food), 1);
        assert_eq!(snapshot.kind_at((0, 4)), Some(TileKind::PlayerBody));
        assert_eq!(snapshot.kind_at((2, 0)), None);
    }
}
