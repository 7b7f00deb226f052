//! A single cell of the board and the rules for what may move into it.
use std::fmt;

use log::error;

use super::snake_game::SnakeError;

/// Board coordinates as `(x, y)`. `y` grows upwards.
pub type Position = (usize, usize);

/// What currently occupies a [`Tile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    Empty,
    Food,
    Obstacle,
    PlayerBody,
    EnemyBody,
}

impl TileKind {
    /// Snake bodies may land on food (that is how eating works). Everything else needs an empty tile.
    #[must_use]
    pub fn can_replace(self, current: TileKind) -> bool {
        match self {
            TileKind::PlayerBody | TileKind::EnemyBody => {
                matches!(current, TileKind::Empty | TileKind::Food)
            }
            TileKind::Food | TileKind::Obstacle => matches!(current, TileKind::Empty),
            TileKind::Empty => true,
        }
    }

    #[must_use]
    pub fn is_snake(self) -> bool {
        matches!(self, TileKind::PlayerBody | TileKind::EnemyBody)
    }

    /// Character used by the text renderer.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            TileKind::Empty => '-',
            TileKind::Food => 'f',
            TileKind::Obstacle => 'o',
            TileKind::PlayerBody => 'u',
            TileKind::EnemyBody => 'e',
        }
    }
}

/// One grid cell. Tiles never move, only their kind changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    x: usize,
    y: usize,
    kind: TileKind,
}

impl Tile {
    #[must_use]
    pub fn new(x: usize, y: usize) -> Self {
        Self {
            x,
            y,
            kind: TileKind::Empty,
        }
    }

    /// Places `kind` on this tile.
    ///
    /// # Errors
    ///
    /// Returns [`SnakeError::IllegalPlacement`] if the current occupant may not be replaced by `kind`.
    pub fn occupy(&mut self, kind: TileKind) -> Result<(), SnakeError> {
        if !kind.can_replace(self.kind) {
            error!(
                "Illegal placement of {:?} on {:?} at ({}, {})",
                kind, self.kind, self.x, self.y
            );
            return Err(SnakeError::IllegalPlacement {
                x: self.x,
                y: self.y,
                from: self.kind,
                to: kind,
            });
        }
        self.kind = kind;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.kind = TileKind::Empty;
    }

    #[must_use]
    pub fn kind(&self) -> TileKind {
        self.kind
    }

    #[must_use]
    pub fn position(&self) -> Position {
        (self.x, self.y)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tile {{ kind: {:?}, x: {}, y: {} }}", self.kind, self.x, self.y)
    }
}
