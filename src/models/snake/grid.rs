//! Flat arena of [`Tile`]s. Snakes only ever hold [`Position`]s into it.
use super::{
    snake_game::{Direction, Result, SnakeError},
    tile::{Position, Tile, TileKind},
};

#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a `width` x `height` grid of empty tiles.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let mut tiles = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::new(x, y));
            }
        }
        Self {
            width,
            height,
            tiles,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.0 < self.width && pos.1 < self.height {
            Some(pos.1 * self.width + pos.0)
        } else {
            None
        }
    }

    /// Converts signed coordinates into a position on the grid, if there is one.
    #[must_use]
    pub fn checked_position(&self, x: isize, y: isize) -> Option<Position> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.index((x, y)).map(|_| (x, y))
    }

    #[must_use]
    pub fn is_in_bounds(&self, x: isize, y: isize) -> bool {
        self.checked_position(x, y).is_some()
    }

    #[must_use]
    pub fn tile_at(&self, x: isize, y: isize) -> Option<&Tile> {
        let pos = self.checked_position(x, y)?;
        self.tile(pos)
    }

    #[must_use]
    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    /// Kind of the tile at `pos`, or `None` off the grid.
    #[must_use]
    pub fn kind_at(&self, pos: Position) -> Option<TileKind> {
        self.tile(pos).map(Tile::kind)
    }

    /// The position one step from `pos` in `direction`, or `None` if that leaves the grid.
    #[must_use]
    pub fn step(&self, pos: Position, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.delta();
        let x = isize::try_from(pos.0).ok()? + dx;
        let y = isize::try_from(pos.1).ok()? + dy;
        self.checked_position(x, y)
    }

    /// Places `kind` on the tile at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`SnakeError::IllegalPlacement`] when the tile's current
    /// occupant cannot be replaced, or when `pos` is off the grid.
    pub fn occupy(&mut self, pos: Position, kind: TileKind) -> Result<()> {
        match self.index(pos) {
            Some(i) => self.tiles[i].occupy(kind),
            None => Err(SnakeError::IllegalPlacement {
                x: pos.0,
                y: pos.1,
                from: TileKind::Empty,
                to: kind,
            }),
        }
    }

    pub fn clear(&mut self, pos: Position) {
        if let Some(i) = self.index(pos) {
            self.tiles[i].clear();
        }
    }

    #[must_use]
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|t| t.kind() == kind).count()
    }

    /// Positions of every tile currently holding `kind`, in row-major order.
    #[must_use]
    pub fn positions_of(&self, kind: TileKind) -> Vec<Position> {
        self.tiles
            .iter()
            .filter(|t| t.kind() == kind)
            .map(Tile::position)
            .collect()
    }

    /// Tile kinds in row-major order starting at `y = 0`.
    #[must_use]
    pub fn kinds(&self) -> Vec<TileKind> {
        self.tiles.iter().map(Tile::kind).collect()
    }
}
