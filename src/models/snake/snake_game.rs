use std::collections::HashSet;

use log::{debug, info, warn};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use thiserror::Error;

use super::{
    bots::enemy_snake::EnemySnake,
    grid::Grid,
    levels::BoardParams,
    snake_player::{MoveOutcome, PlayerSnake, Snake, SnakeController},
    snapshot::BoardSnapshot,
    tile::{Position, Tile, TileKind},
};

/// Length every snake spawns with.
pub const STARTING_LENGTH: usize = 5;
/// Rows directly ahead of the spawn line kept free of obstacles.
pub const PROTECTED_ROWS: usize = 2;
/// Columns either side of the player's spawn column kept free of obstacles.
pub const PROTECTED_COLUMNS: usize = 1;

pub type Result<T> = std::result::Result<T, SnakeError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnakeError {
    /// A tile was asked to take an occupant it cannot hold. Always a logic error.
    #[error("illegal placement of {to:?} on {from:?} at ({x}, {y})")]
    IllegalPlacement {
        x: usize,
        y: usize,
        from: TileKind,
        to: TileKind,
    },
    #[error("board setup failed: {0}")]
    Setup(#[from] SetupError),
    /// Every direction is blocked for an enemy snake. Ends that snake, not the game.
    #[error("enemy snake {snake} has no legal move")]
    NoLegalMove { snake: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("a {width}x{height} board is too small to spawn a snake")]
    BoardTooSmall { width: usize, height: usize },
    #[error("spawn column {column} is outside a board {width} wide")]
    SpawnOutOfBounds { column: usize, width: usize },
    #[error("two snakes would spawn in column {column}")]
    SpawnOverlap { column: usize },
    #[error("{requested} tiles requested but only {available} available")]
    NotEnoughTiles { requested: usize, available: usize },
}

/// Heading of a snake. Variants are in clockwise order, which [`Direction::index`] follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const VARIANTS: [Direction; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// `(dx, dy)` of one step. `y` grows upwards.
    #[must_use]
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, 1),
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
        }
    }

    #[must_use]
    pub fn opposite(self) -> Direction {
        self.rotated_by(Direction::Down)
    }

    /// 0 for up through 3 for left, clockwise.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    /// Inverse of [`Direction::index`], wrapping modulo 4.
    #[must_use]
    pub fn from_index(index: usize) -> Direction {
        Self::VARIANTS[index % 4]
    }

    /// Turns a direction expressed relative to a snake facing up into one relative to `facing`.
    #[must_use]
    pub fn rotated_by(self, facing: Direction) -> Direction {
        Self::from_index(self.index() + facing.index())
    }
}

/// What happened during one call to [`Board::advance_tick`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickResult {
    /// False means the player died this tick.
    pub player_move_ok: bool,
    pub player_outcome: MoveOutcome,
    /// In spawn order.
    pub enemy_outcomes: Vec<MoveOutcome>,
}

/// Points per food eaten and per enemy killed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreWeights {
    pub food: usize,
    pub kill: usize,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { food: 50, kill: 50 }
    }
}

/// The whole simulation: the tile arena plus every snake on it.
#[derive(Clone, Debug)]
pub struct Board {
    grid: Grid,
    player: PlayerSnake,
    enemies: Vec<EnemySnake>,
    food_target: usize,
    obstacle_count: usize,
    enemies_killed: usize,
    player_alive: bool,
    rng: StdRng,
}

impl Board {
    /// Builds the board for `level`, clamped to the level table.
    ///
    /// # Errors
    ///
    /// See [`Board::from_params`].
    pub fn for_level(level: i64) -> Result<Self> {
        Self::from_params(BoardParams::for_level(level))
    }

    /// Builds a board: the player in `start_column`, enemies alternating in from the left
    /// and right edges, then obstacles, then food.
    ///
    /// # Errors
    ///
    /// Returns [`SnakeError::Setup`] if the snakes or obstacles do not fit. Food that does not fit
    /// is silently dropped.
    pub fn from_params(params: BoardParams) -> Result<Self> {
        debug!("New Board params: {:?}", params);
        let BoardParams {
            width,
            height,
            food,
            obstacles,
            enemies,
            start_column,
            difficulty,
            seed,
        } = params.clone();
        if width == 0 || height < STARTING_LENGTH {
            return Err(SetupError::BoardTooSmall { width, height }.into());
        }
        if start_column >= width {
            return Err(SetupError::SpawnOutOfBounds {
                column: start_column,
                width,
            }
            .into());
        }
        let requested = params.snake_tiles() + obstacles;
        if requested > width * height {
            return Err(SetupError::NotEnoughTiles {
                requested,
                available: width * height,
            }
            .into());
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut grid = Grid::new(width, height);

        let enemy_columns = (0..enemies)
            .map(|n| enemy_column(n, width))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut taken = HashSet::from([start_column]);
        for &column in &enemy_columns {
            if !taken.insert(column) {
                return Err(SetupError::SpawnOverlap { column }.into());
            }
        }

        let player = PlayerSnake::new(Snake::spawn(
            &mut grid,
            start_column,
            STARTING_LENGTH,
            Direction::Up,
            TileKind::PlayerBody,
        )?);
        let mut enemy_snakes = Vec::with_capacity(enemies);
        for (id, column) in enemy_columns.into_iter().enumerate() {
            let snake = Snake::spawn(
                &mut grid,
                column,
                STARTING_LENGTH,
                Direction::Up,
                TileKind::EnemyBody,
            )?;
            let enemy_rng = StdRng::seed_from_u64(rng.gen());
            enemy_snakes.push(EnemySnake::new(id, snake, difficulty, enemy_rng));
        }

        let mut board = Self {
            grid,
            player,
            enemies: enemy_snakes,
            food_target: food,
            obstacle_count: obstacles,
            enemies_killed: 0,
            player_alive: true,
            rng,
        };
        board.scatter_obstacles(start_column)?;
        for _ in 0..food {
            board.spawn_food()?;
        }
        info!(
            "Board {}x{} ready: {} enemies, {} obstacles, {} food",
            width,
            height,
            board.enemies.len(),
            board.grid.count(TileKind::Obstacle),
            board.grid.count(TileKind::Food)
        );
        Ok(board)
    }

    fn scatter_obstacles(&mut self, start_column: usize) -> Result<()> {
        if self.obstacle_count == 0 {
            return Ok(());
        }
        let protected_rows = STARTING_LENGTH..STARTING_LENGTH + PROTECTED_ROWS;
        let mut available: Vec<Position> = self
            .grid
            .positions_of(TileKind::Empty)
            .into_iter()
            .filter(|&(x, y)| {
                x.abs_diff(start_column) > PROTECTED_COLUMNS && !protected_rows.contains(&y)
            })
            .collect();
        if available.len() < self.obstacle_count {
            return Err(SetupError::NotEnoughTiles {
                requested: self.obstacle_count,
                available: available.len(),
            }
            .into());
        }
        available.shuffle(&mut self.rng);
        for &pos in available.iter().take(self.obstacle_count) {
            self.grid.occupy(pos, TileKind::Obstacle)?;
        }
        Ok(())
    }

    /// Drops one food on a random empty tile. Does nothing and returns false if there is none.
    fn spawn_food(&mut self) -> Result<bool> {
        let available = self.grid.positions_of(TileKind::Empty);
        let Some(&pos) = available.choose(&mut self.rng) else {
            warn!("No where left to place food");
            return Ok(false);
        };
        self.grid.occupy(pos, TileKind::Food)?;
        Ok(true)
    }

    /// Tops food back up to the board's target.
    ///
    /// # Errors
    ///
    /// Only [`SnakeError::IllegalPlacement`], which would mean the grid is inconsistent.
    pub fn replenish_food(&mut self) -> Result<()> {
        while self.grid.count(TileKind::Food) < self.food_target {
            if !self.spawn_food()? {
                break;
            }
        }
        Ok(())
    }

    /// Moves every enemy in spawn order, then the player.
    ///
    /// Snakes resolve one after another, so when two heads go for the same tile the earlier
    /// mover takes it and the later one dies on its body.
    ///
    /// # Errors
    ///
    /// Propagates [`SnakeError::IllegalPlacement`]. Deaths are reported in the [`TickResult`].
    pub fn advance_tick(&mut self, player_direction: Direction) -> Result<TickResult> {
        let mut enemy_outcomes = Vec::with_capacity(self.enemies.len());
        for i in 0..self.enemies.len() {
            let other_heads = self.other_heads(i);
            let outcome = self.enemies[i].take_turn(&mut self.grid, other_heads)?;
            enemy_outcomes.push(outcome);
        }
        self.enemies_killed = self.enemies.iter().filter(|e| !e.is_alive()).count();

        let player_outcome = self.player.take_turn(&mut self.grid, player_direction)?;
        let player_move_ok = player_outcome.survived();
        if !player_move_ok && self.player_alive {
            info!("Player died: {:?}", player_outcome);
        }
        self.player_alive = self.player.snake().is_alive();
        Ok(TickResult {
            player_move_ok,
            player_outcome,
            enemy_outcomes,
        })
    }

    /// Heads of every living snake other than enemy `enemy`.
    fn other_heads(&self, enemy: usize) -> HashSet<Position> {
        let own = self.enemies[enemy].snake().head();
        self.head_positions()
            .into_iter()
            .filter(|h| Some(*h) != own)
            .collect()
    }

    /// Heads of every living snake, player included.
    #[must_use]
    pub fn head_positions(&self) -> HashSet<Position> {
        std::iter::once(self.player.snake())
            .chain(self.enemies.iter().map(|e| e.snake()))
            .filter(|s| s.is_alive())
            .filter_map(Snake::head)
            .collect()
    }

    #[must_use]
    pub fn tile_at(&self, x: isize, y: isize) -> Option<&Tile> {
        self.grid.tile_at(x, y)
    }

    #[must_use]
    pub fn is_in_bounds(&self, x: isize, y: isize) -> bool {
        self.grid.is_in_bounds(x, y)
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    #[must_use]
    pub fn player(&self) -> &PlayerSnake {
        &self.player
    }

    #[must_use]
    pub fn enemies(&self) -> &[EnemySnake] {
        &self.enemies
    }

    #[must_use]
    pub fn food_target(&self) -> usize {
        self.food_target
    }

    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.obstacle_count
    }

    #[must_use]
    pub fn is_player_alive(&self) -> bool {
        self.player_alive
    }

    #[must_use]
    pub fn enemies_killed(&self) -> usize {
        self.enemies_killed
    }

    /// True when every enemy is dead, including when there never were any.
    #[must_use]
    pub fn all_enemies_dead(&self) -> bool {
        self.enemies.iter().all(|e| !e.is_alive())
    }

    #[must_use]
    pub fn player_length(&self) -> usize {
        self.player.snake().len()
    }

    /// Food the player has eaten, measured as growth past the starting length.
    #[must_use]
    pub fn food_eaten(&self) -> usize {
        self.player_length().saturating_sub(STARTING_LENGTH)
    }

    #[must_use]
    pub fn score(&self, weights: ScoreWeights) -> usize {
        self.food_eaten() * weights.food + self.enemies_killed * weights.kill
    }

    /// Read-only copy of the board for renderers.
    #[must_use]
    pub fn snapshot(&self, tick: u64, weights: ScoreWeights) -> BoardSnapshot {
        BoardSnapshot {
            tick,
            width: self.width(),
            height: self.height(),
            tiles: self.grid.kinds(),
            score: self.score(weights),
            snake_length: self.player_length(),
            food_eaten: self.food_eaten(),
            enemies_killed: self.enemies_killed,
        }
    }
}

/// Enemy `n` spawns at the left edge, the right edge, two in from the left, two in from the
/// right, and so on.
fn enemy_column(n: usize, width: usize) -> std::result::Result<usize, SetupError> {
    let inset = 2 * (n / 2);
    let column = if n % 2 == 0 {
        Some(inset)
    } else {
        (width - 1).checked_sub(inset)
    };
    match column {
        Some(c) if c < width => Ok(c),
        _ => Err(SetupError::SpawnOutOfBounds {
            column: inset,
            width,
        }),
    }
}
