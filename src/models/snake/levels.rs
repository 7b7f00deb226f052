//! Fixed per-level board parameters.
use super::snake_game::STARTING_LENGTH;

/// Number of predefined levels. Requested levels are clamped to `1..=MAX_LEVEL`.
pub const MAX_LEVEL: u32 = 10;
/// Difficulty added per level on top of a factor of 1.
pub const DIFFICULTY_PER_LEVEL: f64 = 0.5;

/// `(food, enemies, obstacles, width, height)` for levels 1 through 10.
const LEVEL_TABLE: [(usize, usize, usize, usize, usize); MAX_LEVEL as usize] = [
    (4, 1, 0, 10, 10),
    (3, 2, 0, 10, 10),
    (3, 2, 3, 10, 10),
    (2, 2, 3, 10, 10),
    (6, 3, 5, 15, 15),
    (4, 4, 5, 15, 15),
    (3, 5, 5, 15, 15),
    (4, 3, 7, 20, 20),
    (4, 4, 7, 20, 20),
    (5, 5, 9, 25, 25),
];

/// Everything needed to build a [`super::snake_game::Board`].
#[derive(Clone, Debug, PartialEq)]
pub struct BoardParams {
    pub width: usize,
    pub height: usize,
    pub food: usize,
    pub obstacles: usize,
    pub enemies: usize,
    /// Column the player snake spawns in.
    pub start_column: usize,
    /// Enemy difficulty factor. Values below 1 are raised to 1.
    pub difficulty: f64,
    /// Seed for the board's random source. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl BoardParams {
    /// Explicit parameters for a board outside the level table.
    /// Enemies get the difficulty of the hardest level.
    #[must_use]
    pub fn new(
        width: usize,
        height: usize,
        food: usize,
        obstacles: usize,
        enemies: usize,
        start_column: usize,
    ) -> Self {
        Self {
            width,
            height,
            food,
            obstacles,
            enemies,
            start_column,
            difficulty: difficulty_for_level(MAX_LEVEL),
            seed: None,
        }
    }

    /// Parameters for `level`, clamped into the table.
    #[must_use]
    pub fn for_level(level: i64) -> Self {
        let level = clamp_level(level);
        let (food, enemies, obstacles, width, height) = LEVEL_TABLE[(level - 1) as usize];
        Self {
            width,
            height,
            food,
            obstacles,
            enemies,
            start_column: (width - 1) / 2,
            difficulty: difficulty_for_level(level),
            seed: None,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: f64) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Tiles taken by snakes when the board is created.
    #[must_use]
    pub fn snake_tiles(&self) -> usize {
        (self.enemies + 1) * STARTING_LENGTH
    }
}

#[must_use]
pub fn clamp_level(level: i64) -> u32 {
    u32::try_from(level.clamp(1, i64::from(MAX_LEVEL))).unwrap_or(1)
}

/// Strictly increasing in `level`.
#[must_use]
pub fn difficulty_for_level(level: u32) -> f64 {
    1.0 + f64::from(level) * DIFFICULTY_PER_LEVEL
}
