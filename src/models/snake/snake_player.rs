//! Module for the snake body shared by every player and the player-controlled snake.
use std::collections::VecDeque;

use log::debug;

use super::{
    grid::Grid,
    snake_game::{Direction, Result, SnakeError},
    tile::{Position, TileKind},
};

/// Where a snake is in its life. A snake that dies stays on the board for one more tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifeState {
    Alive,
    DyingThisTick,
    Cleared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathCause {
    OutOfBounds,
    Collision(TileKind),
    NoLegalMove,
}

/// Result of asking a snake to move for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Grew,
    Died(DeathCause),
    /// The corpse left by last tick's death was removed from the board.
    CorpseCleared,
    /// Nothing left to do.
    Idle,
}

impl MoveOutcome {
    #[must_use]
    pub fn survived(self) -> bool {
        matches!(self, MoveOutcome::Moved | MoveOutcome::Grew)
    }
}

/// Ordered body of a snake, head first, living inside a [`Grid`].
#[derive(Clone, Debug)]
pub struct Snake {
    body: VecDeque<Position>,
    facing: Direction,
    life: LifeState,
    kind: TileKind,
    food_eaten: usize,
}

impl Snake {
    /// Lays a snake of `length` tiles vertically in `column` with its tail on row 0,
    /// heading `facing`.
    ///
    /// # Errors
    ///
    /// Returns [`SnakeError::IllegalPlacement`] if any of those tiles is taken.
    pub fn spawn(
        grid: &mut Grid,
        column: usize,
        length: usize,
        facing: Direction,
        kind: TileKind,
    ) -> Result<Self> {
        let mut body = VecDeque::with_capacity(length + 1);
        for y in (0..length).rev() {
            grid.occupy((column, y), kind)?;
            body.push_back((column, y));
        }
        Ok(Self {
            body,
            facing,
            life: LifeState::Alive,
            kind,
            food_eaten: 0,
        })
    }

    #[must_use]
    pub fn body(&self) -> &VecDeque<Position> {
        &self.body
    }

    #[must_use]
    pub fn head(&self) -> Option<Position> {
        self.body.front().copied()
    }

    #[must_use]
    pub fn tail(&self) -> Option<Position> {
        self.body.back().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Current heading, or `None` once the snake has died.
    #[must_use]
    pub fn facing(&self) -> Option<Direction> {
        match self.life {
            LifeState::Alive => Some(self.facing),
            LifeState::DyingThisTick | LifeState::Cleared => None,
        }
    }

    #[must_use]
    pub fn life(&self) -> LifeState {
        self.life
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.life == LifeState::Alive
    }

    #[must_use]
    pub fn kind(&self) -> TileKind {
        self.kind
    }

    #[must_use]
    pub fn food_eaten(&self) -> usize {
        self.food_eaten
    }

    /// Marks the snake dead. Its body stays on the grid until its next move.
    pub fn kill(&mut self, cause: DeathCause) {
        if self.is_alive() {
            debug!("{:?} snake died at {:?}: {:?}", self.kind, self.head(), cause);
            self.life = LifeState::DyingThisTick;
        }
    }

    /// Handles a tick for a snake that is no longer alive.
    fn settle(&mut self, grid: &mut Grid) -> MoveOutcome {
        match self.life {
            LifeState::DyingThisTick => {
                for pos in self.body.drain(..) {
                    grid.clear(pos);
                }
                self.life = LifeState::Cleared;
                MoveOutcome::CorpseCleared
            }
            LifeState::Alive | LifeState::Cleared => MoveOutcome::Idle,
        }
    }

    /// Moves the head one tile in `direction`.
    ///
    /// Food grows the snake by one, an empty tile moves it, anything else (or the edge of the
    /// grid) kills it without touching any tile.
    ///
    /// # Errors
    ///
    /// Only [`SnakeError::IllegalPlacement`], which means the grid and the body disagree.
    pub fn advance(&mut self, grid: &mut Grid, direction: Direction) -> Result<MoveOutcome> {
        if !self.is_alive() {
            return Ok(self.settle(grid));
        }
        let Some(head) = self.head() else {
            self.life = LifeState::Cleared;
            return Ok(MoveOutcome::Idle);
        };
        let Some(next) = grid.step(head, direction) else {
            self.kill(DeathCause::OutOfBounds);
            return Ok(MoveOutcome::Died(DeathCause::OutOfBounds));
        };
        let outcome = match grid.kind_at(next) {
            Some(TileKind::Food) => {
                grid.occupy(next, self.kind)?;
                self.body.push_front(next);
                self.food_eaten += 1;
                MoveOutcome::Grew
            }
            Some(TileKind::Empty) => {
                if let Some(old_tail) = self.body.pop_back() {
                    grid.clear(old_tail);
                }
                grid.occupy(next, self.kind)?;
                self.body.push_front(next);
                MoveOutcome::Moved
            }
            Some(other) => {
                self.kill(DeathCause::Collision(other));
                return Ok(MoveOutcome::Died(DeathCause::Collision(other)));
            }
            None => {
                self.kill(DeathCause::OutOfBounds);
                return Ok(MoveOutcome::Died(DeathCause::OutOfBounds));
            }
        };
        self.facing = direction;
        Ok(outcome)
    }
}

/// Something that decides where a [`Snake`] goes each tick.
pub trait SnakeController {
    /// Whatever the controller needs from outside the grid to make its decision.
    type Input;

    fn snake(&self) -> &Snake;

    fn snake_mut(&mut self) -> &mut Snake;

    /// Picks the direction for this tick. Only called while the snake is alive.
    ///
    /// # Errors
    ///
    /// [`SnakeError::NoLegalMove`] when every direction is blocked.
    fn choose_direction(&mut self, grid: &Grid, input: Self::Input) -> Result<Direction>;

    /// Runs one tick for this snake.
    ///
    /// # Errors
    ///
    /// Propagates [`SnakeError::IllegalPlacement`]. Running out of moves kills the snake instead.
    fn take_turn(&mut self, grid: &mut Grid, input: Self::Input) -> Result<MoveOutcome> {
        if !self.snake().is_alive() {
            return Ok(self.snake_mut().settle(grid));
        }
        match self.choose_direction(grid, input) {
            Ok(direction) => self.snake_mut().advance(grid, direction),
            Err(SnakeError::NoLegalMove { .. }) => {
                self.snake_mut().kill(DeathCause::NoLegalMove);
                Ok(MoveOutcome::Died(DeathCause::NoLegalMove))
            }
            Err(e) => Err(e),
        }
    }
}

/// The snake steered by the user.
#[derive(Clone, Debug)]
pub struct PlayerSnake {
    snake: Snake,
}

impl PlayerSnake {
    #[must_use]
    pub fn new(snake: Snake) -> Self {
        Self { snake }
    }

    /// Moves towards `requested`, ignoring it if it would reverse the snake.
    /// Returns false if the snake is dead after the move.
    ///
    /// # Errors
    ///
    /// Propagates [`SnakeError::IllegalPlacement`].
    pub fn move_towards(&mut self, grid: &mut Grid, requested: Direction) -> Result<bool> {
        Ok(self.take_turn(grid, requested)?.survived())
    }
}

impl SnakeController for PlayerSnake {
    type Input = Direction;

    fn snake(&self) -> &Snake {
        &self.snake
    }

    fn snake_mut(&mut self) -> &mut Snake {
        &mut self.snake
    }

    fn choose_direction(&mut self, _grid: &Grid, requested: Direction) -> Result<Direction> {
        match self.snake.facing() {
            Some(current) if requested == current.opposite() => Ok(current),
            _ => Ok(requested),
        }
    }
}
