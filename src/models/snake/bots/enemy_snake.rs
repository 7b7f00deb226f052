//! Self-steering enemy snake: scores the four directions, then rolls for one.
use std::collections::HashSet;

use log::{debug, warn};
use rand::{rngs::StdRng, Rng};

use super::kill_geometry::detect_kill;
use crate::models::snake::{
    grid::Grid,
    snake_game::{Direction, Result, SnakeError},
    snake_player::{Snake, SnakeController},
    tile::{Position, TileKind},
};

/// Score every direction starts with before pruning and scaling.
pub const BASE_SCORE: f64 = 50.0;
/// Multiplier that makes a kill move all but certain.
pub const KILL_WEIGHT: f64 = 100_000.0;
/// How many tiles ahead foraging looks.
pub const SIGHT: usize = 2;

/// Scores indexed by [`Direction::index`].
pub type MoveScores = [f64; 4];

/// What the snake owes itself on its next tick after a kill attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KillState {
    Neutral,
    /// A kill was committed last tick. `Some` holds the second leg, `None` means the
    /// maneuver was a single move and this tick just forages.
    FollowUp(Option<Direction>),
}

#[derive(Clone, Debug)]
pub struct EnemySnake {
    id: usize,
    snake: Snake,
    difficulty: f64,
    kill_state: KillState,
    rng: StdRng,
}

impl EnemySnake {
    /// `difficulty` below 1 is raised to 1 so that food never repels and danger never attracts.
    #[must_use]
    pub fn new(id: usize, snake: Snake, difficulty: f64, rng: StdRng) -> Self {
        Self {
            id,
            snake,
            difficulty: difficulty.max(1.0),
            kill_state: KillState::Neutral,
            rng,
        }
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    #[must_use]
    pub fn kill_state(&self) -> KillState {
        self.kill_state
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.snake.is_alive()
    }

    /// Equal scores for every move that neither reverses nor leaves the grid.
    fn legal_scores(&self, grid: &Grid, head: Position, facing: Direction) -> MoveScores {
        let mut scores = [BASE_SCORE; 4];
        for direction in Direction::VARIANTS {
            if direction == facing.opposite() || grid.step(head, direction).is_none() {
                scores[direction.index()] = 0.0;
            }
        }
        scores
    }

    /// Looks up to [`SIGHT`] tiles down every open direction. Food multiplies the score by the
    /// difficulty, anything solid divides it and ends the look.
    fn forage(&self, grid: &Grid, head: Position, scores: &mut MoveScores) {
        for direction in Direction::VARIANTS {
            let score = &mut scores[direction.index()];
            if *score <= 0.0 {
                continue;
            }
            let mut pos = head;
            for _ in 0..SIGHT {
                let Some(next) = grid.step(pos, direction) else {
                    break;
                };
                match grid.kind_at(next) {
                    Some(TileKind::Food) => *score *= self.difficulty,
                    Some(TileKind::Empty) | None => {}
                    Some(_) => {
                        *score /= self.difficulty;
                        break;
                    }
                }
                pos = next;
            }
        }
    }

    /// Rolls `{decline: 50 / difficulty, commit: 50 * difficulty}`.
    fn commits_to_kill(&mut self) -> bool {
        let decline = BASE_SCORE / self.difficulty;
        let commit = BASE_SCORE * self.difficulty;
        self.rng.gen::<f64>() * (decline + commit) < commit
    }

    /// Full score vector for this tick. Updates the kill state as a side effect.
    fn score_moves(
        &mut self,
        grid: &Grid,
        head: Position,
        facing: Direction,
        other_heads: &HashSet<Position>,
    ) -> MoveScores {
        let mut scores = self.legal_scores(grid, head, facing);
        match std::mem::replace(&mut self.kill_state, KillState::Neutral) {
            KillState::FollowUp(Some(second)) => {
                debug!("Enemy {} finishing kill with {:?}", self.id, second);
                scores[second.index()] *= KILL_WEIGHT;
            }
            KillState::FollowUp(None) => self.forage(grid, head, &mut scores),
            KillState::Neutral => match detect_kill(grid, head, facing, other_heads) {
                Some(plan) if self.commits_to_kill() => {
                    debug!(
                        "Enemy {} committing to kill state {} via {:?} then {:?}",
                        self.id, plan.state, plan.first, plan.second
                    );
                    scores[plan.first.index()] *= KILL_WEIGHT;
                    self.kill_state = KillState::FollowUp(plan.second);
                }
                Some(_) | None => self.forage(grid, head, &mut scores),
            },
        }
        scores
    }
}

/// Picks an index with probability proportional to its score.
///
/// Returns `None` when nothing has a positive score.
pub fn weighted_index<R: Rng>(scores: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = scores.iter().filter(|s| s.is_finite() && **s > 0.0).sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    let draw = rng.gen::<f64>() * 100.0;
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (i, score) in scores.iter().enumerate() {
        if !score.is_finite() || *score <= 0.0 {
            continue;
        }
        cumulative += score / total * 100.0;
        last_positive = Some(i);
        if draw < cumulative {
            return Some(i);
        }
    }
    // rounding can leave the cumulative a hair under 100
    last_positive
}

impl SnakeController for EnemySnake {
    /// Heads of every other living snake.
    type Input = HashSet<Position>;

    fn snake(&self) -> &Snake {
        &self.snake
    }

    fn snake_mut(&mut self) -> &mut Snake {
        &mut self.snake
    }

    fn choose_direction(&mut self, grid: &Grid, other_heads: HashSet<Position>) -> Result<Direction> {
        let (Some(head), Some(facing)) = (self.snake.head(), self.snake.facing()) else {
            return Err(SnakeError::NoLegalMove { snake: self.id });
        };
        let scores = self.score_moves(grid, head, facing, &other_heads);
        match weighted_index(&scores, &mut self.rng) {
            Some(i) => Ok(Direction::from_index(i)),
            None => {
                warn!("Enemy {} has no legal move from {:?}", self.id, head);
                Err(SnakeError::NoLegalMove { snake: self.id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::models::snake::{
        snake_game::STARTING_LENGTH,
        snake_player::{DeathCause, MoveOutcome},
    };

    fn enemy_on(grid: &mut Grid, column: usize, difficulty: f64, seed: u64) -> EnemySnake {
        let snake = Snake::spawn(
            grid,
            column,
            STARTING_LENGTH,
            Direction::Up,
            TileKind::EnemyBody,
        )
        .unwrap();
        EnemySnake::new(0, snake, difficulty, StdRng::seed_from_u64(seed))
    }

    #[test]
    fn weighted_index_skips_zero_scores() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(weighted_index(&[0.0, 0.0, 3.0, 0.0], &mut rng), Some(2));
        }
        assert_eq!(weighted_index(&[0.0; 4], &mut rng), None);
    }

    #[test]
    fn weighted_index_follows_weights() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut counts = [0usize; 2];
        for _ in 0..10_000 {
            counts[weighted_index(&[1.0, 3.0], &mut rng).unwrap()] += 1;
        }
        assert!(counts[1] > counts[0] * 2);
        assert!(counts[0] > 1_000);
    }

    #[test]
    fn reverse_and_edges_are_pruned() {
        let mut grid = Grid::new(6, 10);
        let enemy = enemy_on(&mut grid, 0, 2.0, 1);
        let scores = enemy.legal_scores(&grid, (0, 4), Direction::Up);
        let open: Vec<bool> = scores.iter().map(|s| *s > 0.0).collect();
        assert_eq!(open, [true, true, false, false]);
        assert!((scores[Direction::Up.index()] - BASE_SCORE).abs() < 1e-9);
    }

    #[test]
    fn forage_likes_food_and_fears_walls() {
        let mut grid = Grid::new(9, 10);
        let enemy = enemy_on(&mut grid, 4, 2.0, 1);
        grid.occupy((4, 6), TileKind::Food).unwrap();
        grid.occupy((5, 4), TileKind::Obstacle).unwrap();
        grid.occupy((2, 4), TileKind::Food).unwrap();
        let mut scores = enemy.legal_scores(&grid, (4, 4), Direction::Up);
        enemy.forage(&grid, (4, 4), &mut scores);
        assert!((scores[Direction::Up.index()] - BASE_SCORE * 2.0).abs() < 1e-9);
        assert!((scores[Direction::Right.index()] - BASE_SCORE / 2.0).abs() < 1e-9);
        assert!(scores[Direction::Down.index()].abs() < 1e-9);
        assert!((scores[Direction::Left.index()] - BASE_SCORE * 2.0).abs() < 1e-9);
    }

    #[test]
    fn food_stacks_but_danger_stops_the_look() {
        let mut grid = Grid::new(9, 10);
        let enemy = enemy_on(&mut grid, 4, 3.0, 1);
        grid.occupy((4, 5), TileKind::Food).unwrap();
        grid.occupy((4, 6), TileKind::Obstacle).unwrap();
        grid.occupy((5, 4), TileKind::Obstacle).unwrap();
        grid.occupy((6, 4), TileKind::Food).unwrap();
        let mut scores = enemy.legal_scores(&grid, (4, 4), Direction::Up);
        enemy.forage(&grid, (4, 4), &mut scores);
        assert!((scores[Direction::Up.index()] - BASE_SCORE).abs() < 1e-9);
        assert!((scores[Direction::Right.index()] - BASE_SCORE / 3.0).abs() < 1e-9);
    }

    #[test]
    fn boxed_in_enemy_dies_and_leaves_a_corpse() {
        let mut grid = Grid::new(3, 6);
        let mut enemy = enemy_on(&mut grid, 0, 2.0, 3);
        grid.occupy((0, 5), TileKind::Obstacle).unwrap();
        grid.occupy((1, 4), TileKind::Obstacle).unwrap();
        let outcome = enemy.take_turn(&mut grid, HashSet::new()).unwrap();
        // up and right are open on the board but both lead into obstacles
        assert!(matches!(
            outcome,
            MoveOutcome::Died(DeathCause::Collision(TileKind::Obstacle))
        ));
        assert_eq!(grid.count(TileKind::EnemyBody), STARTING_LENGTH);
        assert_eq!(
            enemy.take_turn(&mut grid, HashSet::new()).unwrap(),
            MoveOutcome::CorpseCleared
        );
        assert_eq!(grid.count(TileKind::EnemyBody), 0);
    }

    #[test]
    fn no_legal_move_is_death() {
        // one column, already at the top: up leaves the grid and down is a reversal
        let mut grid = Grid::new(1, STARTING_LENGTH);
        let mut enemy = enemy_on(&mut grid, 0, 2.0, 5);
        assert_eq!(
            enemy.take_turn(&mut grid, HashSet::new()).unwrap(),
            MoveOutcome::Died(DeathCause::NoLegalMove)
        );
        assert!(!enemy.is_alive());
        assert_eq!(grid.count(TileKind::EnemyBody), STARTING_LENGTH);
    }

    #[test]
    fn committed_kill_takes_both_legs() {
        // huge difficulty makes committing a near certainty
        let mut grid = Grid::new(10, 12);
        let mut enemy = enemy_on(&mut grid, 5, 1_000.0, 9);
        let target = HashSet::from([(3, 4)]);

        let first = enemy.take_turn(&mut grid, target).unwrap();
        assert_eq!(first, MoveOutcome::Moved);
        assert_eq!(enemy.snake().head(), Some((5, 5)));
        assert_eq!(enemy.kill_state(), KillState::FollowUp(Some(Direction::Left)));

        let second = enemy.take_turn(&mut grid, HashSet::new()).unwrap();
        assert_eq!(second, MoveOutcome::Moved);
        assert_eq!(enemy.snake().head(), Some((4, 5)));
        assert_eq!(enemy.kill_state(), KillState::Neutral);
    }

    #[test]
    fn even_odds_kill_either_declines_or_takes_one_move() {
        let mut declined = 0;
        let mut committed = 0;
        for seed in 0..64 {
            let mut grid = Grid::new(10, 12);
            let mut enemy = enemy_on(&mut grid, 5, 1.0, seed);
            // two to the left and two back from the head at (5, 4)
            let target = HashSet::from([(3, 2)]);
            assert_eq!(
                enemy.take_turn(&mut grid, target).unwrap(),
                MoveOutcome::Moved
            );
            match enemy.kill_state() {
                KillState::Neutral => declined += 1,
                KillState::FollowUp(None) => {
                    committed += 1;
                    assert_eq!(enemy.snake().head(), Some((4, 4)));
                    assert_eq!(enemy.snake().facing(), Some(Direction::Left));
                    // facing left, (4, 2) is two to the left; a fresh look would often commit
                    let bait = HashSet::from([(4, 2)]);
                    assert_eq!(
                        enemy.take_turn(&mut grid, bait).unwrap(),
                        MoveOutcome::Moved
                    );
                    assert_eq!(enemy.kill_state(), KillState::Neutral);
                }
                KillState::FollowUp(Some(second)) => {
                    panic!("single-move pattern owed a second leg {second:?}")
                }
            }
        }
        assert!(declined > 0);
        assert!(committed > 0);
    }

    #[test]
    fn eating_is_tracked() {
        let mut grid = Grid::new(1, STARTING_LENGTH + 1);
        let mut enemy = enemy_on(&mut grid, 0, 2.0, 5);
        grid.occupy((0, STARTING_LENGTH), TileKind::Food).unwrap();
        assert_eq!(
            enemy.take_turn(&mut grid, HashSet::new()).unwrap(),
            MoveOutcome::Grew
        );
        assert_eq!(enemy.snake().food_eaten(), 1);
        assert_eq!(enemy.snake().len(), STARTING_LENGTH + 1);
    }
}
