//! Tick scheduler for a snake board.
//!
//! The board lives on its own tokio task for the whole game. Only the player's direction and
//! the tick interval are shared with other threads, both as atomics, and renderers read finished
//! ticks through a [`watch`] channel.
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{debug, error, info};
use tokio::{sync::watch, task::JoinHandle};

use crate::models::snake::{
    snake_game::{self, Board, Direction, ScoreWeights, SnakeError, TickResult},
    snapshot::BoardSnapshot,
};

/// Interval between ticks unless changed.
pub const DEFAULT_TICK_MILLIS: u64 = 300;
pub const MIN_TICK_MILLIS: u64 = 200;
pub const MAX_TICK_MILLIS: u64 = 2000;
/// Speed slider values are subtracted from this to get an interval.
pub const SPEED_SLIDER_BASE: u64 = 2100;

/// How a game ended.
#[derive(Clone, Debug, PartialEq)]
pub enum GameOutcome {
    PlayerWon,
    PlayerLost,
    /// A tick failed with something other than a game result.
    Aborted(SnakeError),
    /// Stopped through [`GameControls::stop`] before anyone won.
    Stopped,
}

/// Passed to the completion listener when a game is won or lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameCompletion {
    pub player_died: bool,
    pub all_enemies_dead: bool,
}

#[derive(Clone, Debug)]
pub struct GameLoopConfig {
    pub tick_millis: u64,
    /// Top food back up after every tick.
    pub replenish_food: bool,
    pub score_weights: ScoreWeights,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            tick_millis: DEFAULT_TICK_MILLIS,
            replenish_food: false,
            score_weights: ScoreWeights::default(),
        }
    }
}

#[derive(Debug)]
struct SharedControls {
    direction: AtomicUsize,
    tick_millis: AtomicU64,
    running: AtomicBool,
}

/// Handle for the input side: steer the player, change speed, or stop the loop.
#[derive(Clone, Debug)]
pub struct GameControls {
    shared: Arc<SharedControls>,
}

impl GameControls {
    fn new(direction: Direction, tick_millis: u64) -> Self {
        Self {
            shared: Arc::new(SharedControls {
                direction: AtomicUsize::new(direction.index()),
                tick_millis: AtomicU64::new(clamp_tick_millis(tick_millis)),
                running: AtomicBool::new(true),
            }),
        }
    }

    /// Takes effect on the next tick.
    pub fn set_direction(&self, direction: Direction) {
        self.shared
            .direction
            .store(direction.index(), Ordering::SeqCst);
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        Direction::from_index(self.shared.direction.load(Ordering::SeqCst))
    }

    /// Sets the interval, clamped to [`MIN_TICK_MILLIS`]..=[`MAX_TICK_MILLIS`].
    pub fn set_tick_millis(&self, millis: u64) {
        let millis = clamp_tick_millis(millis);
        debug!("Tick interval set to {millis}ms");
        self.shared.tick_millis.store(millis, Ordering::SeqCst);
    }

    /// Maps a speed slider, where bigger is faster, onto the tick interval.
    pub fn set_speed(&self, slider: u64) {
        self.set_tick_millis(SPEED_SLIDER_BASE.saturating_sub(slider));
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.shared.tick_millis.load(Ordering::SeqCst))
    }

    /// Asks the loop to stop. Seen at the next tick boundary; a running tick always finishes.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }
}

#[must_use]
pub fn clamp_tick_millis(millis: u64) -> u64 {
    millis.clamp(MIN_TICK_MILLIS, MAX_TICK_MILLIS)
}

type CompletionListener = Box<dyn FnOnce(GameCompletion) + Send>;

/// Drives a [`Board`] one tick at a time until the player wins or loses.
pub struct GameLoop {
    board: Board,
    config: GameLoopConfig,
    controls: GameControls,
    snapshots: watch::Sender<BoardSnapshot>,
    listener: Option<CompletionListener>,
    tick: u64,
}

impl fmt::Debug for GameLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameLoop")
            .field("board", &self.board)
            .field("config", &self.config)
            .field("controls", &self.controls)
            .field("has_listener", &self.listener.is_some())
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

impl GameLoop {
    /// Wraps `board`. The receiver yields a snapshot after every tick, starting with the
    /// untouched board.
    #[must_use]
    pub fn new(board: Board, config: GameLoopConfig) -> (Self, watch::Receiver<BoardSnapshot>) {
        let controls = GameControls::new(Direction::Up, config.tick_millis);
        let (snapshots, receiver) = watch::channel(board.snapshot(0, config.score_weights));
        (
            Self {
                board,
                config,
                controls,
                snapshots,
                listener: None,
                tick: 0,
            },
            receiver,
        )
    }

    #[must_use]
    pub fn controls(&self) -> GameControls {
        self.controls.clone()
    }

    /// Called once, on the loop's task, when the game is won or lost. Hand anything
    /// UI-related off to the UI thread from here.
    pub fn set_completion_listener<F>(&mut self, listener: F)
    where
        F: FnOnce(GameCompletion) + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Runs a single tick with the current direction and publishes the result.
    /// Returns the outcome if the game is over.
    pub fn tick(&mut self) -> Option<GameOutcome> {
        let direction = self.controls.direction();
        let result = self.board.advance_tick(direction);
        self.resolve_tick(result)
    }

    /// Counts and publishes a tick the board has just run.
    fn resolve_tick(&mut self, result: snake_game::Result<TickResult>) -> Option<GameOutcome> {
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                error!("Tick {} failed: {e}", self.tick + 1);
                return Some(GameOutcome::Aborted(e));
            }
        };
        self.tick += 1;
        if self.config.replenish_food && result.player_move_ok {
            if let Err(e) = self.board.replenish_food() {
                error!("Food top-up failed on tick {}: {e}", self.tick);
                return Some(GameOutcome::Aborted(e));
            }
        }
        self.snapshots
            .send_replace(self.board.snapshot(self.tick, self.config.score_weights));

        if !result.player_move_ok {
            Some(GameOutcome::PlayerLost)
        } else if self.board.all_enemies_dead() {
            Some(GameOutcome::PlayerWon)
        } else {
            None
        }
    }

    /// Sleeps, ticks, repeats until the game ends or is stopped.
    pub async fn run(mut self) -> GameOutcome {
        info!("Game loop started");
        loop {
            if !self.controls.is_running() {
                return self.finish(GameOutcome::Stopped);
            }
            tokio::time::sleep(self.controls.tick_interval()).await;
            if !self.controls.is_running() {
                return self.finish(GameOutcome::Stopped);
            }
            if let Some(outcome) = self.tick() {
                return self.finish(outcome);
            }
        }
    }

    /// Runs the loop on its own tokio task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<GameOutcome> {
        tokio::spawn(self.run())
    }

    fn finish(&mut self, outcome: GameOutcome) -> GameOutcome {
        self.controls.stop();
        info!("Game over after {} ticks: {:?}", self.tick, outcome);
        if matches!(outcome, GameOutcome::PlayerWon | GameOutcome::PlayerLost) {
            if let Some(listener) = self.listener.take() {
                listener(GameCompletion {
                    player_died: !self.board.is_player_alive(),
                    all_enemies_dead: self.board.all_enemies_dead(),
                });
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::models::snake::{levels::BoardParams, snake_player::SnakeController, tile::TileKind};

    fn game(params: BoardParams) -> (GameLoop, watch::Receiver<BoardSnapshot>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let board = Board::from_params(params.with_seed(7)).unwrap();
        GameLoop::new(board, GameLoopConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn no_enemies_wins_on_first_tick() {
        let (mut game, snapshots) = game(BoardParams::new(8, 8, 0, 0, 0, 3));
        let (sender, receiver) = mpsc::channel();
        game.set_completion_listener(move |c| sender.send(c).unwrap());
        let start = tokio::time::Instant::now();

        let outcome = game.spawn().await.unwrap();

        assert_eq!(outcome, GameOutcome::PlayerWon);
        assert!(start.elapsed() >= Duration::from_millis(DEFAULT_TICK_MILLIS));
        assert_eq!(
            receiver.recv().unwrap(),
            GameCompletion {
                player_died: false,
                all_enemies_dead: true
            }
        );
        assert!(receiver.try_recv().is_err());
        assert_eq!(snapshots.borrow().tick, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn heading_off_the_board_loses_on_first_tick() {
        let (mut game, snapshots) = game(BoardParams::new(4, 5, 0, 0, 0, 1));
        let (sender, receiver) = mpsc::channel();
        game.set_completion_listener(move |c| sender.send(c).unwrap());

        assert_eq!(game.spawn().await.unwrap(), GameOutcome::PlayerLost);
        let completion = receiver.recv().unwrap();
        assert!(completion.player_died);
        // the corpse is still drawn on the tick the player died
        let last = snapshots.borrow();
        assert_eq!(last.tick, 1);
        assert_eq!(last.count(TileKind::PlayerBody), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_skips_the_listener() {
        let (mut game, _snapshots) = game(BoardParams::for_level(1));
        let (sender, receiver) = mpsc::channel();
        game.set_completion_listener(move |c| sender.send(c).unwrap());
        let controls = game.controls();
        controls.stop();

        assert_eq!(game.spawn().await.unwrap(), GameOutcome::Stopped);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn direction_changes_apply_on_the_next_tick() {
        let (mut game, snapshots) = game(BoardParams::for_level(1));
        let controls = game.controls();
        assert_eq!(controls.direction(), Direction::Up);
        controls.set_direction(Direction::Right);

        assert_eq!(game.tick(), None);
        assert_eq!(game.board().player().snake().head(), Some((5, 4)));
        assert_eq!(snapshots.borrow().tick, 1);
        assert_eq!(game.ticks(), 1);
    }

    #[test]
    fn tick_interval_is_clamped() {
        let (game, _snapshots) = game(BoardParams::for_level(1));
        let controls = game.controls();
        assert_eq!(
            controls.tick_interval(),
            Duration::from_millis(DEFAULT_TICK_MILLIS)
        );
        controls.set_tick_millis(5_000);
        assert_eq!(controls.tick_interval(), Duration::from_millis(MAX_TICK_MILLIS));
        controls.set_tick_millis(10);
        assert_eq!(controls.tick_interval(), Duration::from_millis(MIN_TICK_MILLIS));
        controls.set_speed(1_100);
        assert_eq!(controls.tick_interval(), Duration::from_millis(1_000));
        controls.set_speed(2_100);
        assert_eq!(controls.tick_interval(), Duration::from_millis(MIN_TICK_MILLIS));
    }

    #[test]
    fn failed_tick_aborts_without_the_listener() {
        let (mut game, snapshots) = game(BoardParams::for_level(1));
        let (sender, receiver) = mpsc::channel();
        game.set_completion_listener(move |c| sender.send(c).unwrap());
        let err = SnakeError::IllegalPlacement {
            x: 4,
            y: 5,
            from: TileKind::Obstacle,
            to: TileKind::PlayerBody,
        };

        let outcome = game.resolve_tick(Err(err.clone())).unwrap();
        assert_eq!(outcome, GameOutcome::Aborted(err.clone()));
        assert_eq!(game.finish(outcome), GameOutcome::Aborted(err));
        assert!(receiver.try_recv().is_err());
        assert!(!game.controls().is_running());
        // nothing was published for the failed tick
        assert_eq!(game.ticks(), 0);
        assert!(!snapshots.has_changed().unwrap());
    }

    #[test]
    fn replenishing_keeps_food_at_target() {
        let _ = env_logger::builder().is_test(true).try_init();
        let board = Board::from_params(BoardParams::new(1, 9, 3, 0, 0, 0).with_seed(3)).unwrap();
        let config = GameLoopConfig {
            replenish_food: true,
            ..GameLoopConfig::default()
        };
        let (mut game, snapshots) = GameLoop::new(board, config);
        // no enemies, so the first tick already wins
        assert_eq!(game.tick(), Some(GameOutcome::PlayerWon));
        assert_eq!(snapshots.borrow().count(TileKind::Food), 3);
    }
}
