use std::io::BufRead;

use log::{debug, error, info};
use snakearena::{
    models::snake::snake_game::{Board, Direction},
    view_models::snake::game_loop::{GameControls, GameLoop, GameLoopConfig},
};

/// Step applied to the tick interval by `+` and `-`.
const SPEED_STEP_MILLIS: u64 = 100;

/// Reads keys from stdin until the game stops: `wasd` steer, `+`/`-` change speed, `q` quits.
fn read_input(controls: &GameControls) {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        for key in line.chars() {
            match key {
                'w' => controls.set_direction(Direction::Up),
                'a' => controls.set_direction(Direction::Left),
                's' => controls.set_direction(Direction::Down),
                'd' => controls.set_direction(Direction::Right),
                '+' => {
                    let millis = u64::try_from(controls.tick_interval().as_millis()).unwrap_or(0);
                    controls.set_tick_millis(millis.saturating_sub(SPEED_STEP_MILLIS));
                }
                '-' => {
                    let millis = u64::try_from(controls.tick_interval().as_millis()).unwrap_or(0);
                    controls.set_tick_millis(millis + SPEED_STEP_MILLIS);
                }
                'q' => controls.stop(),
                _ => debug!("Ignoring key {key:?}"),
            }
        }
        if !controls.is_running() {
            break;
        }
    }
}

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "snakearena=info");
    }
    env_logger::init();
    debug!("Debug on");

    let level = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<i64>().ok())
        .unwrap_or(1);
    let board = match Board::for_level(level) {
        Ok(board) => board,
        Err(e) => {
            error!("Could not build level {level}: {e}");
            return;
        }
    };

    let (mut game, mut snapshots) = GameLoop::new(board, GameLoopConfig::default());
    let (done_sender, done_receiver) = tokio::sync::oneshot::channel();
    game.set_completion_listener(move |completion| {
        if done_sender.send(completion).is_err() {
            error!("Nobody is waiting for the game result");
        }
    });

    let controls = game.controls();
    std::thread::spawn(move || read_input(&controls));

    let renderer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            info!(
                "Tick {} | score {} | size {} | kills {}\n{}",
                snapshot.tick,
                snapshot.score,
                snapshot.snake_length,
                snapshot.enemies_killed,
                snapshot
            );
        }
    });

    match game.spawn().await {
        Ok(outcome) => info!("Game finished: {outcome:?}"),
        Err(e) => error!("Game loop task failed: {e}"),
    }
    if let Ok(completion) = done_receiver.await {
        info!(
            "Player died: {}, all enemies dead: {}",
            completion.player_died, completion.all_enemies_dead
        );
    }
    if let Err(e) = renderer.await {
        error!("Renderer task failed: {e}");
    }
}
