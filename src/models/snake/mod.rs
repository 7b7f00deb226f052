//! The snake simulation: tiles, snakes, enemy AI and the board that ties them together.
pub mod bots;
pub mod grid;
pub mod levels;
pub mod snake_game;
pub mod snake_player;
pub mod snapshot;
pub mod tile;
