pub mod game_loop;
