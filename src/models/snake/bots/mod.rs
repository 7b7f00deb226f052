pub mod enemy_snake;
pub mod kill_geometry;
