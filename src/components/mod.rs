pub mod ladder;
pub mod ladder_grid;
