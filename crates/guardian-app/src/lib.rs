pub mod cli;
pub mod game_loop;
pub mod state;

pub use guardian_core as core;
