pub mod simulated_player;

pub use simulated_player::*;
