pub mod config;
pub mod media;

#[cfg(test)]
mod config_test;

pub use config::*;
pub use media::*;
