pub mod app;
pub mod card_stack_renderer;


pub use app::*;
pub use card_stack_renderer::{CardStackRenderer, StackInteraction};
