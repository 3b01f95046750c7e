//! Single-audible-surface playback for cyclic card stacks.
//!
//! Every [`playback::SurfaceController`] shows a stack of media cards and
//! joins a [`playback::BroadcastBus`]. When one surface starts playing with
//! sound it announces itself and every other surface drops back to a muted
//! loop, so at most one surface is audible at a time.

pub mod core;
pub mod gui;
pub mod playback;
pub mod stack;
pub mod video;
