pub mod bus;
pub mod element;
pub mod machine;
pub mod surface;


pub use bus::{BroadcastBus, BroadcastEvent, DeliveryReport, Subscription, SurfaceId};
pub use element::{MediaElement, PlayOutcome, PlaybackError};
pub use machine::{transition, Effect, PlaybackEvent, PlaybackPhase, ResumeFrom, Transition};
pub use surface::{ClickOutcome, SurfaceController, SurfaceOptions, SurfaceSnapshot};
