/// Errors a media element can report back to its surface.
///
/// None of these are fatal: every one of them degrades the surface to muted,
/// looping playback or leaves the affected card static.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    #[error("autoplay policy rejected playback: {0}")]
    AutoplayRejected(String),
    #[error("media at {url} failed to load: {reason}")]
    LoadFailed { url: String, reason: String },
    #[error("media element is no longer attached")]
    Detached,
}

/// Result of asking an element to start playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Playback began before `play` returned.
    Started,
    /// The host settles the request later through `SurfaceController::resolve_play`.
    Pending,
}

/// Host-side handle to one playable video.
///
/// Surfaces only call these methods on video items, and only from inside the
/// state-machine effects or the neighbour/hidden sync.
pub trait MediaElement: Send {
    fn set_muted(&mut self, muted: bool);

    fn set_looping(&mut self, looping: bool);

    fn seek_to_start(&mut self);

    fn play(&mut self) -> Result<PlayOutcome, PlaybackError>;

    fn pause(&mut self);
}

