use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use crate::core::AutoplayPolicy;
use crate::playback::{MediaElement, PlayOutcome, PlaybackError};

/// Seconds an unmuted play request stays pending, like a browser play promise.
pub const PLAY_REQUEST_LATENCY: f32 = 0.15;

/// Page-wide autoplay rules shared by every simulated video.
#[derive(Debug)]
pub struct PageEnvironment {
    policy: Mutex<AutoplayPolicy>,
    interacted: AtomicBool,
}

impl PageEnvironment {
    pub fn new(policy: AutoplayPolicy) -> Arc<Self> {
        Arc::new(Self {
            policy: Mutex::new(policy),
            interacted: AtomicBool::new(false),
        })
    }

    pub fn policy(&self) -> AutoplayPolicy {
        self.policy.lock().map(|p| *p).unwrap_or(AutoplayPolicy::BlockUnmuted)
    }

    pub fn set_policy(&self, policy: AutoplayPolicy) {
        if let Ok(mut current) = self.policy.lock() {
            *current = policy;
        }
    }

    /// Record a user gesture. Unmuted requests made after this count as user initiated.
    pub fn mark_interaction(&self) {
        self.interacted.store(true, Ordering::SeqCst);
    }

    fn allows_unmuted(&self) -> bool {
        match self.policy() {
            AutoplayPolicy::AllowAll => true,
            AutoplayPolicy::RequireGesture => self.interacted.load(Ordering::SeqCst),
            AutoplayPolicy::BlockUnmuted => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    remaining: f32,
    /// Policy verdict taken when the request was made.
    allowed: bool,
}

#[derive(Debug)]
struct SimulatedState {
    muted: bool,
    looping: bool,
    playing: bool,
    position: f32,
    duration: f32,
    pending_request: Option<PendingRequest>,
}

/// What happened to a simulated video during one tick.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    pub ended: bool,
    pub resolved: Option<Result<(), PlaybackError>>,
}

/// Render-side handle; the surface owns the matching [`SimulatedVideo`].
#[derive(Debug, Clone)]
pub struct SimulatedPlayerHandle {
    url: String,
    state: Arc<Mutex<SimulatedState>>,
    page: Arc<PageEnvironment>,
}

impl SimulatedPlayerHandle {
    /// Create a paused, muted video of `duration` seconds plus the element the surface drives.
    pub fn create(url: &str, duration: f32, page: &Arc<PageEnvironment>) -> (Self, SimulatedVideo) {
        let state = Arc::new(Mutex::new(SimulatedState {
            muted: true,
            looping: true,
            playing: false,
            position: 0.0,
            duration: duration.max(0.1),
            pending_request: None,
        }));
        let handle = Self {
            url: url.to_string(),
            state: Arc::clone(&state),
            page: Arc::clone(page),
        };
        (handle, SimulatedVideo { state, page: Arc::clone(page) })
    }

    /// Advance the clock by `dt` seconds.
    pub fn tick(&self, dt: f32) -> TickReport {
        let mut report = TickReport::default();
        let Ok(mut state) = self.state.lock() else {
            return report;
        };

        if let Some(request) = state.pending_request {
            let remaining = request.remaining - dt;
            if remaining > 0.0 {
                state.pending_request = Some(PendingRequest { remaining, ..request });
            } else {
                state.pending_request = None;
                if state.muted || request.allowed {
                    state.playing = true;
                    report.resolved = Some(Ok(()));
                } else {
                    state.playing = false;
                    log::debug!("Simulated autoplay policy refused {}", self.url);
                    report.resolved = Some(Err(PlaybackError::AutoplayRejected(format!(
                        "{:?} refused unmuted playback",
                        self.page.policy()
                    ))));
                }
            }
        }

        if state.playing {
            state.position += dt;
            if state.position >= state.duration {
                if state.looping {
                    state.position %= state.duration;
                } else {
                    state.position = state.duration;
                    state.playing = false;
                    report.ended = true;
                }
            }
        }

        report
    }

    pub fn progress(&self) -> f32 {
        self.state
            .lock()
            .map(|s| (s.position / s.duration).clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().map(|s| s.playing).unwrap_or(false)
    }

    pub fn is_muted(&self) -> bool {
        self.state.lock().map(|s| s.muted).unwrap_or(true)
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().map(|s| s.pending_request.is_some()).unwrap_or(false)
    }
}

/// [`MediaElement`] backed by a simulated clock.
pub struct SimulatedVideo {
    state: Arc<Mutex<SimulatedState>>,
    page: Arc<PageEnvironment>,
}

impl MediaElement for SimulatedVideo {
    fn set_muted(&mut self, muted: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.muted = muted;
        }
    }

    fn set_looping(&mut self, looping: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.looping = looping;
        }
    }

    fn seek_to_start(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.position = 0.0;
        }
    }

    fn play(&mut self) -> Result<PlayOutcome, PlaybackError> {
        let mut state = self.state.lock().map_err(|_| PlaybackError::Detached)?;
        if state.muted {
            state.pending_request = None;
            state.playing = true;
            Ok(PlayOutcome::Started)
        } else {
            state.pending_request = Some(PendingRequest {
                remaining: PLAY_REQUEST_LATENCY,
                allowed: self.page.allows_unmuted(),
            });
            Ok(PlayOutcome::Pending)
        }
    }

    fn pause(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.playing = false;
            state.pending_request = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_play_starts_immediately() {
        let page = PageEnvironment::new(AutoplayPolicy::BlockUnmuted);
        let (handle, mut video) = SimulatedPlayerHandle::create("a.mp4", 2.0, &page);

        assert_eq!(video.play(), Ok(PlayOutcome::Started));
        assert!(handle.is_playing());
        assert!(handle.is_muted());
    }

    #[test]
    fn test_unmuted_play_resolves_after_latency() {
        let page = PageEnvironment::new(AutoplayPolicy::AllowAll);
        let (handle, mut video) = SimulatedPlayerHandle::create("a.mp4", 2.0, &page);

        video.set_muted(false);
        assert_eq!(video.play(), Ok(PlayOutcome::Pending));
        assert!(handle.is_pending());

        assert_eq!(handle.tick(PLAY_REQUEST_LATENCY / 2.0).resolved, None);
        let report = handle.tick(PLAY_REQUEST_LATENCY);
        assert_eq!(report.resolved, Some(Ok(())));
        assert!(handle.is_playing());
    }

    #[test]
    fn test_gesture_policy_refuses_until_interaction() {
        let page = PageEnvironment::new(AutoplayPolicy::RequireGesture);
        let (handle, mut video) = SimulatedPlayerHandle::create("a.mp4", 2.0, &page);

        video.set_muted(false);
        video.play().unwrap();
        // Interaction after the request doesn't rescue it
        page.mark_interaction();
        let report = handle.tick(1.0);
        assert!(matches!(report.resolved, Some(Err(PlaybackError::AutoplayRejected(_)))));
        assert!(!handle.is_playing());

        video.play().unwrap();
        assert_eq!(handle.tick(1.0).resolved, Some(Ok(())));
    }

    #[test]
    fn test_non_looping_video_reports_end_once() {
        let page = PageEnvironment::new(AutoplayPolicy::AllowAll);
        let (handle, mut video) = SimulatedPlayerHandle::create("a.mp4", 1.0, &page);

        video.set_looping(false);
        video.play().unwrap();
        assert!(!handle.tick(0.6).ended);
        assert!(handle.tick(0.6).ended);
        assert!(!handle.tick(0.6).ended);
        assert_eq!(handle.progress(), 1.0);
    }

    #[test]
    fn test_looping_video_wraps() {
        let page = PageEnvironment::new(AutoplayPolicy::AllowAll);
        let (handle, mut video) = SimulatedPlayerHandle::create("a.mp4", 1.0, &page);

        video.play().unwrap();
        assert!(!handle.tick(1.5).ended);
        assert!(handle.is_playing());
        assert!((handle.progress() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_pause_cancels_pending_request() {
        let page = PageEnvironment::new(AutoplayPolicy::AllowAll);
        let (handle, mut video) = SimulatedPlayerHandle::create("a.mp4", 1.0, &page);

        video.set_muted(false);
        video.play().unwrap();
        video.pause();
        assert!(!handle.is_pending());
        assert_eq!(handle.tick(1.0), TickReport::default());
    }
}
