//! Playback phases of a surface's active video and the single transition
//! function that moves between them.
//!
//! The function is pure: it returns the next phase and a list of
//! [`Effect`]s, and the surface controller applies those to the media
//! element, the broadcast bus and the active index.

use crate::playback::element::PlaybackError;

/// Phase a suspended surface was in when it left the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFrom {
    MutedLoop,
    RequestingAudiblePlay,
    AudiblePlaying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Muted, looping, playing. Initial phase and the safe default.
    MutedLoop,
    /// Unmuted play was requested and the element hasn't answered yet.
    RequestingAudiblePlay,
    /// The one audible surface on the page. Looping is off so the end is observable.
    AudiblePlaying,
    /// Off screen and paused.
    Suspended { from: ResumeFrom },
}

impl PlaybackPhase {
    pub fn is_audible(self) -> bool {
        matches!(self, PlaybackPhase::AudiblePlaying)
    }

    pub fn is_suspended(self) -> bool {
        matches!(self, PlaybackPhase::Suspended { .. })
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaybackPhase::MutedLoop => "Muted loop",
            PlaybackPhase::RequestingAudiblePlay => "Requesting sound...",
            PlaybackPhase::AudiblePlaying => "Playing with sound",
            PlaybackPhase::Suspended { .. } => "Suspended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// User clicked the active video.
    ClickActive,
    /// The element answered an unmuted play request.
    PlayResolved(Result<(), PlaybackError>),
    /// Another surface became audible.
    ForeignBroadcast,
    /// The active video reached its end on its own.
    NaturalEnd,
    /// The surface crossed the viewport threshold.
    VisibilityChanged { visible: bool },
    /// The active index is about to move to another item.
    Retarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Mute,
    Unmute,
    SetLooping(bool),
    SeekToStart,
    Play,
    /// Ask for unmuted playback; the answer comes back as `PlayResolved`.
    RequestPlay,
    Pause,
    PublishAudible,
    AdvanceActive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: PlaybackPhase,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: PlaybackPhase, effects: &[Effect]) -> Self {
        Self { next, effects: effects.to_vec() }
    }

    fn stay(phase: PlaybackPhase) -> Self {
        Self { next: phase, effects: Vec::new() }
    }
}

const BACK_TO_MUTED_LOOP: [Effect; 3] = [Effect::Mute, Effect::SetLooping(true), Effect::Play];
const SUSPEND: [Effect; 3] = [Effect::Pause, Effect::Mute, Effect::SetLooping(true)];

pub fn transition(phase: PlaybackPhase, event: &PlaybackEvent) -> Transition {
    use PlaybackEvent as E;
    use PlaybackPhase as P;

    match (phase, event) {
        (P::MutedLoop, E::ClickActive) => Transition::to(
            P::RequestingAudiblePlay,
            &[Effect::Unmute, Effect::SetLooping(false), Effect::SeekToStart, Effect::RequestPlay],
        ),

        (P::RequestingAudiblePlay, E::PlayResolved(Ok(()))) => {
            Transition::to(P::AudiblePlaying, &[Effect::PublishAudible])
        }
        (P::RequestingAudiblePlay, E::PlayResolved(Err(_))) => {
            Transition::to(P::MutedLoop, &BACK_TO_MUTED_LOOP)
        }
        (P::RequestingAudiblePlay | P::AudiblePlaying, E::ForeignBroadcast | E::Retarget) => {
            Transition::to(P::MutedLoop, &BACK_TO_MUTED_LOOP)
        }

        // Second click on the loud video is a manual mute; no broadcast needed
        (P::AudiblePlaying, E::ClickActive) => Transition::to(P::MutedLoop, &BACK_TO_MUTED_LOOP),
        (P::AudiblePlaying, E::NaturalEnd) => Transition::to(
            P::MutedLoop,
            &[Effect::Mute, Effect::SetLooping(true), Effect::Play, Effect::AdvanceActive],
        ),

        (P::Suspended { .. }, E::VisibilityChanged { visible: false }) => Transition::stay(phase),
        (P::Suspended { .. }, E::VisibilityChanged { visible: true }) => {
            Transition::to(P::MutedLoop, &BACK_TO_MUTED_LOOP)
        }
        (_, E::VisibilityChanged { visible: true }) => Transition::stay(phase),
        (P::MutedLoop, E::VisibilityChanged { visible: false }) => {
            Transition::to(P::Suspended { from: ResumeFrom::MutedLoop }, &SUSPEND)
        }
        (P::RequestingAudiblePlay, E::VisibilityChanged { visible: false }) => Transition::to(
            P::Suspended { from: ResumeFrom::RequestingAudiblePlay },
            &SUSPEND,
        ),
        (P::AudiblePlaying, E::VisibilityChanged { visible: false }) => Transition::to(
            P::Suspended { from: ResumeFrom::AudiblePlaying },
            &SUSPEND,
        ),

        // A request that lands while off screen must not leave sound running
        (P::Suspended { from: ResumeFrom::RequestingAudiblePlay }, E::PlayResolved(result)) => {
            let effects: &[Effect] = if result.is_ok() { &SUSPEND } else { &[] };
            Transition::to(P::Suspended { from: ResumeFrom::MutedLoop }, effects)
        }
        (P::Suspended { from: ResumeFrom::RequestingAudiblePlay | ResumeFrom::AudiblePlaying }, E::ForeignBroadcast | E::Retarget) => {
            Transition::stay(P::Suspended { from: ResumeFrom::MutedLoop })
        }

        _ => Transition::stay(phase),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected() -> PlaybackEvent {
        PlaybackEvent::PlayResolved(Err(PlaybackError::AutoplayRejected("NotAllowedError".into())))
    }

    #[test]
    fn test_click_requests_unmuted_play_from_start() {
        let t = transition(PlaybackPhase::MutedLoop, &PlaybackEvent::ClickActive);
        assert_eq!(t.next, PlaybackPhase::RequestingAudiblePlay);
        assert_eq!(
            t.effects,
            vec![Effect::Unmute, Effect::SetLooping(false), Effect::SeekToStart, Effect::RequestPlay]
        );
    }

    #[test]
    fn test_successful_request_publishes() {
        let t = transition(PlaybackPhase::RequestingAudiblePlay, &PlaybackEvent::PlayResolved(Ok(())));
        assert_eq!(t.next, PlaybackPhase::AudiblePlaying);
        assert_eq!(t.effects, vec![Effect::PublishAudible]);
    }

    #[test]
    fn test_rejected_request_falls_back_without_publishing() {
        let t = transition(PlaybackPhase::RequestingAudiblePlay, &rejected());
        assert_eq!(t.next, PlaybackPhase::MutedLoop);
        assert_eq!(t.effects, BACK_TO_MUTED_LOOP.to_vec());
        assert!(!t.effects.contains(&Effect::PublishAudible));
    }

    #[test]
    fn test_foreign_broadcast_silences() {
        for phase in [PlaybackPhase::AudiblePlaying, PlaybackPhase::RequestingAudiblePlay] {
            let t = transition(phase, &PlaybackEvent::ForeignBroadcast);
            assert_eq!(t.next, PlaybackPhase::MutedLoop);
            assert_eq!(t.effects, BACK_TO_MUTED_LOOP.to_vec());
        }
        let t = transition(PlaybackPhase::MutedLoop, &PlaybackEvent::ForeignBroadcast);
        assert_eq!(t, Transition::stay(PlaybackPhase::MutedLoop));
    }

    #[test]
    fn test_second_click_is_manual_mute() {
        let t = transition(PlaybackPhase::AudiblePlaying, &PlaybackEvent::ClickActive);
        assert_eq!(t.next, PlaybackPhase::MutedLoop);
        assert!(!t.effects.contains(&Effect::PublishAudible));
        assert!(!t.effects.contains(&Effect::AdvanceActive));
    }

    #[test]
    fn test_clicks_while_requesting_are_ignored() {
        let t = transition(PlaybackPhase::RequestingAudiblePlay, &PlaybackEvent::ClickActive);
        assert_eq!(t, Transition::stay(PlaybackPhase::RequestingAudiblePlay));
    }

    #[test]
    fn test_natural_end_advances_silently() {
        let t = transition(PlaybackPhase::AudiblePlaying, &PlaybackEvent::NaturalEnd);
        assert_eq!(t.next, PlaybackPhase::MutedLoop);
        assert_eq!(t.effects.last(), Some(&Effect::AdvanceActive));
        assert!(!t.effects.contains(&Effect::PublishAudible));
    }

    #[test]
    fn test_looping_video_never_ends() {
        let t = transition(PlaybackPhase::MutedLoop, &PlaybackEvent::NaturalEnd);
        assert_eq!(t, Transition::stay(PlaybackPhase::MutedLoop));
    }

    #[test]
    fn test_suspend_remembers_phase_and_resumes_muted() {
        let cases = [
            (PlaybackPhase::MutedLoop, ResumeFrom::MutedLoop),
            (PlaybackPhase::RequestingAudiblePlay, ResumeFrom::RequestingAudiblePlay),
            (PlaybackPhase::AudiblePlaying, ResumeFrom::AudiblePlaying),
        ];
        for (phase, from) in cases {
            let hidden = transition(phase, &PlaybackEvent::VisibilityChanged { visible: false });
            assert_eq!(hidden.next, PlaybackPhase::Suspended { from });
            assert_eq!(hidden.effects.first(), Some(&Effect::Pause));

            let shown = transition(hidden.next, &PlaybackEvent::VisibilityChanged { visible: true });
            assert_eq!(shown.next, PlaybackPhase::MutedLoop);
            assert_eq!(shown.effects, BACK_TO_MUTED_LOOP.to_vec());
        }
    }

    #[test]
    fn test_repeated_visibility_reports_are_noops() {
        let suspended = PlaybackPhase::Suspended { from: ResumeFrom::AudiblePlaying };
        let t = transition(suspended, &PlaybackEvent::VisibilityChanged { visible: false });
        assert_eq!(t, Transition::stay(suspended));

        let t = transition(PlaybackPhase::AudiblePlaying, &PlaybackEvent::VisibilityChanged { visible: true });
        assert_eq!(t, Transition::stay(PlaybackPhase::AudiblePlaying));
    }

    #[test]
    fn test_late_success_while_suspended_is_neutralised() {
        let phase = PlaybackPhase::Suspended { from: ResumeFrom::RequestingAudiblePlay };
        let t = transition(phase, &PlaybackEvent::PlayResolved(Ok(())));
        assert_eq!(t.next, PlaybackPhase::Suspended { from: ResumeFrom::MutedLoop });
        assert!(t.effects.contains(&Effect::Pause));
        assert!(t.effects.contains(&Effect::Mute));

        let t = transition(phase, &rejected());
        assert_eq!(t.next, PlaybackPhase::Suspended { from: ResumeFrom::MutedLoop });
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_late_answer_after_silencing_is_ignored() {
        let t = transition(PlaybackPhase::MutedLoop, &PlaybackEvent::PlayResolved(Ok(())));
        assert_eq!(t, Transition::stay(PlaybackPhase::MutedLoop));
    }

    #[test]
    fn test_retarget_silences_the_outgoing_item() {
        let t = transition(PlaybackPhase::AudiblePlaying, &PlaybackEvent::Retarget);
        assert_eq!(t.next, PlaybackPhase::MutedLoop);
        assert_eq!(t.effects, BACK_TO_MUTED_LOOP.to_vec());

        let t = transition(PlaybackPhase::Suspended { from: ResumeFrom::AudiblePlaying }, &PlaybackEvent::Retarget);
        assert_eq!(t.next, PlaybackPhase::Suspended { from: ResumeFrom::MutedLoop });
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_suspended_surface_ignores_clicks_and_ends() {
        let phase = PlaybackPhase::Suspended { from: ResumeFrom::MutedLoop };
        assert_eq!(transition(phase, &PlaybackEvent::ClickActive), Transition::stay(phase));
        assert_eq!(transition(phase, &PlaybackEvent::NaturalEnd), Transition::stay(phase));
    }
}
