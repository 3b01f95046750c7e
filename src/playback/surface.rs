// =============================================================================
// SURFACE CONTROLLER - ONE MOUNTED CARD STACK
// =============================================================================
//
// Owns the media list, the active index and the playback phase of one
// surface. All coordination with other surfaces goes through the broadcast
// bus; a surface never sees another surface's state.
//
// LOCKING:
// - SurfaceState lives behind a Mutex shared with the bus handler (weakly)
// - The lock is released before publishing, so delivery to other surfaces
//   never runs while this surface is locked
//
// =============================================================================

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use crate::core::{MediaItem, MediaList, ReelConfig};
use crate::playback::bus::{BroadcastBus, BroadcastEvent, Subscription, SurfaceId};
use crate::playback::element::{MediaElement, PlayOutcome, PlaybackError};
use crate::playback::machine::{transition, Effect, PlaybackEvent, PlaybackPhase, ResumeFrom};
use crate::stack::{compute_positions, CardPosition, CardRole, StackGeometry};

/// Per-surface settings taken from [`ReelConfig`].
#[derive(Debug, Clone)]
pub struct SurfaceOptions {
    pub geometry: StackGeometry,
    pub visibility_threshold: f32,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self::from_config(&ReelConfig::default())
    }
}

impl SurfaceOptions {
    pub fn from_config(config: &ReelConfig) -> Self {
        Self {
            geometry: config.geometry.clone(),
            visibility_threshold: config.visibility_threshold,
        }
    }
}

/// What a click on a card did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The active video was asked to toggle its sound.
    ToggledSound,
    /// A neighbour became the active item.
    Promoted(usize),
    Ignored,
}

/// Read-only view of a surface for rendering and assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSnapshot {
    pub id: SurfaceId,
    pub active_index: usize,
    pub len: usize,
    pub phase: PlaybackPhase,
    pub is_muted: bool,
    pub is_hovered: bool,
    pub is_visible: bool,
    pub failed: Vec<usize>,
}

struct MediaSlot {
    element: Option<Box<dyn MediaElement>>,
    failed: bool,
}

impl MediaSlot {
    fn usable(&mut self) -> Option<&mut Box<dyn MediaElement>> {
        if self.failed {
            None
        } else {
            self.element.as_mut()
        }
    }
}

struct SurfaceState {
    id: SurfaceId,
    media: MediaList,
    slots: Vec<MediaSlot>,
    active_index: usize,
    phase: PlaybackPhase,
    is_hovered: bool,
    is_visible: bool,
}

impl SurfaceState {
    fn new<F>(id: SurfaceId, media: MediaList, is_visible: bool, factory: F) -> Self
    where
        F: FnMut(usize, &MediaItem) -> Option<Box<dyn MediaElement>>,
    {
        let slots = Self::build_slots(&media, factory);
        let phase = if is_visible {
            PlaybackPhase::MutedLoop
        } else {
            PlaybackPhase::Suspended { from: ResumeFrom::MutedLoop }
        };

        let mut state = Self {
            id,
            media,
            slots,
            active_index: 0,
            phase,
            is_hovered: false,
            is_visible,
        };
        state.settle_active();
        state.sync_inactive();
        state
    }

    fn build_slots<F>(media: &MediaList, mut factory: F) -> Vec<MediaSlot>
    where
        F: FnMut(usize, &MediaItem) -> Option<Box<dyn MediaElement>>,
    {
        media
            .iter()
            .enumerate()
            .map(|(index, item)| MediaSlot {
                // Images never get an element, whatever the host offers
                element: if item.is_video() { factory(index, item) } else { None },
                failed: false,
            })
            .collect()
    }

    fn role_of(&self, index: usize) -> CardRole {
        CardRole::for_index(index, self.active_index, self.media.len())
    }

    fn active_is_playable(&self) -> bool {
        self.slots
            .get(self.active_index)
            .map(|slot| slot.element.is_some() && !slot.failed)
            .unwrap_or(false)
    }

    /// Run one event through the state machine. Returns true when the
    /// caller has to publish on the bus once the lock is released.
    fn apply(&mut self, event: PlaybackEvent) -> bool {
        let outcome = transition(self.phase, &event);
        if outcome.next != self.phase {
            log::debug!(
                "Surface {}: {:?} --{:?}--> {:?}",
                self.id,
                self.phase,
                event,
                outcome.next
            );
        }
        self.phase = outcome.next;

        let mut publish = false;
        for effect in outcome.effects {
            match effect {
                Effect::PublishAudible => publish = true,
                Effect::AdvanceActive => {
                    let next = self.media.wrap(self.active_index, 1);
                    log::info!("Surface {}: item {} ended, advancing to {}", self.id, self.active_index, next);
                    self.move_active(next);
                }
                Effect::RequestPlay => publish |= self.request_audible_play(),
                other => self.apply_to_active(other),
            }
        }
        publish
    }

    fn request_audible_play(&mut self) -> bool {
        let index = self.active_index;
        let result = match self.slots.get_mut(index).and_then(MediaSlot::usable) {
            Some(element) => element.play(),
            None => Err(PlaybackError::Detached),
        };

        match result {
            Ok(PlayOutcome::Started) => self.apply(PlaybackEvent::PlayResolved(Ok(()))),
            Ok(PlayOutcome::Pending) => {
                log::debug!("Surface {}: play request for item {} pending", self.id, index);
                false
            }
            Err(e) => {
                log::info!("Surface {}: unmuted play refused ({}), staying muted", self.id, e);
                self.apply(PlaybackEvent::PlayResolved(Err(e)))
            }
        }
    }

    fn apply_to_active(&mut self, effect: Effect) {
        let index = self.active_index;
        let id = &self.id;
        let Some(element) = self.slots.get_mut(index).and_then(MediaSlot::usable) else {
            return;
        };
        match effect {
            Effect::Mute => element.set_muted(true),
            Effect::Unmute => element.set_muted(false),
            Effect::SetLooping(looping) => element.set_looping(looping),
            Effect::SeekToStart => element.seek_to_start(),
            Effect::Pause => element.pause(),
            Effect::Play => {
                if let Err(e) = element.play() {
                    log::warn!("Surface {}: muted playback of item {} failed: {}", id, index, e);
                }
            }
            Effect::RequestPlay | Effect::PublishAudible | Effect::AdvanceActive => {}
        }
    }

    /// Put the active element into whatever its phase expects after the
    /// active index moved.
    fn settle_active(&mut self) {
        if self.phase.is_suspended() {
            self.apply_to_active(Effect::Pause);
            self.apply_to_active(Effect::Mute);
            self.apply_to_active(Effect::SetLooping(true));
        } else {
            self.apply_to_active(Effect::Mute);
            self.apply_to_active(Effect::SetLooping(true));
            self.apply_to_active(Effect::Play);
        }
    }

    /// Neighbours loop silently while on screen; hidden cards stay paused.
    fn sync_inactive(&mut self) {
        let running = self.is_visible && !self.phase.is_suspended();
        for index in 0..self.slots.len() {
            if index == self.active_index {
                continue;
            }
            let role = self.role_of(index);
            let Some(element) = self.slots.get_mut(index).and_then(MediaSlot::usable) else {
                continue;
            };

            element.set_muted(true);
            element.set_looping(true);
            if running && role.is_neighbor() {
                if let Err(e) = element.play() {
                    log::warn!("Neighbour item {} failed to loop: {}", index, e);
                }
            } else {
                element.pause();
            }
        }
    }

    fn move_active(&mut self, index: usize) {
        self.active_index = index;
        self.settle_active();
        self.sync_inactive();
    }

    fn retarget(&mut self, index: usize) {
        if index == self.active_index {
            return;
        }
        // Retarget never publishes, it only silences the outgoing item
        let _ = self.apply(PlaybackEvent::Retarget);
        self.move_active(index);
    }

    fn pause_all(&mut self) {
        for slot in &mut self.slots {
            if let Some(element) = slot.element.as_mut() {
                element.set_muted(true);
                element.pause();
            }
        }
    }

    fn snapshot(&self) -> SurfaceSnapshot {
        SurfaceSnapshot {
            id: self.id.clone(),
            active_index: self.active_index,
            len: self.media.len(),
            phase: self.phase,
            is_muted: !self.phase.is_audible(),
            is_hovered: self.is_hovered,
            is_visible: self.is_visible,
            failed: self
                .slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.failed)
                .map(|(index, _)| index)
                .collect(),
        }
    }
}

fn lock_state(state: &Mutex<SurfaceState>) -> MutexGuard<'_, SurfaceState> {
    state.lock().unwrap_or_else(|poisoned| {
        log::warn!("Surface state lock was poisoned, continuing with last state");
        poisoned.into_inner()
    })
}

/// One mounted card stack.
///
/// Created by [`SurfaceController::mount`], which subscribes it to the bus.
/// Dropping the controller (or calling [`SurfaceController::unmount`])
/// releases the subscription and pauses every element it owns.
pub struct SurfaceController {
    id: SurfaceId,
    bus: BroadcastBus,
    state: Arc<Mutex<SurfaceState>>,
    options: SurfaceOptions,
    subscription: Option<Subscription>,
}

impl SurfaceController {
    pub fn mount<F>(bus: &BroadcastBus, media: MediaList, options: SurfaceOptions, factory: F) -> Self
    where
        F: FnMut(usize, &MediaItem) -> Option<Box<dyn MediaElement>>,
    {
        let id = SurfaceId::new();
        log::info!("Mounting surface {} with {} items", id, media.len());

        let state = Arc::new(Mutex::new(SurfaceState::new(id.clone(), media, true, factory)));
        let subscription = bus.subscribe(id.clone(), Self::broadcast_handler(id.clone(), Arc::downgrade(&state)));

        Self {
            id,
            bus: bus.clone(),
            state,
            options,
            subscription: Some(subscription),
        }
    }

    fn broadcast_handler(
        own_id: SurfaceId,
        state: Weak<Mutex<SurfaceState>>,
    ) -> impl Fn(&BroadcastEvent) -> anyhow::Result<()> + Send + Sync + 'static {
        move |event| {
            if event.origin == own_id {
                return Ok(());
            }
            let state = state
                .upgrade()
                .ok_or_else(|| anyhow::anyhow!("surface {} no longer exists", own_id))?;
            let mut state = lock_state(&state);
            if state.phase.is_audible() || matches!(state.phase, PlaybackPhase::RequestingAudiblePlay) {
                log::info!("Surface {}: silenced by {}", own_id, event.origin);
            }
            // A foreign broadcast never makes this surface publish
            let _ = state.apply(PlaybackEvent::ForeignBroadcast);
            Ok(())
        }
    }

    pub fn id(&self) -> &SurfaceId {
        &self.id
    }

    fn dispatch(&self, event: PlaybackEvent) {
        let publish = lock_state(&self.state).apply(event);
        if publish {
            log::info!("Surface {} is now the audible surface", self.id);
            self.bus.publish(&self.id);
        }
    }

    /// Click on the card at `index`: toggles sound on the active video,
    /// promotes any neighbour, ignores hidden cards.
    pub fn click(&self, index: usize) -> ClickOutcome {
        let mut state = lock_state(&self.state);
        if index >= state.media.len() {
            return ClickOutcome::Ignored;
        }

        let role = state.role_of(index);
        match role {
            CardRole::Active => {
                let settled = matches!(state.phase, PlaybackPhase::MutedLoop | PlaybackPhase::AudiblePlaying);
                if !settled || !state.active_is_playable() {
                    return ClickOutcome::Ignored;
                }
                drop(state);
                self.dispatch(PlaybackEvent::ClickActive);
                ClickOutcome::ToggledSound
            }
            CardRole::NeighborLeft | CardRole::NeighborRight => {
                // Failed items are promoted too; their card just stays static
                log::debug!("Surface {}: promoting item {}", self.id, index);
                state.retarget(index);
                ClickOutcome::Promoted(index)
            }
            CardRole::Hidden => ClickOutcome::Ignored,
        }
    }

    pub fn next(&self) {
        let mut state = lock_state(&self.state);
        let target = state.media.wrap(state.active_index, 1);
        state.retarget(target);
    }

    pub fn previous(&self) {
        let mut state = lock_state(&self.state);
        let target = state.media.wrap(state.active_index, -1);
        state.retarget(target);
    }

    /// The element at `index` reached its end without user action.
    pub fn handle_ended(&self, index: usize) {
        let is_active = lock_state(&self.state).active_index == index;
        if is_active {
            self.dispatch(PlaybackEvent::NaturalEnd);
        }
    }

    /// Settle a play request that returned [`PlayOutcome::Pending`].
    pub fn resolve_play(&self, index: usize, result: Result<(), PlaybackError>) {
        let is_active = lock_state(&self.state).active_index == index;
        if is_active {
            self.dispatch(PlaybackEvent::PlayResolved(result));
        } else {
            log::debug!("Surface {}: dropping play answer for inactive item {}", self.id, index);
        }
    }

    /// Mark the item at `index` as unusable. It stays in the stack as a static card.
    pub fn media_failed(&self, index: usize, error: PlaybackError) {
        let mut state = lock_state(&self.state);
        let Some(slot) = state.slots.get_mut(index) else {
            return;
        };
        log::warn!("Surface {}: item {} unusable: {}", self.id, index, error);
        if let Some(element) = slot.element.as_mut() {
            element.pause();
        }
        slot.failed = true;

        if index != state.active_index {
            return;
        }
        let event = match state.phase {
            PlaybackPhase::RequestingAudiblePlay
            | PlaybackPhase::Suspended { from: ResumeFrom::RequestingAudiblePlay } => {
                PlaybackEvent::PlayResolved(Err(error))
            }
            _ => PlaybackEvent::Retarget,
        };
        let _ = state.apply(event);
    }

    /// Viewport intersection ratio in `[0, 1]` as reported by the host.
    pub fn report_intersection(&self, ratio: f32) {
        let visible = ratio >= self.options.visibility_threshold;
        let mut state = lock_state(&self.state);
        if state.is_visible == visible {
            return;
        }
        log::debug!("Surface {}: visible={} (ratio {:.2})", self.id, visible, ratio);
        state.is_visible = visible;
        let _ = state.apply(PlaybackEvent::VisibilityChanged { visible });
        state.sync_inactive();
    }

    pub fn set_hovered(&self, hovered: bool) {
        lock_state(&self.state).is_hovered = hovered;
    }

    /// Swap in a new media list. Everything resets as if freshly mounted.
    pub fn replace_media<F>(&self, media: MediaList, factory: F)
    where
        F: FnMut(usize, &MediaItem) -> Option<Box<dyn MediaElement>>,
    {
        let mut state = lock_state(&self.state);
        log::info!("Surface {}: replacing media list ({} items)", self.id, media.len());
        state.pause_all();
        let is_visible = state.is_visible;
        let is_hovered = state.is_hovered;
        *state = SurfaceState::new(self.id.clone(), media, is_visible, factory);
        state.is_hovered = is_hovered;
    }

    pub fn positions(&self) -> Vec<CardPosition> {
        let state = lock_state(&self.state);
        compute_positions(state.active_index, state.media.len(), state.is_hovered, &self.options.geometry)
    }

    pub fn media(&self) -> MediaList {
        lock_state(&self.state).media.clone()
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        lock_state(&self.state).snapshot()
    }

    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for SurfaceController {
    fn drop(&mut self) {
        log::info!("Unmounting surface {}", self.id);
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        lock_state(&self.state).pause_all();
    }
}

impl std::fmt::Debug for SurfaceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceController")
            .field("id", &self.id)
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
