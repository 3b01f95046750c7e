use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};
use tokio::sync::broadcast;

/// Capacity of the observer stream returned by [`BroadcastBus::watch`].
/// Lagging observers skip old events; only the latest loud surface matters.
pub const OBSERVER_CAPACITY: usize = 64;

/// Opaque identity of one mounted surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SurfaceId(String);

impl SurfaceId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for SurfaceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// "I am now the loud one." Carries nothing but the publisher's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastEvent {
    pub origin: SurfaceId,
}

/// Outcome of a single publish, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

type Handler = Arc<dyn Fn(&BroadcastEvent) -> anyhow::Result<()> + Send + Sync>;

struct Subscriber {
    key: u64,
    owner: SurfaceId,
    handler: Handler,
}

struct BusInner {
    subscribers: Mutex<Vec<Subscriber>>,
    next_key: AtomicU64,
    observers: broadcast::Sender<BroadcastEvent>,
}

impl BusInner {
    fn subscribers(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        // Handlers run outside this lock
        self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, key: u64) -> bool {
        let mut subscribers = self.subscribers();
        let before = subscribers.len();
        subscribers.retain(|s| s.key != key);
        subscribers.len() != before
    }
}

/// Publish/subscribe channel enforcing exclusive audible playback.
///
/// Delivery is synchronous: every subscriber present when `publish` starts
/// has run its handler before `publish` returns. The publisher's own
/// subscriptions are skipped. Nothing is queued or replayed.
#[derive(Clone)]
pub struct BroadcastBus {
    inner: Arc<BusInner>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        let (observers, _) = broadcast::channel(OBSERVER_CAPACITY);
        Self {
            inner: Arc::new(BusInner {
                subscribers: Mutex::new(Vec::new()),
                next_key: AtomicU64::new(0),
                observers,
            }),
        }
    }

    /// The process-wide bus shared by every surface that doesn't get its own.
    pub fn global() -> &'static BroadcastBus {
        static GLOBAL: OnceLock<BroadcastBus> = OnceLock::new();
        GLOBAL.get_or_init(BroadcastBus::new)
    }

    /// Register `handler` on behalf of `owner`. Dropping the returned
    /// [`Subscription`] unsubscribes.
    pub fn subscribe<F>(&self, owner: SurfaceId, handler: F) -> Subscription
    where
        F: Fn(&BroadcastEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let key = self.inner.next_key.fetch_add(1, Ordering::Relaxed);
        log::debug!("Surface {} subscribed to playback bus (key {})", owner, key);

        self.inner.subscribers().push(Subscriber {
            key,
            owner,
            handler: Arc::new(handler),
        });

        Subscription {
            bus: Arc::downgrade(&self.inner),
            key,
            active: true,
        }
    }

    /// Announce that `origin` just became audible.
    pub fn publish(&self, origin: &SurfaceId) -> DeliveryReport {
        let event = BroadcastEvent { origin: origin.clone() };

        // Snapshot so handlers may subscribe or unsubscribe while we deliver
        let targets: Vec<(u64, Handler)> = self
            .inner
            .subscribers()
            .iter()
            .filter(|s| &s.owner != origin)
            .map(|s| (s.key, Arc::clone(&s.handler)))
            .collect();

        let mut report = DeliveryReport::default();
        for (key, handler) in targets {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    log::warn!("Playback bus handler {} failed for origin {}: {}", key, origin, e);
                    report.failed += 1;
                }
                Err(_) => {
                    log::warn!("Playback bus handler {} panicked for origin {}", key, origin);
                    report.failed += 1;
                }
            }
        }

        log::debug!(
            "Published audible playback from {} ({} delivered, {} failed)",
            origin,
            report.delivered,
            report.failed
        );

        // Observers are informational; no receivers is fine
        let _ = self.inner.observers.send(event);
        report
    }

    /// Stream of events published after this call, for status displays.
    pub fn watch(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.inner.observers.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BroadcastBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Guard for one bus registration.
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<BusInner>,
    key: u64,
    active: bool,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.active && self.bus.strong_count() > 0
    }

    /// Unsubscribe now instead of at drop.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(bus) = self.bus.upgrade() {
            if bus.remove(self.key) {
                log::debug!("Playback bus subscription {} released", self.key);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
