/// Core EventBus implementation
use super::{Event, EventPriority};
use crate::error::EventError;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, trace};
use uuid::Uuid;

type ErasedListener = Arc<dyn Fn(&mut dyn Any) -> Result<(), EventError> + Send + Sync>;

/// One subscription as stored by the bus.
#[derive(Clone)]
struct RegisteredListener {
    ignore_cancelled: bool,
    token: Uuid,
    listener: ErasedListener,
}

/// Listeners for one event type, one vector per priority band.
#[derive(Default)]
struct TypeListeners {
    bands: [Vec<RegisteredListener>; 4],
}

impl TypeListeners {
    fn len(&self) -> usize {
        self.bands.iter().map(Vec::len).sum()
    }

    fn remove(&mut self, token: Uuid) -> bool {
        for band in &mut self.bands {
            if let Some(pos) = band.iter().position(|l| l.token == token) {
                band.remove(pos);
                return true;
            }
        }
        false
    }

    fn snapshot(&self) -> Vec<RegisteredListener> {
        self.bands.iter().flatten().cloned().collect()
    }
}

type ListenerMap = RwLock<HashMap<TypeId, TypeListeners>>;

/// The event bus shared by every plugin of a runtime.
///
/// # Thread Safety
///
/// The bus is `Send + Sync` and is normally shared as `Arc<EventBus>`.
/// Dispatch works on a snapshot of the listener list taken when `post` starts,
/// so listeners may subscribe or unsubscribe while an event is in flight; the
/// change is visible from the next `post` on.
///
/// # Failure policy
///
/// A listener returning `Err` aborts the remaining dispatch for that event and
/// the error is returned from [`EventBus::post`]. Panics are not caught.
pub struct EventBus {
    listeners: Arc<ListenerMap>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let event_types = self.listeners.read().len();
        f.debug_struct("EventBus")
            .field("event_types", &event_types)
            .field("total_listeners", &self.total_listeners())
            .finish()
    }
}

impl EventBus {
    /// Creates an event bus with no subscriptions.
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribes `listener` to events of exactly type `E`.
    ///
    /// When `ignore_cancelled` is true the listener is skipped for events that
    /// are cancelled at the moment they are posted.
    pub fn subscribe<E, F>(&self, priority: EventPriority, ignore_cancelled: bool, listener: F) -> Subscription
    where
        E: Event,
        F: Fn(&mut E) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let erased: ErasedListener = Arc::new(move |event: &mut dyn Any| match event.downcast_mut::<E>() {
            Some(event) => listener(event),
            None => Ok(()),
        });

        let token = Uuid::new_v4();
        let type_id = TypeId::of::<E>();
        self.listeners
            .write()
            .entry(type_id)
            .or_default()
            .bands[priority.band()]
            .push(RegisteredListener {
                ignore_cancelled,
                token,
                listener: erased,
            });

        debug!(
            "📝 Subscribed listener {} for {} at {:?}",
            token,
            std::any::type_name::<E>(),
            priority
        );

        Subscription {
            bus: Arc::downgrade(&self.listeners),
            type_id,
            token,
            active: AtomicBool::new(true),
        }
    }

    /// Subscribes at [`EventPriority::Normal`] without ignoring cancelled events.
    pub fn on<E, F>(&self, listener: F) -> Subscription
    where
        E: Event,
        F: Fn(&mut E) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.subscribe(EventPriority::Normal, false, listener)
    }

    /// Posts `event` to every matching listener and hands it back.
    pub fn post<E: Event>(&self, mut event: E) -> Result<E, EventError> {
        self.dispatch(&mut event)?;
        Ok(event)
    }

    /// Same as [`post`](Self::post) for events the caller keeps ownership of.
    pub fn dispatch<E: Event>(&self, event: &mut E) -> Result<(), EventError> {
        let snapshot = match self.listeners.read().get(&TypeId::of::<E>()) {
            Some(listeners) => listeners.snapshot(),
            None => return Ok(()),
        };

        let cancelled = event
            .as_cancellable()
            .is_some_and(|cancellable| cancellable.is_cancelled());

        trace!(
            "📤 Posting {} to {} listeners (cancelled: {})",
            std::any::type_name::<E>(),
            snapshot.len(),
            cancelled
        );

        for registered in snapshot {
            if registered.ignore_cancelled && cancelled {
                continue;
            }
            let any: &mut dyn Any = &mut *event;
            if let Err(e) = (registered.listener)(any) {
                error!(
                    "❌ Listener {} failed for {}: {}",
                    registered.token,
                    std::any::type_name::<E>(),
                    e
                );
                return Err(e);
            }
        }
        Ok(())
    }

    /// Number of active subscriptions for event type `E`.
    pub fn listener_count<E: Event>(&self) -> usize {
        self.listeners
            .read()
            .get(&TypeId::of::<E>())
            .map_or(0, TypeListeners::len)
    }

    /// Number of active subscriptions across all event types.
    pub fn total_listeners(&self) -> usize {
        self.listeners.read().values().map(TypeListeners::len).sum()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle leaves the listener registered.
pub struct Subscription {
    bus: Weak<ListenerMap>,
    type_id: TypeId,
    token: Uuid,
    active: AtomicBool,
}

impl Subscription {
    /// Removes the listener. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        let mut listeners = bus.write();
        if let Some(entry) = listeners.get_mut(&self.type_id) {
            entry.remove(self.token);
            if entry.len() == 0 {
                listeners.remove(&self.type_id);
            }
        }
        debug!("🗑️ Unsubscribed listener {}", self.token);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn token(&self) -> Uuid {
        self.token
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.token)
            .field("active", &self.is_active())
            .finish()
    }
}
