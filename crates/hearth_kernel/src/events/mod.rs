//! # Event Bus
//!
//! Synchronous, type-exact publish/subscribe with priority ordering and
//! cancellation awareness.
//!
//! - The concrete Rust type of an event is its subscription key. There is no
//!   hierarchy walking and no wildcard subscription.
//! - Listeners run on the thread that calls [`EventBus::post`], ordered by
//!   [`EventPriority`] band, registration order within a band.
//! - Events may opt into cancellation by implementing [`Cancellable`] and
//!   returning themselves from [`Event::as_cancellable`].
//!
//! ```rust
//! use hearth_kernel::events::{Event, EventBus, EventPriority};
//!
//! #[derive(Debug)]
//! struct PlayerJoined { name: String }
//! impl Event for PlayerJoined {}
//!
//! let bus = EventBus::new();
//! let sub = bus.subscribe(EventPriority::Normal, false, |event: &mut PlayerJoined| {
//!     println!("{} joined", event.name);
//!     Ok(())
//! });
//! bus.post(PlayerJoined { name: "Alice".into() }).unwrap();
//! sub.unsubscribe();
//! ```

mod bus;

pub use bus::{EventBus, Subscription};

use std::any::Any;

/// Marker trait for values that can travel through the [`EventBus`].
pub trait Event: Any + Send + Sync {
    /// Exposes the cancellation flag of cancellable events.
    ///
    /// The default says "not cancellable". Cancellable events override this
    /// with `Some(self)`.
    fn as_cancellable(&self) -> Option<&dyn Cancellable> {
        None
    }
}

/// Capability for events that can be cancelled.
///
/// Cancellation is advisory: it only causes listeners registered with
/// `ignore_cancelled = true` to be skipped.
pub trait Cancellable {
    fn is_cancelled(&self) -> bool;
    fn set_cancelled(&mut self, cancelled: bool);
}

/// Relative ordering of listeners. `Early` runs first, `Final` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EventPriority {
    /// Validation, cheap pre-checks, early routing
    Early,
    #[default]
    Normal,
    /// Modifications that should see the effects of `Normal` listeners
    Late,
    /// Metrics, logging, state mirroring
    Final,
}

impl EventPriority {
    pub const ALL: [EventPriority; 4] = [
        EventPriority::Early,
        EventPriority::Normal,
        EventPriority::Late,
        EventPriority::Final,
    ];

    pub(crate) fn band(self) -> usize {
        self as usize
    }
}
