//! Event Bus - widget-to-widget messaging
//!
//! A widget posts a typed message tagged with its sender id and an event
//! kind; every handler registered for exactly that `(sender, kind)` pair is
//! invoked synchronously, in subscription order, on the calling thread.
//! Messages are never queued: once `publish` returns the payload is gone.
//!
//! # Example
//!
//! ```
//! use arbor_core::bus::{event_types, EventBus, SenderId};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let mut bus = EventBus::new();
//! let clicks = Rc::new(Cell::new(0));
//!
//! let seen = Rc::clone(&clicks);
//! bus.subscribe(SenderId(5), event_types::CLICK, move |count: &u32| {
//!     seen.set(seen.get() + *count);
//! });
//!
//! assert_eq!(bus.publish(SenderId(5), event_types::CLICK, 2u32), 1);
//! assert_eq!(bus.publish(SenderId(5), event_types::HOVER, 2u32), 0);
//! assert_eq!(clicks.get(), 2);
//! ```

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::any::{type_name, Any};
use std::fmt;

/// Event kind tag
pub type EventKind = u32;

/// Well-known event kinds
pub mod event_types {
    use super::EventKind;

    pub const CLICK: EventKind = 1;
    pub const HOVER: EventKind = 2;
    pub const VALUE_CHANGED: EventKind = 3;
    pub const SELECTION_CHANGED: EventKind = 4;
    pub const TIMER: EventKind = 5;
    pub const OPEN: EventKind = 6;
    pub const CLOSE: EventKind = 7;

    /// First kind free for application use
    pub const USER: EventKind = 1000;
}

/// Identity of the object a message comes from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SenderId(pub u64);

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sender#{}", self.0)
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&dyn Any) -> bool>;

struct Subscription {
    id: SubscriptionId,
    handler: Handler,
}

/// Synchronous, same-thread message bus
#[derive(Default)]
pub struct EventBus {
    handlers: FxHashMap<(SenderId, EventKind), SmallVec<[Subscription; 1]>>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("keys", &self.handlers.len())
            .field("subscriptions", &self.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for messages of payload type `T` sent by `sender`
    /// with kind `kind`.
    pub fn subscribe<T, F>(
        &mut self,
        sender: SenderId,
        kind: EventKind,
        mut handler: F,
    ) -> SubscriptionId
    where
        T: Any,
        F: FnMut(&T) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let erased: Handler = Box::new(move |payload: &dyn Any| match payload.downcast_ref::<T>() {
            Some(msg) => {
                handler(msg);
                true
            }
            None => false,
        });

        self.handlers
            .entry((sender, kind))
            .or_default()
            .push(Subscription {
                id,
                handler: erased,
            });

        tracing::trace!(%sender, kind, payload = type_name::<T>(), "subscribed");
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut emptied = None;
        let mut found = false;

        for (key, subs) in self.handlers.iter_mut() {
            if let Some(pos) = subs.iter().position(|s| s.id == id) {
                subs.remove(pos);
                found = true;
                if subs.is_empty() {
                    emptied = Some(*key);
                }
                break;
            }
        }

        if let Some(key) = emptied {
            self.handlers.remove(&key);
        }
        found
    }

    /// Deliver `payload` to every handler registered for `(sender, kind)`.
    ///
    /// Returns the number of handlers that received the message. Publishing
    /// to a key nobody listens on is not an error.
    pub fn publish<T: Any>(&mut self, sender: SenderId, kind: EventKind, payload: T) -> usize {
        let Some(subs) = self.handlers.get_mut(&(sender, kind)) else {
            tracing::trace!(%sender, kind, "no subscribers");
            return 0;
        };

        let mut delivered = 0;
        for sub in subs.iter_mut() {
            if (sub.handler)(&payload) {
                delivered += 1;
            } else {
                tracing::debug!(
                    %sender,
                    kind,
                    payload = type_name::<T>(),
                    "handler skipped: payload type mismatch"
                );
            }
        }
        delivered
    }

    /// Check whether anything listens on `(sender, kind)`
    pub fn has_subscribers(&self, sender: SenderId, kind: EventKind) -> bool {
        self.handlers
            .get(&(sender, kind))
            .is_some_and(|subs| !subs.is_empty())
    }

    /// Total number of live subscriptions
    pub fn len(&self) -> usize {
        self.handlers.values().map(|subs| subs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Drop every subscription
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct ButtonMsg {
        label: &'static str,
    }

    #[test]
    fn test_publish_matches_exact_key() {
        let mut bus = EventBus::new();
        let received: Rc<RefCell<Vec<ButtonMsg>>> = Rc::new(RefCell::new(Vec::new()));
        let received_clone = Rc::clone(&received);

        bus.subscribe(SenderId(5), event_types::CLICK, move |msg: &ButtonMsg| {
            received_clone.borrow_mut().push(msg.clone());
        });

        let x = ButtonMsg { label: "x" };
        assert_eq!(bus.publish(SenderId(5), event_types::CLICK, x.clone()), 1);
        assert_eq!(
            bus.publish(SenderId(5), event_types::HOVER, ButtonMsg { label: "y" }),
            0
        );
        assert_eq!(
            bus.publish(SenderId(6), event_types::CLICK, ButtonMsg { label: "z" }),
            0
        );

        assert_eq!(*received.borrow(), vec![x]);
    }

    #[test]
    fn test_multiple_handlers_run_in_order() {
        let mut bus = EventBus::new();
        let order: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

        for tag in 1..=3u32 {
            let order = Rc::clone(&order);
            bus.subscribe(SenderId(1), event_types::VALUE_CHANGED, move |_: &f32| {
                order.borrow_mut().push(tag);
            });
        }

        assert_eq!(bus.publish(SenderId(1), event_types::VALUE_CHANGED, 0.5f32), 3);
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_payload_type_mismatch_is_skipped() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0));
        let hits_clone = Rc::clone(&hits);

        bus.subscribe(SenderId(2), event_types::CLICK, move |_: &String| {
            *hits_clone.borrow_mut() += 1;
        });

        assert_eq!(bus.publish(SenderId(2), event_types::CLICK, 42i32), 0);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let a = bus.subscribe(SenderId(1), event_types::CLICK, |_: &()| {});
        let b = bus.subscribe(SenderId(1), event_types::CLICK, |_: &()| {});
        assert_eq!(bus.len(), 2);

        assert!(bus.unsubscribe(a));
        assert!(!bus.unsubscribe(a));
        assert_eq!(bus.publish(SenderId(1), event_types::CLICK, ()), 1);

        assert!(bus.unsubscribe(b));
        assert!(!bus.has_subscribers(SenderId(1), event_types::CLICK));
        assert!(bus.is_empty());
    }
}
