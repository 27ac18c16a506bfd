// src/events/bus/event_bus.rs
//
// Workflow event bus.
//
// DESIGN PRINCIPLES:
// 1. Synchronous - handlers run on the emitting task, in subscription order
// 2. Stateless - the bus keeps no history; progress ticks would pile up
// 3. Type-safe - events are strongly typed
// 4. Read-only - handlers observe the workflow, they never drive it

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::events::types::DomainEvent;

/// Type-erased event handler, downcast to the concrete event inside
type EventHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe a view that goes away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Presentation layers subscribe here to follow the workflow.
/// The workflow controller is the only emitter.
///
/// Handlers are invoked without any bus lock held, so a handler may
/// subscribe or unsubscribe. A panicking handler does not stop the others.
/// Cloning shares the same subscriptions.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<RwLock<HashMap<TypeId, Vec<(SubscriptionId, EventHandler)>>>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a specific event type
    ///
    /// Example:
    /// ```ignore
    /// bus.subscribe::<ScoringCompleted, _>(|event| {
    ///     log::info!("Scored {}", event.face_score);
    /// });
    /// ```
    pub fn subscribe<E, F>(&self, handler: F) -> SubscriptionId
    where
        E: DomainEvent + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let wrapped: EventHandler = Arc::new(move |event_any: &dyn Any| {
            if let Some(event) = event_any.downcast_ref::<E>() {
                handler(event);
            } else {
                log::error!(
                    "Failed to downcast event in handler for {}",
                    std::any::type_name::<E>()
                );
            }
        });

        self.handlers
            .write()
            .unwrap()
            .entry(TypeId::of::<E>())
            .or_default()
            .push((id, wrapped));

        log::debug!("{} subscribed to {}", id, std::any::type_name::<E>());
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write().unwrap();
        let mut removed = false;
        handlers.retain(|_, list| {
            let before = list.len();
            list.retain(|(sub, _)| *sub != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    /// Run every handler for the event's type, in subscription order
    pub fn emit<E>(&self, event: E)
    where
        E: DomainEvent + 'static,
    {
        let targets: Vec<(SubscriptionId, EventHandler)> = self
            .handlers
            .read()
            .unwrap()
            .get(&TypeId::of::<E>())
            .cloned()
            .unwrap_or_default();

        log::debug!(
            "[EVENT] {} (id: {}) | {} handlers",
            event.event_type(),
            event.event_id(),
            targets.len()
        );

        for (id, handler) in targets {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(&event as &dyn Any);
            }));

            if let Err(e) = result {
                log::error!("{} panicked on {}: {:?}", id, event.event_type(), e);
            }
        }
    }

    /// Number of live subscriptions for an event type
    pub fn subscriber_count<E>(&self) -> usize
    where
        E: 'static,
    {
        self.handlers
            .read()
            .unwrap()
            .get(&TypeId::of::<E>())
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handler_types = self.handlers.read().map(|h| h.len()).unwrap_or(0);
        f.debug_struct("EventBus")
            .field("handler_types", &handler_types)
            .finish()
    }
}
