//! Named-event bus: the seam between snapshot sources and widgets.
//!
//! The browser original is `window.fc`: `emit` over `CustomEvent`, `on` over
//! `addEventListener`. Here the bus is an explicit value handed to whoever
//! needs it instead of a global. Dispatch is synchronous and in registration
//! order; a panicking listener is isolated so its siblings still run. There
//! is no queueing, no priority, no persistence.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;

use crate::logging::{log, obj, v_str, Domain, Level};
use crate::snapshot::Snapshot;

/// Canonical snapshot event name.
pub const METER_UPDATE: &str = "fc:meter:update";
/// Legacy alias still emitted by older templates; honored on subscribe only.
pub const FUNDS_UPDATE: &str = "fc:funds:update";
pub const MILESTONE: &str = "fc:milestone";
pub const TICKER_TOGGLE: &str = "fc:ticker:toggle";
pub const CONFETTI: &str = "fc:confetti";

type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

struct Listener {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    listeners: HashMap<String, Vec<Listener>>,
    next_id: u64,
    panics: u64,
}

#[derive(Clone, Default)]
pub struct Bus {
    inner: Arc<Mutex<BusInner>>,
}

/// Handle returned by [`Bus::on`]; delivery stops on `unsubscribe()` or drop.
pub struct Subscription {
    bus: Weak<Mutex<BusInner>>,
    event: String,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            if let Ok(mut inner) = inner.lock() {
                if let Some(list) = inner.listeners.get_mut(&self.event) {
                    list.retain(|l| l.id != self.id);
                }
            }
        }
    }
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `event`. Registration during a dispatch takes
    /// effect on the next emit, not the one in flight.
    pub fn on<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.on_shared(event, Arc::new(handler))
    }

    fn on_shared(&self, event: &str, handler: Handler) -> Subscription {
        let mut inner = self.inner.lock().expect("bus lock");
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .listeners
            .entry(event.to_string())
            .or_default()
            .push(Listener { id, handler });
        Subscription {
            bus: Arc::downgrade(&self.inner),
            event: event.to_string(),
            id,
        }
    }

    /// Registers a snapshot handler under both the canonical name and the
    /// legacy alias, so listeners written against either keep working.
    pub fn on_snapshot<F>(&self, handler: F) -> Vec<Subscription>
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        [METER_UPDATE, FUNDS_UPDATE]
            .iter()
            .map(|name| {
                let handler = handler.clone();
                self.on_shared(
                    name,
                    Arc::new(move |detail: &Value| {
                        if let Some(snap) = Snapshot::from_detail(detail) {
                            handler(&snap);
                        }
                    }),
                )
            })
            .collect()
    }

    /// Synchronously notifies every listener registered for `event`, in
    /// registration order. A listener that panics is caught and counted; the
    /// remaining listeners still run.
    pub fn emit(&self, event: &str, detail: &Value) {
        let handlers: Vec<Handler> = {
            let inner = self.inner.lock().expect("bus lock");
            match inner.listeners.get(event) {
                Some(list) => list.iter().map(|l| l.handler.clone()).collect(),
                None => return,
            }
        };
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(detail))).is_err() {
                if let Ok(mut inner) = self.inner.lock() {
                    inner.panics += 1;
                }
                log(
                    Level::Debug,
                    Domain::Bus,
                    "listener_panic",
                    obj(&[("event_name", v_str(event))]),
                );
            }
        }
    }

    /// Publishes a snapshot under the canonical event name only. The alias
    /// is never re-emitted; bridging both directions would loop.
    pub fn emit_snapshot(&self, snap: &Snapshot) {
        self.emit(METER_UPDATE, &snap.to_detail());
    }

    pub fn listener_count(&self, event: &str) -> usize {
        let inner = self.inner.lock().expect("bus lock");
        inner.listeners.get(event).map_or(0, Vec::len)
    }

    pub fn panic_count(&self) -> u64 {
        self.inner.lock().expect("bus lock").panics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_in_registration_order() {
        let bus = Bus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let (o1, o2) = (order.clone(), order.clone());
        let _s1 = bus.on("evt", move |_| o1.lock().unwrap().push(1));
        let _s2 = bus.on("evt", move |_| o2.lock().unwrap().push(2));
        bus.emit("evt", &json!({}));
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));
        let bus = Bus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let _s1 = bus.on("evt", |_| panic!("widget bug"));
        let _s2 = bus.on("evt", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        bus.emit("evt", &json!({}));
        std::panic::set_hook(prev_hook);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.panic_count(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = Bus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let sub = bus.on("evt", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        bus.emit("evt", &json!({}));
        sub.unsubscribe();
        bus.emit("evt", &json!({}));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count("evt"), 0);
    }

    #[test]
    fn test_snapshot_heard_under_both_names() {
        let bus = Bus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let _subs = bus.on_snapshot(move |snap| {
            assert_eq!(snap.percent(), 25.0);
            h.fetch_add(1, Ordering::SeqCst);
        });
        let detail = Snapshot::new(2500.0, 10000.0).to_detail();
        bus.emit(METER_UPDATE, &detail);
        bus.emit(FUNDS_UPDATE, &detail);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_emit_snapshot_uses_canonical_name_only() {
        let bus = Bus::new();
        let canonical = Arc::new(AtomicUsize::new(0));
        let alias = Arc::new(AtomicUsize::new(0));
        let (c, a) = (canonical.clone(), alias.clone());
        let _s1 = bus.on(METER_UPDATE, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let _s2 = bus.on(FUNDS_UPDATE, move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        bus.emit_snapshot(&Snapshot::new(1.0, 2.0));
        assert_eq!(canonical.load(Ordering::SeqCst), 1);
        assert_eq!(alias.load(Ordering::SeqCst), 0);
    }
}
