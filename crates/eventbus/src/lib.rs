//! Per-session Event Bus (§4.4): typed events fanned out to any number of
//! websocket subscribers. Modeled on the teacher's per-run
//! `tokio::sync::broadcast` channel (`crates/gateway/src/runtime/runs.rs`)
//! and the bounded per-connection `mpsc` outbound queue in
//! `crates/gateway/src/nodes/ws.rs` — but `broadcast` alone doesn't give
//! independent per-subscriber backlogs (once any receiver lags, it drops a
//! contiguous range for *everyone* and returns one `Lagged` error), so this
//! bus hand-rolls one bounded queue per subscriber with its own
//! drop-oldest policy and `lagged` counter.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use ws_domain::Event;

/// Queue depth per subscriber (§4.4: "bounded queue (capacity 64)").
pub const SUBSCRIBER_CAPACITY: usize = 64;

struct Subscriber {
    queue: Mutex<VecDeque<Event>>,
    notify: Notify,
    lagged: AtomicU64,
    closed: std::sync::atomic::AtomicBool,
}

/// A subscriber's read handle. Dropping it removes the subscriber from the
/// bus on the next publish (§4.4: "removed on queue close or socket error").
pub struct Subscription {
    session_id: String,
    id: u64,
    inner: Arc<Subscriber>,
    bus: EventBus,
}

impl Subscription {
    /// Await the next event, or `None` once the bus has been torn down for
    /// this session.
    pub async fn recv(&self) -> Option<Event> {
        loop {
            if let Some(event) = self.inner.queue.lock().pop_front() {
                return Some(event);
            }
            if self.inner.closed.load(Ordering::Acquire) {
                return None;
            }
            self.inner.notify.notified().await;
        }
    }

    /// Number of events dropped for this subscriber due to overflow.
    pub fn lagged(&self) -> u64 {
        self.inner.lagged.load(Ordering::Relaxed)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.session_id, self.id);
    }
}

#[derive(Default)]
struct SessionBus {
    next_id: u64,
    subscribers: HashMap<u64, Arc<Subscriber>>,
}

/// Process-wide registry of per-session buses. Cheap to clone (an `Arc`
/// internally); the gateway holds one instance in `AppState`.
#[derive(Clone, Default)]
pub struct EventBus {
    sessions: Arc<Mutex<HashMap<String, SessionBus>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber for `session_id` (a freshly-upgraded
    /// websocket connection, per §6.2).
    pub fn subscribe(&self, session_id: &str) -> Subscription {
        let inner = Arc::new(Subscriber {
            queue: Mutex::new(VecDeque::with_capacity(SUBSCRIBER_CAPACITY)),
            notify: Notify::new(),
            lagged: AtomicU64::new(0),
            closed: std::sync::atomic::AtomicBool::new(false),
        });

        let id = {
            let mut sessions = self.sessions.lock();
            let bus = sessions.entry(session_id.to_string()).or_default();
            let id = bus.next_id;
            bus.next_id += 1;
            bus.subscribers.insert(id, inner.clone());
            id
        };

        Subscription {
            session_id: session_id.to_string(),
            id,
            inner,
            bus: self.clone(),
        }
    }

    /// Publish an event to every live subscriber of `session_id`. Never
    /// blocks the publisher — a full subscriber queue drops its oldest
    /// entry and increments that subscriber's `lagged` counter instead.
    pub fn publish(&self, session_id: &str, event: Event) {
        let subs: Vec<Arc<Subscriber>> = {
            let sessions = self.sessions.lock();
            match sessions.get(session_id) {
                Some(bus) => bus.subscribers.values().cloned().collect(),
                None => return,
            }
        };

        for sub in subs {
            let mut queue = sub.queue.lock();
            if queue.len() >= SUBSCRIBER_CAPACITY {
                queue.pop_front();
                sub.lagged.fetch_add(1, Ordering::Relaxed);
            }
            queue.push_back(event.clone());
            drop(queue);
            sub.notify.notify_one();
        }
    }

    /// Number of live subscribers for `session_id` (diagnostics only).
    pub fn subscriber_count(&self, session_id: &str) -> usize {
        self.sessions
            .lock()
            .get(session_id)
            .map(|b| b.subscribers.len())
            .unwrap_or(0)
    }

    fn unsubscribe(&self, session_id: &str, id: u64) {
        let mut sessions = self.sessions.lock();
        if let Some(bus) = sessions.get_mut(session_id) {
            if let Some(sub) = bus.subscribers.remove(&id) {
                sub.closed.store(true, Ordering::Release);
                sub.notify.notify_one();
            }
            if bus.subscribers.is_empty() {
                sessions.remove(session_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_recv() {
        let bus = EventBus::new();
        let sub = bus.subscribe("s1");
        bus.publish("s1", Event::SessionState { running: true });
        let event = sub.recv().await.unwrap();
        matches!(event, Event::SessionState { running: true });
    }

    #[tokio::test]
    async fn subscribers_are_independent() {
        let bus = EventBus::new();
        let slow = bus.subscribe("s1");
        let fast = bus.subscribe("s1");

        for _ in 0..(SUBSCRIBER_CAPACITY + 5) {
            bus.publish("s1", Event::SessionState { running: true });
        }

        // Drain the fast subscriber entirely; the slow one's backlog is
        // independent and already holds its own dropped-oldest history.
        for _ in 0..SUBSCRIBER_CAPACITY {
            fast.recv().await.unwrap();
        }
        assert_eq!(slow.lagged(), 5);
    }

    #[tokio::test]
    async fn unsubscribe_on_drop_removes_session_entry() {
        let bus = EventBus::new();
        {
            let _sub = bus.subscribe("s1");
            assert_eq!(bus.subscriber_count("s1"), 1);
        }
        assert_eq!(bus.subscriber_count("s1"), 0);
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish("nobody-listening", Event::SessionState { running: false });
    }
}
