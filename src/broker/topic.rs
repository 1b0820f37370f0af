//! A named topic: history ring, subscriber registry, fan-out.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use super::error::BrokerError;
use super::message::Message;
use super::subscriber::{EnqueueOutcome, SessionEvent, Subscriber};

struct Inner {
    history: VecDeque<Arc<Message>>,
    ring_size: usize,
    subscribers: HashMap<String, Subscriber>,
    total_published: u64,
}

/// A topic: a name, a bounded history ring, and the set of subscribers
/// currently bound to it. All mutation runs under a single lock so that
/// publish order, history append order, and fan-out order agree.
pub struct Topic {
    pub name: String,
    inner: Mutex<Inner>,
}

/// Point-in-time counters for the control API's `/stats` route.
#[derive(Debug, Clone, Serialize)]
pub struct TopicStats {
    pub name: String,
    pub ring_size: u64,
    pub subscriber_count: usize,
    pub history_len: usize,
    pub total_published: u64,
}

impl Topic {
    pub fn new(name: String, ring_size: usize) -> Self {
        Self {
            name,
            inner: Mutex::new(Inner {
                history: VecDeque::with_capacity(ring_size.min(256)),
                ring_size: ring_size.max(1),
                subscribers: HashMap::new(),
                total_published: 0,
            }),
        }
    }

    /// Bind a subscriber to this topic: a fresh `client_id` is admitted;
    /// the same session re-subscribing under the same `client_id` is a
    /// no-op; a *different* session claiming an already-bound `client_id`
    /// is rejected rather than silently replacing the prior subscriber.
    pub fn add_subscriber(&self, sub: Subscriber) -> Result<(), BrokerError> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.subscribers.get(&sub.client_id) {
            if existing.session_id == sub.session_id {
                return Ok(());
            }
            return Err(BrokerError::ClientIdTaken(sub.client_id));
        }
        inner.subscribers.insert(sub.client_id.clone(), sub);
        Ok(())
    }

    /// Remove a subscriber, e.g. on explicit `unsubscribe` or session close.
    pub fn remove_subscriber(&self, client_id: &str) -> bool {
        self.inner.lock().subscribers.remove(client_id).is_some()
    }

    pub fn has_subscriber(&self, client_id: &str) -> bool {
        self.inner.lock().subscribers.contains_key(client_id)
    }

    /// Append to history and fan out to every subscriber, ejecting any
    /// subscriber that crosses the slow-consumer threshold as a result.
    /// Ejection happens inside this same critical section, so a
    /// subsequent `publish` can never race ahead of an ejection triggered
    /// by an earlier one.
    pub fn publish(&self, msg: Arc<Message>) -> u64 {
        let mut inner = self.inner.lock();

        if inner.history.len() >= inner.ring_size {
            inner.history.pop_front();
        }
        inner.history.push_back(msg.clone());
        inner.total_published += 1;
        let seq = inner.total_published;

        let mut ejected: Vec<String> = Vec::new();
        for (client_id, sub) in inner.subscribers.iter_mut() {
            let outcome = sub.enqueue(msg.clone());
            if outcome == EnqueueOutcome::Displaced && sub.should_eject() {
                ejected.push(client_id.clone());
            }
        }

        for client_id in ejected {
            if let Some(sub) = inner.subscribers.remove(&client_id) {
                let _ = sub.session_tx().send(SessionEvent::SlowConsumerEject {
                    topic: self.name.clone(),
                    client_id,
                });
            }
        }

        seq
    }

    /// Drain everything currently buffered for one subscriber, in publish
    /// order. Called by the owning session's delivery loop after a
    /// `SessionEvent::Wake` for this `(topic, client_id)`.
    pub fn drain_subscriber(&self, client_id: &str) -> Vec<Arc<Message>> {
        let mut inner = self.inner.lock();
        match inner.subscribers.get_mut(client_id) {
            Some(sub) => sub.drain(),
            None => Vec::new(),
        }
    }

    /// Replay history. `n <= 0` returns the full ring.
    pub fn recent(&self, n: i64) -> Vec<Arc<Message>> {
        let inner = self.inner.lock();
        if n <= 0 {
            return inner.history.iter().cloned().collect();
        }
        let n = n as usize;
        let skip = inner.history.len().saturating_sub(n);
        inner.history.iter().skip(skip).cloned().collect()
    }

    /// Forcibly disconnect every subscriber, e.g. on topic delete or a
    /// shutdown drain-deadline expiry: each removed subscriber's session
    /// is sent `make(client_id)` before the subscriber itself is dropped.
    /// Returns the ids cleared, for logging.
    pub fn clear_subscribers(&self, make: impl Fn(&str) -> SessionEvent) -> Vec<(String, Uuid)> {
        let mut inner = self.inner.lock();
        inner
            .subscribers
            .drain()
            .map(|(client_id, sub)| {
                let _ = sub.session_tx().send(make(&client_id));
                (client_id, sub.session_id)
            })
            .collect()
    }

    /// Broadcast a session event (e.g. shutdown notice) to every current
    /// subscriber without removing them.
    pub fn broadcast_control(&self, make: impl Fn(&str) -> SessionEvent) {
        let inner = self.inner.lock();
        for (client_id, sub) in inner.subscribers.iter() {
            let _ = sub.session_tx().send(make(client_id));
        }
    }

    /// Total messages still buffered across all subscribers, used by the
    /// shutdown drain-wait to decide when it is safe to close.
    pub fn pending_messages(&self) -> usize {
        self.inner.lock().subscribers.values().map(|s| s.queue_len()).sum()
    }

    pub fn stats(&self) -> TopicStats {
        let inner = self.inner.lock();
        TopicStats {
            name: self.name.clone(),
            ring_size: inner.ring_size as u64,
            subscriber_count: inner.subscribers.len(),
            history_len: inner.history.len(),
            total_published: inner.total_published,
        }
    }
}
