//! Per-session sink on a topic.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use super::message::Message;

/// Everything a Topic needs to tell a session about, pushed through one
/// unbounded channel shared by every Subscriber the session owns (one per
/// topic it is subscribed to). Keeps the session's delivery loop a fixed
/// two-way `tokio::select!` (socket, this channel) no matter how many
/// topics it is bound to.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// New messages are ready to drain for `(topic, client_id)`.
    Wake { topic: String, client_id: String },
    /// This subscriber crossed the slow-consumer threshold and has been
    /// removed from the topic's registry. The session must emit
    /// `error{code:"SLOW_CONSUMER"}` and close the transport with 1008.
    SlowConsumerEject { topic: String, client_id: String },
    /// The server is entering its drain period. The session should emit
    /// an `info` frame; the subscriber stays bound until the topic is
    /// force-cleared at the shutdown deadline.
    ServerShuttingDown,
    /// This subscriber's topic is gone — either `delete_topic` removed it,
    /// or the shutdown drain deadline expired and it was force-cleared.
    /// The session must close the transport with 1001 "going away".
    ForceClose { topic: String, client_id: String },
}

/// Outcome of a single `enqueue` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Delivered,
    Displaced,
}

/// A session's sink on one topic.
///
/// `queue` is the actual bounded backpressure buffer (capacity `Q`):
/// messages sit here, guarded by the owning `Topic`'s lock, until the
/// session's delivery loop drains them. It is not a channel — this is what
/// lets `enqueue` implement drop-oldest without losing track of exactly how
/// many messages are currently buffered (the invariant `0 <= queue.len <= Q`
/// would be meaningless if admission fed straight into an unbounded
/// channel).
pub struct Subscriber {
    pub client_id: String,
    /// Identifies the session that owns this subscriber, so a later
    /// `subscribe` from the same session can be told apart from one
    /// originating elsewhere (see DESIGN.md: duplicate client_id policy).
    pub session_id: Uuid,
    topic: String,
    queue: VecDeque<Arc<Message>>,
    capacity: usize,
    pub drop_count: u32,
    slow_threshold: u32,
    session_tx: UnboundedSender<SessionEvent>,
}

impl Subscriber {
    pub fn new(
        client_id: String,
        session_id: Uuid,
        topic: String,
        capacity: usize,
        slow_threshold: u32,
        session_tx: UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            client_id,
            session_id,
            topic,
            queue: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
            drop_count: 0,
            slow_threshold,
            session_tx,
        }
    }

    /// Non-blocking drop-oldest admission.
    pub fn enqueue(&mut self, msg: Arc<Message>) -> EnqueueOutcome {
        let outcome = if self.queue.len() < self.capacity {
            self.queue.push_back(msg);
            self.drop_count = 0;
            EnqueueOutcome::Delivered
        } else {
            self.queue.pop_front();
            self.queue.push_back(msg);
            self.drop_count += 1;
            EnqueueOutcome::Displaced
        };
        let _ = self.session_tx.send(SessionEvent::Wake {
            topic: self.topic.clone(),
            client_id: self.client_id.clone(),
        });
        outcome
    }

    /// Whether this subscriber has crossed the slow-consumer threshold.
    pub fn should_eject(&self) -> bool {
        self.drop_count >= self.slow_threshold
    }

    /// Drain everything currently buffered, oldest first, clearing the queue.
    pub fn drain(&mut self) -> Vec<Arc<Message>> {
        self.queue.drain(..).collect()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Best-effort, non-blocking session signal. Send errors (the session
    /// already disconnected) are swallowed by the caller — ejection and
    /// shutdown notices are logged and ignored, never allowed to block or
    /// fail a later delivery.
    pub fn session_tx(&self) -> &UnboundedSender<SessionEvent> {
        &self.session_tx
    }
}
