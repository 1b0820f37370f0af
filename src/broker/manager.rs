//! Topic registry and shutdown state machine.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{info, warn};

use super::error::BrokerError;
use super::subscriber::SessionEvent;
use super::topic::{Topic, TopicStats};

/// RUNNING -> DRAINING -> CLOSED, one-way: once the latch trips it never
/// reverts, and no later state can move backwards to an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum ManagerState {
    Running = 0,
    Draining = 1,
    Closed = 2,
}

impl From<u8> for ManagerState {
    fn from(v: u8) -> Self {
        match v {
            0 => ManagerState::Running,
            1 => ManagerState::Draining,
            _ => ManagerState::Closed,
        }
    }
}

/// Tunables resolved from CLI/env at startup (see `core::config`).
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub default_ring_size: u64,
    pub max_ring_size: u64,
    pub subscriber_queue_size: usize,
    pub slow_consumer_threshold: u32,
}

/// One row of `GET /topics`.
#[derive(Debug, Clone, Serialize)]
pub struct TopicSummary {
    pub name: String,
    pub subscribers: usize,
    pub ring_buffer_size: u64,
    pub messages_in_history: usize,
    pub total_messages: u64,
}

/// `GET /health` response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub uptime_sec: u64,
    pub topics: usize,
    pub subscribers: usize,
    pub shutdown_initiated: bool,
}

pub struct TopicManager {
    topics: RwLock<HashMap<String, Arc<Topic>>>,
    config: ManagerConfig,
    start_time: Instant,
    state: AtomicU8,
}

impl TopicManager {
    pub fn new(config: ManagerConfig) -> Arc<Self> {
        Arc::new(Self {
            topics: RwLock::new(HashMap::new()),
            config,
            start_time: Instant::now(),
            state: AtomicU8::new(ManagerState::Running as u8),
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    fn state(&self) -> ManagerState {
        ManagerState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state() != ManagerState::Running
    }

    /// `true` if created, `false` if it already existed. `ring_size`
    /// defaults to the manager's configured default; an explicit override
    /// must fall within `1..=max_ring_size`.
    pub fn create_topic(&self, name: &str, ring_size: Option<u64>) -> Result<bool, BrokerError> {
        if self.is_shutting_down() {
            return Err(BrokerError::ShuttingDown);
        }
        let ring_size = ring_size.unwrap_or(self.config.default_ring_size);
        if ring_size == 0 || ring_size > self.config.max_ring_size {
            return Err(BrokerError::InvalidRingSize {
                got: ring_size,
                max: self.config.max_ring_size,
            });
        }

        let mut topics = self.topics.write();
        if topics.contains_key(name) {
            return Ok(false);
        }
        topics.insert(
            name.to_string(),
            Arc::new(Topic::new(name.to_string(), ring_size as usize)),
        );
        Ok(true)
    }

    /// Get-or-create, used by `subscribe`, which implicitly creates its
    /// topic if it doesn't already exist.
    pub fn get_or_create_topic(&self, name: &str) -> Result<Arc<Topic>, BrokerError> {
        loop {
            if let Some(topic) = self.topics.read().get(name).cloned() {
                return Ok(topic);
            }
            self.create_topic(name, None)?;
        }
    }

    pub fn get_topic(&self, name: &str) -> Option<Arc<Topic>> {
        self.topics.read().get(name).cloned()
    }

    /// Removes the topic and closes every subscriber's transport bound to
    /// it.
    pub fn delete_topic(&self, name: &str) -> bool {
        let removed = self.topics.write().remove(name);
        match removed {
            Some(topic) => {
                let cleared = topic.clear_subscribers(|client_id| SessionEvent::ForceClose {
                    topic: name.to_string(),
                    client_id: client_id.to_string(),
                });
                for (client_id, _session) in cleared {
                    warn!(topic = %name, client = %client_id, "subscriber disconnected: topic deleted");
                }
                true
            }
            None => false,
        }
    }

    pub fn list_topics(&self) -> Vec<TopicSummary> {
        self.topics
            .read()
            .values()
            .map(|topic| {
                let stats = topic.stats();
                TopicSummary {
                    name: stats.name,
                    subscribers: stats.subscriber_count,
                    ring_buffer_size: stats.ring_size,
                    messages_in_history: stats.history_len,
                    total_messages: stats.total_published,
                }
            })
            .collect()
    }

    pub fn stats(&self) -> Vec<TopicStats> {
        self.topics.read().values().map(|t| t.stats()).collect()
    }

    /// `true` once `initiate_shutdown` has run, for as long as the process
    /// lives — the latch never reverts.
    pub fn is_shutdown_initiated(&self) -> bool {
        self.state() != ManagerState::Running
    }

    pub fn health(&self) -> HealthSnapshot {
        let topics = self.topics.read();
        HealthSnapshot {
            uptime_sec: self.start_time.elapsed().as_secs(),
            topics: topics.len(),
            subscribers: topics.values().map(|t| t.stats().subscriber_count).sum(),
            shutdown_initiated: self.is_shutdown_initiated(),
        }
    }

    /// Enters DRAINING and tells every live subscriber, on every topic,
    /// that the server is going away. Idempotent.
    pub fn initiate_shutdown(&self) {
        if self
            .state
            .compare_exchange(
                ManagerState::Running as u8,
                ManagerState::Draining as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return;
        }
        info!("topic manager entering draining state");
        for topic in self.topics.read().values() {
            topic.broadcast_control(|_client_id| SessionEvent::ServerShuttingDown);
        }
    }

    fn total_pending(&self) -> usize {
        self.topics.read().values().map(|t| t.pending_messages()).sum()
    }

    /// Waits up to `timeout` for all subscriber queues to drain, then
    /// force-closes whatever remains and enters CLOSED. Mirrors
    /// `original_source/pubsub/state.py::_flush_all_queues`'s polling wait,
    /// coarsened to a drain-completion check rather than a hot-path
    /// message-processing loop.
    pub async fn shutdown(&self, timeout: Duration) {
        self.initiate_shutdown();

        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.all_queues_empty() {
                break;
            }
            sleep(Duration::from_millis(25)).await;
        }

        {
            let topics = self.topics.read();
            for topic in topics.values() {
                let cleared = topic.clear_subscribers(|client_id| SessionEvent::ForceClose {
                    topic: topic.name.clone(),
                    client_id: client_id.to_string(),
                });
                if !cleared.is_empty() {
                    warn!(topic = %topic.name, count = cleared.len(), "force-closing subscribers at shutdown deadline");
                }
            }
        }
        self.topics.write().clear();

        self.state.store(ManagerState::Closed as u8, Ordering::SeqCst);
        info!("topic manager closed");
    }

    fn all_queues_empty(&self) -> bool {
        self.total_pending() == 0
    }
}
