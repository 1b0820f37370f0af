//! Per-connection session: wire dispatch + delivery loop.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{info, warn};
use uuid::Uuid;

use crate::broker::{BrokerError, Message as BrokerMessage, SessionEvent, Topic, TopicManager};

use super::protocol::{ErrorCode, InboundFrame, OutboundFrame};

/// WebSocket close status codes used by this protocol.
mod close_status {
    pub const POLICY_VIOLATION: u16 = 1008;
    pub const GOING_AWAY: u16 = 1001;
}

struct Binding {
    topic: Arc<Topic>,
    client_id: String,
}

struct Session {
    id: Uuid,
    manager: Arc<TopicManager>,
    bindings: HashMap<String, Binding>,
}

/// Drives one WebSocket connection end to end: reads inbound frames,
/// dispatches them against the broker, and writes back whatever the
/// broker's fan-out wakes this session to deliver. Runs until the socket
/// closes, a protocol violation closes it, or the session is ejected.
pub async fn run(mut socket: WebSocket, manager: Arc<TopicManager>) {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let mut session = Session {
        id: Uuid::new_v4(),
        manager,
        bindings: HashMap::new(),
    };
    info!(session_id = %session.id, "session connected");

    loop {
        tokio::select! {
            event = events_rx.recv() => {
                match event {
                    Some(event) => {
                        if !handle_session_event(&mut socket, &mut session, event).await {
                            break;
                        }
                    }
                    None => break,
                }
            }

            frame = socket.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        if !handle_inbound(&mut socket, &mut session, &events_tx, &text).await {
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(session_id = %session.id, error = %err, "websocket read error");
                        break;
                    }
                }
            }
        }
    }

    for (_, binding) in session.bindings.drain() {
        binding.topic.remove_subscriber(&binding.client_id);
    }
    info!(session_id = %session.id, "session disconnected");
}

async fn send(socket: &mut WebSocket, frame: OutboundFrame) -> bool {
    socket.send(WsMessage::Text(frame.to_text().into())).await.is_ok()
}

async fn close_with(socket: &mut WebSocket, code: u16, reason: &'static str) {
    let _ = socket
        .send(WsMessage::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await;
}

/// What a [`SessionEvent`] means for this session: frames to write, in
/// order, and an optional close to perform afterward. Kept free of any
/// socket I/O so the decision can be unit-tested directly against a
/// `Session`'s bindings, without a real transport.
struct SessionAction {
    frames: Vec<OutboundFrame>,
    close: Option<(u16, &'static str)>,
}

impl SessionAction {
    fn none() -> Self {
        Self { frames: Vec::new(), close: None }
    }
}

/// Decide how this session should react to a broadcast from the broker.
/// Pure: mutates only `session.bindings`, never touches the transport.
fn decide_session_event(session: &mut Session, event: SessionEvent) -> SessionAction {
    match event {
        SessionEvent::Wake { topic, client_id } => {
            let Some(binding) = session.bindings.get(&topic) else {
                return SessionAction::none();
            };
            if binding.client_id != client_id {
                return SessionAction::none();
            }
            let frames = binding
                .topic
                .drain_subscriber(&client_id)
                .iter()
                .map(|msg| event_frame(&topic, msg))
                .collect();
            SessionAction { frames, close: None }
        }
        SessionEvent::SlowConsumerEject { topic, client_id } => {
            if session.bindings.get(&topic).map(|b| b.client_id.as_str()) != Some(client_id.as_str()) {
                return SessionAction::none();
            }
            session.bindings.remove(&topic);
            SessionAction {
                frames: vec![OutboundFrame::error(
                    None,
                    ErrorCode::SlowConsumer,
                    "Consumer too slow, disconnecting",
                )],
                close: Some((close_status::POLICY_VIOLATION, "slow consumer")),
            }
        }
        SessionEvent::ServerShuttingDown => SessionAction {
            frames: vec![OutboundFrame::info("Server shutting down gracefully", None, None)],
            close: None,
        },
        SessionEvent::ForceClose { topic, client_id } => {
            if session.bindings.get(&topic).map(|b| b.client_id.as_str()) != Some(client_id.as_str()) {
                return SessionAction::none();
            }
            session.bindings.remove(&topic);
            SessionAction {
                frames: Vec::new(),
                close: Some((close_status::GOING_AWAY, "topic closed")),
            }
        }
    }
}

/// Write out a [`SessionAction`]'s frames, then close the socket if asked.
/// Returns whether the session loop should keep running.
async fn apply_session_action(socket: &mut WebSocket, action: SessionAction) -> bool {
    for frame in action.frames {
        if !send(socket, frame).await {
            return false;
        }
    }
    if let Some((code, reason)) = action.close {
        close_with(socket, code, reason).await;
        return false;
    }
    true
}

async fn handle_session_event(socket: &mut WebSocket, session: &mut Session, event: SessionEvent) -> bool {
    let action = decide_session_event(session, event);
    apply_session_action(socket, action).await
}

async fn handle_inbound(
    socket: &mut WebSocket,
    session: &mut Session,
    events_tx: &UnboundedSender<SessionEvent>,
    text: &str,
) -> bool {
    let raw: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => {
            send(socket, OutboundFrame::error(None, ErrorCode::BadRequest, "malformed JSON frame")).await;
            return true;
        }
    };
    let request_id = raw.get("request_id").and_then(Value::as_str).map(str::to_string);

    let frame: InboundFrame = match serde_json::from_value(raw) {
        Ok(f) => f,
        Err(_) => {
            send(
                socket,
                OutboundFrame::error(request_id, ErrorCode::BadRequest, "unrecognized or malformed frame"),
            )
            .await;
            return true;
        }
    };

    if session.manager.is_shutting_down() {
        send(
            socket,
            OutboundFrame::error(request_id, ErrorCode::ServiceUnavailable, "server is shutting down"),
        )
        .await;
        close_with(socket, close_status::GOING_AWAY, "shutting down").await;
        return false;
    }

    match frame {
        InboundFrame::Ping { request_id } => {
            send(socket, OutboundFrame::pong(request_id)).await;
        }
        InboundFrame::Subscribe {
            topic,
            client_id,
            last_n,
            request_id,
        } => handle_subscribe(socket, session, events_tx, topic, client_id, last_n, request_id).await,
        InboundFrame::Unsubscribe {
            topic,
            client_id,
            request_id,
        } => handle_unsubscribe(socket, session, topic, client_id, request_id).await,
        InboundFrame::Publish {
            topic,
            message,
            request_id,
        } => handle_publish(socket, session, topic, message, request_id).await,
    }

    true
}

#[allow(clippy::too_many_arguments)]
async fn handle_subscribe(
    socket: &mut WebSocket,
    session: &mut Session,
    events_tx: &UnboundedSender<SessionEvent>,
    topic_name: String,
    client_id: String,
    last_n: Option<i64>,
    request_id: String,
) {
    let topic = match session.manager.get_or_create_topic(&topic_name) {
        Ok(topic) => topic,
        Err(BrokerError::ShuttingDown) => {
            send(
                socket,
                OutboundFrame::error(Some(request_id), ErrorCode::ServiceUnavailable, "server is shutting down"),
            )
            .await;
            return;
        }
        Err(err) => {
            send(socket, OutboundFrame::error(Some(request_id), ErrorCode::Internal, err.to_string())).await;
            return;
        }
    };

    let subscriber = crate::broker::Subscriber::new(
        client_id.clone(),
        session.id,
        topic_name.clone(),
        session.manager.config().subscriber_queue_size,
        session.manager.config().slow_consumer_threshold,
        events_tx.clone(),
    );
    if let Err(err) = topic.add_subscriber(subscriber) {
        send(socket, OutboundFrame::error(Some(request_id), ErrorCode::BadRequest, err.to_string())).await;
        return;
    }
    session.bindings.insert(
        topic_name.clone(),
        Binding {
            topic: topic.clone(),
            client_id: client_id.clone(),
        },
    );

    if let Some(n) = last_n {
        if n > 0 {
            for msg in topic.recent(n) {
                if !send(socket, event_frame(&topic_name, &msg)).await {
                    return;
                }
            }
        }
    }

    send(socket, OutboundFrame::ack(request_id, topic_name)).await;
}

async fn handle_unsubscribe(socket: &mut WebSocket, session: &mut Session, topic_name: String, client_id: String, request_id: String) {
    let removed = match session.manager.get_topic(&topic_name) {
        Some(topic) => topic.remove_subscriber(&client_id),
        None => false,
    };
    session.bindings.remove(&topic_name);

    if removed {
        send(socket, OutboundFrame::ack(request_id, topic_name)).await;
    } else {
        send(
            socket,
            OutboundFrame::error(Some(request_id), ErrorCode::TopicNotFound, format!("no such subscriber on topic '{topic_name}'")),
        )
        .await;
    }
}

async fn handle_publish(
    socket: &mut WebSocket,
    session: &mut Session,
    topic_name: String,
    message: super::protocol::InboundMessage,
    request_id: String,
) {
    let Ok(id) = Uuid::parse_str(&message.id) else {
        send(
            socket,
            OutboundFrame::error(Some(request_id), ErrorCode::BadRequest, "message.id must be a UUID"),
        )
        .await;
        return;
    };
    if !message.payload.is_object() {
        send(
            socket,
            OutboundFrame::error(Some(request_id), ErrorCode::BadRequest, "message.payload must be a JSON object"),
        )
        .await;
        return;
    }
    let Some(topic) = session.manager.get_topic(&topic_name) else {
        send(
            socket,
            OutboundFrame::error(Some(request_id), ErrorCode::TopicNotFound, format!("topic '{topic_name}' not found")),
        )
        .await;
        return;
    };

    topic.publish(Arc::new(BrokerMessage::new(id, message.payload)));
    send(socket, OutboundFrame::ack(request_id, topic_name)).await;
}

fn event_frame(topic: &str, msg: &BrokerMessage) -> OutboundFrame {
    OutboundFrame::Event {
        topic: topic.to_string(),
        message: super::protocol::WireMessage {
            id: msg.id.to_string(),
            payload: msg.payload.clone(),
        },
        ts: msg.timestamp,
    }
}
