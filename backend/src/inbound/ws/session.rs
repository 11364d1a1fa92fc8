//! Per-connection WebSocket loop.
//!
//! Connections are push-only: the server forwards whatever its
//! [`PushSource`] yields and keeps the socket alive with pings. The public
//! contract pings every 5s and drops a connection after 10s without client
//! traffic. Tests shorten both intervals.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::ports::MatchResult;
use crate::domain::{LiveQuery, LiveSnapshot, Subscription};
use crate::inbound::ws::messages::{FeedFrame, MatchSnapshotFrame};

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Where a connection's outbound frames come from.
pub(super) enum PushSource {
    /// Raw change events for one filter.
    Feed(Subscription),
    /// Refreshed match lists. The live query is held so its refresh task
    /// lives exactly as long as the connection.
    Matches {
        _live: LiveQuery<MatchResult>,
        snapshots: watch::Receiver<Option<LiveSnapshot<MatchResult>>>,
    },
}

impl PushSource {
    pub(super) fn matches(live: LiveQuery<MatchResult>) -> Self {
        let snapshots = live.watch();
        Self::Matches {
            _live: live,
            snapshots,
        }
    }

    /// Next frame to push, or `None` once the source has closed.
    async fn next(&mut self) -> Option<Push> {
        match self {
            Self::Feed(subscription) => subscription.recv().await.map(|notice| {
                match FeedFrame::from(notice) {
                    FeedFrame::Change(envelope) => Push::json(&envelope, false),
                    FeedFrame::Notice(frame) => {
                        let terminal = frame.notice == "lost";
                        Push::json(&frame, terminal)
                    }
                }
            }),
            Self::Matches { snapshots, .. } => loop {
                if snapshots.changed().await.is_err() {
                    return None;
                }
                let latest = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    return Some(Push::json(&MatchSnapshotFrame::from(snapshot), false));
                }
            },
        }
    }
}

struct Push {
    body: Option<String>,
    terminal: bool,
}

impl Push {
    fn json<T: serde::Serialize>(payload: &T, terminal: bool) -> Self {
        let body = match serde_json::to_string(payload) {
            Ok(body) => Some(body),
            Err(error) => {
                warn!(error = %error, "Failed to serialize WebSocket payload");
                None
            }
        };
        Self { body, terminal }
    }
}

pub(super) async fn handle_ws_session(source: PushSource, session: Session, stream: MessageStream) {
    WsSession::new(source).run(session, stream).await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    FeedClosed,
    FeedLost,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct WsSession {
    source: PushSource,
}

impl WsSession {
    fn new(source: PushSource) -> Self {
        Self { source }
    }

    async fn run(mut self, mut session: Session, mut stream: MessageStream) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                message = stream.recv() => {
                    handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
                push = self.source.next() => {
                    handle_push(&mut session, push).await
                }
            };

            if let Err(error) = result {
                log_shutdown_reason(&error);
                close_session_if_needed(session, close_action_for(&error)).await;
                return;
            }
        }
    }
}

async fn handle_heartbeat_tick(
    session: &mut Session,
    last_heartbeat: &Instant,
) -> Result<(), SessionError> {
    if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
        return Err(SessionError::HeartbeatTimeout);
    }

    session.ping(b"").await.map_err(SessionError::Network)
}

async fn handle_stream_message(
    session: &mut Session,
    last_heartbeat: &mut Instant,
    message: Option<Result<Message, ProtocolError>>,
) -> Result<(), SessionError> {
    let Some(message) = message else {
        return Err(SessionError::StreamClosed);
    };

    match message {
        Ok(Message::Ping(payload)) => {
            *last_heartbeat = Instant::now();
            session.pong(&payload).await.map_err(SessionError::Network)
        }
        Ok(Message::Close(reason)) => Err(SessionError::ClientClosed(reason)),
        Ok(Message::Text(_) | Message::Binary(_)) => {
            // Push-only stream; inbound data only counts as liveness.
            *last_heartbeat = Instant::now();
            debug!("Ignoring client data frame");
            Ok(())
        }
        Ok(Message::Pong(_) | Message::Continuation(_) | Message::Nop) => {
            *last_heartbeat = Instant::now();
            Ok(())
        }
        Err(error) => Err(SessionError::Protocol(error)),
    }
}

async fn handle_push(session: &mut Session, push: Option<Push>) -> Result<(), SessionError> {
    let Some(push) = push else {
        return Err(SessionError::FeedClosed);
    };
    if let Some(body) = push.body {
        session.text(body).await.map_err(SessionError::Network)?;
    }
    if push.terminal {
        return Err(SessionError::FeedLost);
    }
    Ok(())
}

fn log_shutdown_reason(error: &SessionError) {
    match error {
        SessionError::HeartbeatTimeout => {
            warn!("WebSocket heartbeat timeout; closing connection");
        }
        SessionError::Protocol(error) => {
            warn!(error = %error, "WebSocket protocol error");
        }
        SessionError::Network(error) => {
            warn!(error = %error, "WebSocket send failed; closing connection");
        }
        SessionError::FeedLost => {
            warn!("Change feed lost; closing connection");
        }
        SessionError::FeedClosed => {
            info!("Change feed closed; closing connection");
        }
        SessionError::ClientClosed(_) | SessionError::StreamClosed => {}
    }
}

fn close_action_for(error: &SessionError) -> CloseAction {
    match error {
        SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Normal,
            description: Some("heartbeat timeout".to_owned()),
        })),
        SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Protocol,
            description: Some("protocol error".to_owned()),
        })),
        SessionError::FeedLost => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Again,
            description: Some("change feed lost".to_owned()),
        })),
        SessionError::FeedClosed => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Away,
            description: Some("change feed closed".to_owned()),
        })),
        SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
        SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
    }
}

async fn close_session_if_needed(session: Session, close_action: CloseAction) {
    if let CloseAction::Close(reason) = close_action
        && let Err(error) = session.close(reason).await
    {
        warn!(error = %error, "Failed to close WebSocket session");
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
