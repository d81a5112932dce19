//! Per-connection WebSocket handler.
//!
//! Keeps WebSocket framing and heartbeats at the edge while pumping
//! notification frames from the connection registry. The public contract
//! pings every 5s and considers a connection idle after 10s without client
//! traffic. Tests shorten these intervals to speed up feedback; adjust the
//! constants below if SLAs change so clients and intermediaries stay
//! aligned.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time;
use tracing::{debug, warn};

use crate::domain::UserId;
use crate::inbound::ws::state::ConnectionRegistry;

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

pub(super) async fn handle_ws_session(
    registry: Arc<ConnectionRegistry>,
    user_id: UserId,
    session: Session,
    stream: MessageStream,
) {
    let (conn_id, outbound) = registry.register(user_id);
    debug!(user_id = %user_id, conn_id, "websocket connected");

    let reason = WsSession::new(outbound).run(session, stream).await;
    registry.unregister(&user_id, conn_id);
    debug!(user_id = %user_id, conn_id, ?reason, "websocket disconnected");
}

#[derive(Debug)]
enum SessionEnd {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    RegistryDropped,
    Network(Closed),
}

struct WsSession {
    outbound: UnboundedReceiver<String>,
}

impl WsSession {
    fn new(outbound: UnboundedReceiver<String>) -> Self {
        Self { outbound }
    }

    async fn run(mut self, mut session: Session, mut stream: MessageStream) -> SessionEnd {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        let end = loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::handle_heartbeat_tick(&mut session, last_heartbeat).await
                }
                frame = self.outbound.recv() => {
                    Self::handle_outbound_frame(&mut session, frame).await
                }
                message = stream.recv() => {
                    Self::handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
            };

            if let Err(end) = result {
                break end;
            }
        };

        match &end {
            SessionEnd::ClientClosed(reason) => {
                let _ = session.close(reason.clone()).await;
            }
            SessionEnd::HeartbeatTimeout => {
                warn!("websocket heartbeat timeout");
                let _ = session.close(None).await;
            }
            SessionEnd::Protocol(error) => {
                warn!(error = %error, "websocket protocol error");
                let _ = session.close(None).await;
            }
            SessionEnd::StreamClosed | SessionEnd::RegistryDropped | SessionEnd::Network(_) => {}
        }
        end
    }

    async fn handle_heartbeat_tick(
        session: &mut Session,
        last_heartbeat: Instant,
    ) -> Result<(), SessionEnd> {
        if Instant::now().duration_since(last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionEnd::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(SessionEnd::Network)
    }

    async fn handle_outbound_frame(
        session: &mut Session,
        frame: Option<String>,
    ) -> Result<(), SessionEnd> {
        let Some(frame) = frame else {
            return Err(SessionEnd::RegistryDropped);
        };
        session.text(frame).await.map_err(SessionEnd::Network)
    }

    async fn handle_stream_message(
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionEnd> {
        let Some(message) = message else {
            return Err(SessionEnd::StreamClosed);
        };

        match message {
            Ok(Message::Ping(payload)) => {
                *last_heartbeat = Instant::now();
                session.pong(&payload).await.map_err(SessionEnd::Network)
            }
            // Clients only listen on this socket; inbound text is treated
            // as liveness traffic and otherwise ignored.
            Ok(
                Message::Text(_)
                | Message::Pong(_)
                | Message::Binary(_)
                | Message::Continuation(_)
                | Message::Nop,
            ) => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Ok(Message::Close(reason)) => Err(SessionEnd::ClientClosed(reason)),
            Err(error) => Err(SessionEnd::Protocol(error)),
        }
    }
}
