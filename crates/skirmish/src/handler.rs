//! Per-connection handler: handshake, request loop, and outbound plumbing.
//!
//! Flow for each accepted connection:
//!   1. WebSocket upgrade.
//!   2. First frame must be `Hello` → version check → authenticate → `Welcome`.
//!   3. Request loop: decode `ClientRequest`, call the service, reply.
//!
//! Outbound traffic (direct replies, roster broadcasts, targeted events)
//! funnels through one channel into a single writer task, so frames never
//! interleave. Connection loss, clean close, or idling out all end in the
//! same place: an implicit leave for the player.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::{SplitStream, StreamExt};
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use skirmish_protocol::{
    ClientRequest, Codec, JsonCodec, PROTOCOL_VERSION, PlayerId, ProtocolError, ServerEvent,
};
use skirmish_sync::SyncOutbound;

use crate::server::ServerState;
use crate::{Authenticator, SessionContext, SkirmishError};

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;
type OutboundSender = mpsc::UnboundedSender<Message>;

/// Drop guard: when the handler exits for any reason, the player leaves
/// the room. `Drop` is synchronous, so the async leave runs in a
/// fire-and-forget task.
struct ConnectionGuard<A: Authenticator> {
    ctx: SessionContext,
    state: Arc<ServerState<A>>,
}

impl<A: Authenticator> Drop for ConnectionGuard<A> {
    fn drop(&mut self) {
        let ctx = self.ctx.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.service.leave_game(&ctx).await;
        });
    }
}

/// Handles a single connection from upgrade to close.
pub(crate) async fn handle_connection<A: Authenticator>(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState<A>>,
) -> Result<(), SkirmishError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    tracing::debug!(%peer, "accepted websocket connection");

    let (mut sink, mut frames) = ws.split();

    // Single writer task; everything outbound goes through this channel.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let player_id = perform_handshake(&mut frames, &out_tx, &state).await?;
    tracing::info!(%peer, player = %player_id, "player authenticated");

    let ctx = SessionContext::for_default_room(player_id);
    let _guard = ConnectionGuard {
        ctx: ctx.clone(),
        state: Arc::clone(&state),
    };

    loop {
        let frame = match tokio::time::timeout(state.config.idle_timeout, frames.next()).await {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(err))) => {
                tracing::debug!(player = %ctx.player, error = %err, "recv error");
                break;
            }
            Ok(None) => {
                tracing::info!(player = %ctx.player, "connection closed");
                break;
            }
            Err(_) => {
                tracing::info!(player = %ctx.player, "connection idle, dropping");
                break;
            }
        };

        let data: Vec<u8> = match frame {
            Message::Binary(data) => data.into(),
            Message::Text(text) => text.as_bytes().to_vec(),
            Message::Close(_) => break,
            _ => continue, // ping/pong
        };

        let request: ClientRequest = match state.codec.decode(&data) {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(player = %ctx.player, error = %err, "undecodable frame");
                send_event(
                    &state.codec,
                    &out_tx,
                    &ServerEvent::Error {
                        code: 400,
                        message: "malformed request".to_string(),
                    },
                );
                continue;
            }
        };

        handle_request(&state, &ctx, &out_tx, request).await;
    }

    // _guard drops here → implicit leave fires.
    Ok(())
}

/// Receives `Hello`, checks the version, authenticates, sends `Welcome`.
async fn perform_handshake<A: Authenticator>(
    frames: &mut SplitStream<WsStream>,
    out_tx: &OutboundSender,
    state: &Arc<ServerState<A>>,
) -> Result<PlayerId, SkirmishError> {
    let frame = match tokio::time::timeout(state.config.handshake_timeout, frames.next()).await {
        Ok(Some(Ok(frame))) => frame,
        Ok(Some(Err(err))) => return Err(err.into()),
        Ok(None) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before Hello".into(),
            )
            .into());
        }
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let data: Vec<u8> = match frame {
        Message::Binary(data) => data.into(),
        Message::Text(text) => text.as_bytes().to_vec(),
        _ => {
            return Err(ProtocolError::InvalidMessage(
                "expected a data frame".into(),
            )
            .into());
        }
    };

    let (version, token) = match state.codec.decode(&data)? {
        ClientRequest::Hello { version, token } => (version, token),
        _ => {
            send_error(&state.codec, out_tx, 400, "expected Hello");
            return Err(ProtocolError::InvalidMessage(
                "first message must be Hello".into(),
            )
            .into());
        }
    };

    if version != PROTOCOL_VERSION {
        send_error(
            &state.codec,
            out_tx,
            400,
            &format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        );
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let token = token.unwrap_or_default();
    let player_id = match state.auth.authenticate(&token).await {
        Ok(id) => id,
        Err(err) => {
            send_error(&state.codec, out_tx, 401, "unauthorized");
            return Err(err.into());
        }
    };

    send_event(
        &state.codec,
        out_tx,
        &ServerEvent::Welcome {
            player_id: player_id.clone(),
        },
    );
    Ok(player_id)
}

/// Dispatches one decoded request to the service and replies.
async fn handle_request<A: Authenticator>(
    state: &Arc<ServerState<A>>,
    ctx: &SessionContext,
    out_tx: &OutboundSender,
    request: ClientRequest,
) {
    let event = match request {
        ClientRequest::Hello { .. } => ServerEvent::Error {
            code: 400,
            message: "already connected".to_string(),
        },

        ClientRequest::JoinGame { nickname } => {
            // Subscribe before joining so the joiner's first roster
            // broadcast already includes themselves, but start forwarding
            // only after the JoinResult is queued — the reply always
            // reaches the client before any broadcast.
            let rx = state.service.subscribe(ctx).await;
            let reply = state.service.join_game(ctx, nickname.as_deref()).await;
            send_event(&state.codec, out_tx, &ServerEvent::JoinResult(reply));
            spawn_forwarder(state.codec, rx, out_tx.clone());
            return;
        }

        ClientRequest::LeaveGame => {
            ServerEvent::LeaveResult(state.service.leave_game(ctx).await)
        }

        ClientRequest::UpdateState { state: update } => {
            ServerEvent::UpdateResult(state.service.update_player_state(ctx, update).await)
        }

        ClientRequest::Attack { target } => {
            ServerEvent::AttackResult(state.service.attack_player(ctx, &target).await)
        }

        ClientRequest::Respawn => {
            ServerEvent::RespawnResult(state.service.respawn_player(ctx).await)
        }

        ClientRequest::GetPlayers => {
            ServerEvent::Players(state.service.get_all_players(ctx).await)
        }
    };

    send_event(&state.codec, out_tx, &event);
}

/// Forwards one subscription's traffic into the connection's writer
/// channel. Ends on its own when the subscription is replaced or removed
/// (the sender side drops) or when the connection goes away.
fn spawn_forwarder(
    codec: JsonCodec,
    mut rx: mpsc::UnboundedReceiver<SyncOutbound>,
    out_tx: OutboundSender,
) {
    tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let event = match outbound {
                SyncOutbound::Roster(players) => ServerEvent::Roster { players },
                SyncOutbound::Event(event) => event,
            };
            if !send_event(&codec, &out_tx, &event) {
                break;
            }
        }
    });
}

/// Encodes an event into the writer channel. Returns `false` once the
/// connection's writer is gone.
fn send_event(codec: &JsonCodec, out_tx: &OutboundSender, event: &ServerEvent) -> bool {
    match codec.encode(event) {
        Ok(bytes) => out_tx.send(Message::Binary(bytes.into())).is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to encode outbound event");
            false
        }
    }
}

fn send_error(codec: &JsonCodec, out_tx: &OutboundSender, code: u16, message: &str) {
    send_event(
        codec,
        out_tx,
        &ServerEvent::Error {
            code,
            message: message.to_string(),
        },
    );
}
