//! TCP server for the remote-control adapter
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage, SharedStatus};
use crate::types::ObjectId;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_pending_commands: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            max_pending_commands: 16,
        }
    }
}

impl ServerConfig {
    /// Create from `SLIME_AI_HOST`, `SLIME_AI_PORT` and `SLIME_AI_MAX_PENDING`.
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("SLIME_AI_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);
        let port = env::var("SLIME_AI_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let max_pending_commands = env::var("SLIME_AI_MAX_PENDING")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        Self {
            host,
            port,
            max_pending_commands,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid adapter address {}:{}", self.host, self.port))
    }
}

/// Check if the adapter is disabled via `SLIME_AI_DISABLED`.
pub fn is_disabled() -> bool {
    std::env::var("SLIME_AI_DISABLED")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: usize,
    pub addr: SocketAddr,
    pub is_controller: bool,
    pub stream_observations: bool,
    pub stream_feedback: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone)]
pub enum ClientOutbound {
    Welcome(WelcomeMessage),
    Ack(AckMessage),
    Error(ErrorMessage),
    Observation(ObservationMessage),
    Feedback(FeedbackMessage),
}

/// Shared server state
struct ServerState {
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<usize>>,
    status: Arc<SharedStatus>,
}

impl ServerState {
    fn new(status: Arc<SharedStatus>) -> Self {
        Self {
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
            status,
        }
    }

    async fn publish_status(&self) {
        let controller = *self.controller.read().await;
        let clients = self.clients.read().await;
        let streaming = clients
            .iter()
            .filter(|c| c.handshaken && c.stream_observations)
            .count();
        self.status.publish(clients.len(), streaming, controller);
    }

    async fn is_handshaken(&self, client_id: usize) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    async fn is_controller(&self, client_id: usize) -> bool {
        *self.controller.read().await == Some(client_id)
    }

    /// Enforce strictly increasing `seq` per client.
    async fn check_and_update_seq(&self, client_id: usize, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };
        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    async fn send_to(&self, client_id: usize, msg: ClientOutbound) {
        let clients = self.clients.read().await;
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.send(msg);
        }
    }
}

/// Start the TCP server with its own status counters.
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    serve(
        config,
        command_tx,
        out_rx,
        ready_tx,
        Arc::new(SharedStatus::default()),
    )
    .await
}

/// Start the TCP server, publishing client counts into `status`.
pub async fn serve(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
    status: Arc<SharedStatus>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding adapter on {addr}"))?;
    let bound = listener.local_addr()?;
    info!(%bound, "adapter listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(status));
    let mut client_id_counter = 0usize;

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match msg {
                    OutboundMessage::ToClientAck { client_id, ack } => {
                        state.send_to(client_id, ClientOutbound::Ack(ack)).await;
                    }
                    OutboundMessage::ToClientError { client_id, err } => {
                        state.send_to(client_id, ClientOutbound::Error(err)).await;
                    }
                    OutboundMessage::ToClientObservation { client_id, obs } => {
                        state
                            .send_to(client_id, ClientOutbound::Observation(obs))
                            .await;
                    }
                    OutboundMessage::BroadcastObservation { obs } => {
                        let clients = state.clients.read().await;
                        for c in clients.iter().filter(|c| c.handshaken && c.stream_observations) {
                            let _ = c.tx.send(ClientOutbound::Observation(obs.clone()));
                        }
                    }
                    OutboundMessage::BroadcastFeedback { feedback } => {
                        let clients = state.clients.read().await;
                        for c in clients.iter().filter(|c| c.handshaken && c.stream_feedback) {
                            let _ = c.tx.send(ClientOutbound::Feedback(feedback.clone()));
                        }
                    }
                }
            }
        });
    }

    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;
        info!(client_id, %addr, "client connected");

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, Arc::clone(&state), command_tx).await {
                warn!(client_id, error = %e, "client error");
            }
            info!(client_id, "client disconnected");
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    state.clients.write().await.push(ClientHandle {
        id: client_id,
        addr,
        is_controller: false,
        stream_observations: false,
        stream_feedback: false,
        handshaken: false,
        last_seq: None,
        tx: tx.clone(),
    });
    state.publish_status().await;

    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            let encoded = match &msg {
                ClientOutbound::Welcome(m) => serde_json::to_writer(&mut buf, m),
                ClientOutbound::Ack(m) => serde_json::to_writer(&mut buf, m),
                ClientOutbound::Error(m) => serde_json::to_writer(&mut buf, m),
                ClientOutbound::Observation(m) => serde_json::to_writer(&mut buf, m),
                ClientOutbound::Feedback(m) => serde_json::to_writer(&mut buf, m),
            };
            if encoded.is_err() {
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() || writer.flush().await.is_err() {
                break;
            }
        }
    });

    let reply_error = |seq: u64, code: ErrorCode, message: &str| {
        let _ = tx.send(ClientOutbound::Error(create_error(seq, code, message)));
    };

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        debug!(client_id, line = trimmed, "recv");

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, hello.seq).await
                {
                    reply_error(hello.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }

                if !hello.protocol_version.starts_with("1.") {
                    reply_error(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    break;
                }

                // First client to hello becomes controller.
                let controller_id = {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    if controller.is_none() {
                        *controller = Some(client_id);
                        info!(client_id, name = %hello.client.name, "client is now controller");
                    }
                    if let Some(c) = clients.iter_mut().find(|c| c.id == client_id) {
                        c.handshaken = true;
                        c.last_seq = Some(hello.seq);
                        c.is_controller = *controller == Some(client_id);
                        c.stream_observations = hello.requested.stream_observations;
                        c.stream_feedback = hello.requested.stream_feedback;
                    }
                    *controller
                };
                state.publish_status().await;

                let role = if controller_id == Some(client_id) {
                    AssignedRole::Controller
                } else {
                    AssignedRole::Observer
                };
                let welcome = create_welcome(
                    hello.seq,
                    client_id as u64,
                    role,
                    controller_id.map(|id| id as u64),
                );
                let _ = tx.send(ClientOutbound::Welcome(welcome));

                if hello.requested.stream_observations {
                    let _ = command_tx.try_send(InboundCommand {
                        client_id,
                        seq: hello.seq,
                        payload: InboundPayload::SnapshotRequest,
                    });
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if !state.is_handshaken(client_id).await {
                    reply_error(cmd.seq, ErrorCode::HandshakeRequired, "Send hello before command");
                    continue;
                }
                if !state.check_and_update_seq(client_id, cmd.seq).await {
                    reply_error(cmd.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }

                let payload = match map_command(&cmd) {
                    Ok(p) => p,
                    Err((code, message)) => {
                        reply_error(cmd.seq, code, &message);
                        continue;
                    }
                };

                // Observers may only ask for snapshots.
                if matches!(payload, InboundPayload::Command(_)) && !state.is_controller(client_id).await {
                    reply_error(cmd.seq, ErrorCode::NotController, "Only controller may send commands");
                    continue;
                }

                // Backpressure: bounded queue. The game loop acks once applied.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload,
                    })
                    .is_err()
                {
                    reply_error(cmd.seq, ErrorCode::Backpressure, "Command queue is full");
                }
            }

            Ok(ParsedMessage::Control(ctrl)) => {
                if !state.is_handshaken(client_id).await {
                    reply_error(ctrl.seq, ErrorCode::HandshakeRequired, "Send hello before control");
                    continue;
                }
                if !state.check_and_update_seq(client_id, ctrl.seq).await {
                    reply_error(ctrl.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }

                let granted = {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    let next = match ctrl.action {
                        ControlAction::Claim if controller.is_none() => Some(Some(client_id)),
                        ControlAction::Release if *controller == Some(client_id) => Some(None),
                        _ => None,
                    };
                    if let Some(next) = next {
                        *controller = next;
                        for c in clients.iter_mut() {
                            c.is_controller = next == Some(c.id);
                        }
                    }
                    next.is_some()
                };

                if granted {
                    state.publish_status().await;
                    let _ = tx.send(ClientOutbound::Ack(create_ack(ctrl.seq, true, None)));
                } else {
                    match ctrl.action {
                        ControlAction::Claim => {
                            reply_error(ctrl.seq, ErrorCode::ControllerActive, "Controller already assigned")
                        }
                        ControlAction::Release => {
                            reply_error(ctrl.seq, ErrorCode::NotController, "Only controller may release")
                        }
                    }
                }
            }

            Ok(ParsedMessage::Unknown(value)) => {
                let seq = value.get("seq").and_then(|v| v.as_u64()).unwrap_or(0);
                reply_error(seq, ErrorCode::InvalidCommand, "Unknown message type");
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                reply_error(seq, ErrorCode::InvalidCommand, &format!("JSON parse error: {e}"));
            }
        }
    }

    // Remove the client; promote the lowest remaining handshaken id if it held control.
    {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);

        if *controller == Some(client_id) {
            let next_id = clients.iter().filter(|c| c.handshaken).map(|c| c.id).min();
            *controller = next_id;
            if let Some(c) = next_id.and_then(|id| clients.iter_mut().find(|c| c.id == id)) {
                c.is_controller = true;
                info!(client_id = c.id, "controller promoted");
            } else {
                info!(client_id, "controller released");
            }
        }
    }
    state.publish_status().await;

    drop(reply_error);
    drop(tx);
    let _ = write_task.await;

    Ok(())
}

/// Map a protocol command into a game-loop payload.
fn map_command(cmd: &CommandMessage) -> Result<InboundPayload, (ErrorCode, String)> {
    match cmd.action {
        CommandAction::Snapshot => Ok(InboundPayload::SnapshotRequest),
        CommandAction::Tap => match (cmd.x, cmd.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => {
                Ok(InboundPayload::Command(ClientCommand::Tap {
                    id: cmd.id.map(ObjectId),
                    x,
                    y,
                }))
            }
            _ => Err((
                ErrorCode::InvalidCommand,
                "tap needs finite x and y".to_string(),
            )),
        },
        other => other
            .game_action()
            .map(|a| InboundPayload::Command(ClientCommand::Action(a)))
            .ok_or_else(|| {
                (
                    ErrorCode::InvalidCommand,
                    format!("Unsupported action: {}", other.as_str()),
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameAction;

    fn command(json: &str) -> CommandMessage {
        match parse_message(json).unwrap() {
            ParsedMessage::Command(c) => c,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn maps_session_actions() {
        let c = command(r#"{"type":"command","seq":1,"action":"playAgain"}"#);
        assert!(matches!(
            map_command(&c),
            Ok(InboundPayload::Command(ClientCommand::Action(GameAction::PlayAgain)))
        ));
    }

    #[test]
    fn maps_taps_with_and_without_target() {
        let c = command(r#"{"type":"command","seq":1,"action":"tap","x":10,"y":20,"id":3}"#);
        match map_command(&c) {
            Ok(InboundPayload::Command(ClientCommand::Tap { id, x, y })) => {
                assert_eq!(id, Some(ObjectId(3)));
                assert_eq!((x, y), (10.0, 20.0));
            }
            other => panic!("unexpected {other:?}"),
        }

        let c = command(r#"{"type":"command","seq":1,"action":"tap","x":10}"#);
        assert!(matches!(map_command(&c), Err((ErrorCode::InvalidCommand, _))));
    }

    #[test]
    fn snapshot_is_not_a_session_command() {
        let c = command(r#"{"type":"command","seq":1,"action":"snapshot"}"#);
        assert!(matches!(map_command(&c), Ok(InboundPayload::SnapshotRequest)));
    }

    #[test]
    fn default_config_parses_to_loopback() {
        let addr = ServerConfig::default().socket_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 7878);

        let bad = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn serve_reports_bad_address_before_ready() {
        let (cmd_tx, _cmd_rx) = mpsc::channel(1);
        let (_out_tx, out_rx) = mpsc::unbounded_channel();
        let (ready_tx, mut ready_rx) = oneshot::channel();
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };

        let res = tokio_test::block_on(run_server(config, cmd_tx, out_rx, Some(ready_tx)));
        assert!(res.is_err());
        assert!(ready_rx.try_recv().is_err());
    }
}
