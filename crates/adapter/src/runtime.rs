//! Adapter runtime integration.
//!
//! Bridges the synchronous game loop with the async TCP server: the server
//! queues [`InboundCommand`]s, the loop applies them to its session and sends
//! back [`OutboundMessage`]s.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::core::{Collaborators, Feedback, GameSnapshot, Scheduler, Session, TokenId};
use crate::protocol::{build_feedback, build_observation, create_ack, ObservationMessage};
use crate::protocol::{AckMessage, ErrorMessage, FeedbackMessage};
use crate::server::{is_disabled, serve, ServerConfig};
use crate::types::{GameAction, ObjectId, SlimeKind};

/// Command delivered to the game loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone)]
pub enum InboundPayload {
    Command(ClientCommand),
    /// Send the requesting client a fresh observation.
    SnapshotRequest,
}

/// Session command from the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Action(GameAction),
    Tap {
        id: Option<ObjectId>,
        x: f64,
        y: f64,
    },
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClientAck { client_id: usize, ack: AckMessage },
    ToClientError { client_id: usize, err: ErrorMessage },
    ToClientObservation { client_id: usize, obs: ObservationMessage },
    BroadcastObservation { obs: ObservationMessage },
    BroadcastFeedback { feedback: FeedbackMessage },
}

/// Connection counters published by the server for the HUD.
#[derive(Debug, Default)]
pub struct SharedStatus {
    clients: AtomicUsize,
    streaming: AtomicUsize,
    /// Controller client id, 0 when none.
    controller: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    pub client_count: usize,
    pub streaming_count: usize,
    pub controller_id: Option<usize>,
}

impl SharedStatus {
    pub fn publish(&self, clients: usize, streaming: usize, controller: Option<usize>) {
        self.clients.store(clients, Ordering::Relaxed);
        self.streaming.store(streaming, Ordering::Relaxed);
        self.controller.store(controller.unwrap_or(0), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let controller = self.controller.load(Ordering::Relaxed);
        StatusSnapshot {
            client_count: self.clients.load(Ordering::Relaxed),
            streaming_count: self.streaming.load(Ordering::Relaxed),
            controller_id: (controller != 0).then_some(controller),
        }
    }
}

/// Apply one inbound command to the session and build the reply.
pub fn apply_inbound<S: Scheduler>(
    session: &mut Session<S>,
    cmd: &InboundCommand,
    collab: &mut impl Collaborators,
    obs_seq: u64,
) -> OutboundMessage {
    let client_id = cmd.client_id;
    match &cmd.payload {
        InboundPayload::SnapshotRequest => OutboundMessage::ToClientObservation {
            client_id,
            obs: build_observation(&session.snapshot(), obs_seq),
        },
        InboundPayload::Command(ClientCommand::Action(action)) => {
            let applied = session.apply_action(*action, collab);
            OutboundMessage::ToClientAck {
                client_id,
                ack: create_ack(cmd.seq, applied, None),
            }
        }
        InboundPayload::Command(ClientCommand::Tap { id, x, y }) => {
            let outcome = match id {
                Some(id) => session.tap(*id, *x, *y, collab),
                None => session.tap_at(*x, *y, collab),
            };
            OutboundMessage::ToClientAck {
                client_id,
                ack: create_ack(cmd.seq, outcome.is_some(), outcome.map(|o| o.points)),
            }
        }
    }
}

/// Decides when to broadcast an observation.
///
/// Sends on state change, no more often than `min_interval_ms`, and at least
/// every `keepalive_ms`.
#[derive(Debug, Clone)]
pub struct ObservationPacer {
    min_interval_ms: u64,
    keepalive_ms: u64,
    last: Option<(u64, u64)>,
    seq: u64,
}

impl ObservationPacer {
    pub fn new(min_interval_ms: u64, keepalive_ms: u64) -> Self {
        Self {
            min_interval_ms,
            keepalive_ms,
            last: None,
            seq: 0,
        }
    }

    /// Next outbound sequence number (shared by observations and feedback).
    pub fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    pub fn poll(&mut self, now_ms: u64, snap: &GameSnapshot) -> Option<ObservationMessage> {
        let hash = snap.fingerprint();
        let due = match self.last {
            None => true,
            Some((at, last_hash)) => {
                let since = now_ms.saturating_sub(at);
                (last_hash != hash && since >= self.min_interval_ms) || since >= self.keepalive_ms
            }
        };
        if !due {
            return None;
        }
        self.last = Some((now_ms, hash));
        let seq = self.next_seq();
        Some(build_observation(snap, seq))
    }
}

/// Collaborator wrapper that forwards every call and keeps a copy of each
/// feedback event for broadcasting.
#[derive(Debug)]
pub struct FeedbackTap<C> {
    pub inner: C,
    pending: Vec<Feedback>,
}

impl<C: Collaborators> FeedbackTap<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            pending: Vec::with_capacity(16),
        }
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, Feedback> {
        self.pending.drain(..)
    }

    /// Broadcast pending feedback through `adapter`, or drop it when there is none.
    pub fn flush(&mut self, adapter: Option<&Adapter>, pacer: &mut ObservationPacer) {
        let Some(adapter) = adapter else {
            self.pending.clear();
            return;
        };
        for fb in self.pending.drain(..) {
            let seq = pacer.next_seq();
            adapter.send(OutboundMessage::BroadcastFeedback {
                feedback: build_feedback(&fb, seq),
            });
        }
    }
}

impl<C: Collaborators> Collaborators for FeedbackTap<C> {
    fn create_token(&mut self, id: ObjectId, kind: SlimeKind, x: f64, y: f64, footprint: f64) -> TokenId {
        self.inner.create_token(id, kind, x, y, footprint)
    }

    fn update_token_position(&mut self, token: TokenId, x: f64, y: f64) {
        self.inner.update_token_position(token, x, y);
    }

    fn remove_token(&mut self, token: TokenId) {
        self.inner.remove_token(token);
    }

    fn emit_feedback(&mut self, feedback: Feedback) {
        self.pending.push(feedback);
        self.inner.emit_feedback(feedback);
    }

    fn request_haptic(&mut self, intensity_ms: u16) {
        self.inner.request_haptic(intensity_ms);
    }

    fn refresh(&mut self, hud: crate::core::Hud) {
        self.inner.refresh(hud);
    }
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    status: Arc<SharedStatus>,
    addr: SocketAddr,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns `Ok(None)` if `SLIME_AI_DISABLED` is set.
    pub fn start_from_env() -> anyhow::Result<Option<Self>> {
        if is_disabled() {
            info!("adapter disabled via SLIME_AI_DISABLED");
            return Ok(None);
        }
        Self::start(ServerConfig::from_env()).map(Some)
    }

    /// Start the server on its own runtime and wait until it is listening.
    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let (ready_tx, ready_rx) = oneshot::channel();
        let status = Arc::new(SharedStatus::default());

        let rt = Runtime::new().context("creating adapter runtime")?;
        let server = rt.spawn(serve(config, cmd_tx, out_rx, Some(ready_tx), Arc::clone(&status)));

        let addr = match rt.block_on(ready_rx) {
            Ok(addr) => addr,
            Err(_) => {
                // The server exited before binding; surface its error.
                return match rt.block_on(server) {
                    Ok(Err(e)) => Err(e),
                    Ok(Ok(())) => Err(anyhow::anyhow!("adapter server exited early")),
                    Err(e) => Err(e.into()),
                };
            }
        };

        {
            let handle = rt.handle().clone();
            handle.spawn(async move {
                if let Ok(Err(e)) = server.await {
                    warn!(error = %e, "adapter server stopped");
                }
            });
        }

        Ok(Self {
            _rt: rt,
            cmd_rx,
            out_tx,
            status,
            addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }
}
