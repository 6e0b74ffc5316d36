//! Protocol module - JSON message types for the remote-control adapter
//!
//! Line-delimited JSON. Every message carries `type`, `seq` (sender-side
//! sequence number) and `ts` (milliseconds since the epoch).

use serde::{Deserialize, Serialize};

use crate::core::{Feedback, GameSnapshot};
use crate::types::{GameAction, SessionPhase, SlimeKind};

pub const PROTOCOL_VERSION: &str = "1.0.0";
pub const GAME_ID: &str = "slime-tap";

// ============== Client -> Game Messages ==============

/// Client hello message (first message on a connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    #[serde(default = "default_true")]
    pub stream_observations: bool,
    #[serde(default = "default_true")]
    pub stream_feedback: bool,
}

impl Default for RequestedCapabilities {
    fn default() -> Self {
        Self {
            stream_observations: true,
            stream_feedback: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Command message (controller only)
///
/// `tap` needs `x`/`y` in play-area pixels. With `id` it targets that drop,
/// without it the topmost drop under the point is hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMessage {
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    pub action: CommandAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandAction {
    Start,
    Reset,
    PlayAgain,
    Tap,
    Snapshot,
}

impl CommandAction {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandAction::Start => "start",
            CommandAction::Reset => "reset",
            CommandAction::PlayAgain => "playAgain",
            CommandAction::Tap => "tap",
            CommandAction::Snapshot => "snapshot",
        }
    }

    /// Session action, for the commands that map one to one.
    pub fn game_action(self) -> Option<GameAction> {
        match self {
            CommandAction::Start => Some(GameAction::Start),
            CommandAction::Reset => Some(GameAction::Reset),
            CommandAction::PlayAgain => Some(GameAction::PlayAgain),
            CommandAction::Tap | CommandAction::Snapshot => None,
        }
    }
}

impl<'de> Deserialize<'de> for CommandAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("start") {
            Ok(Self::Start)
        } else if s.eq_ignore_ascii_case("reset") {
            Ok(Self::Reset)
        } else if s.eq_ignore_ascii_case("playAgain") {
            Ok(Self::PlayAgain)
        } else if s.eq_ignore_ascii_case("tap") {
            Ok(Self::Tap)
        } else if s.eq_ignore_ascii_case("snapshot") {
            Ok(Self::Snapshot)
        } else {
            Err(serde::de::Error::custom("unknown action"))
        }
    }
}

impl Serialize for CommandAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Control message (claim/release controller status)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMessage {
    pub seq: u64,
    #[serde(default)]
    pub ts: u64,
    pub action: ControlAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Claim,
    Release,
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignedRole {
    Controller,
    Observer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    HandshakeRequired,
    ProtocolMismatch,
    NotController,
    ControllerActive,
    InvalidCommand,
    Backpressure,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<u64>,
    pub game_id: String,
    pub actions: Vec<CommandAction>,
}

/// Acknowledgment, sent once the game loop has applied a command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub status: String,
    /// False when the command was a no-op (invalid transition, missed tap).
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i32>,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

/// Session state observation (streamed to clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub phase: PhaseName,
    pub session_id: u32,
    pub score: u32,
    pub streak: u32,
    pub best_streak: u32,
    /// Seconds.
    pub time_remaining: f64,
    pub play_area: PlayArea,
    pub drops: Vec<DropView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultView>,
    pub state_hash: StateHash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseName {
    Idle,
    Running,
    Finished,
}

impl From<SessionPhase> for PhaseName {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::Idle => Self::Idle,
            SessionPhase::Running => Self::Running,
            SessionPhase::Finished => Self::Finished,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindName {
    Green,
    Yellow,
    Red,
    Blue,
    Purple,
}

impl From<SlimeKind> for KindName {
    fn from(value: SlimeKind) -> Self {
        match value {
            SlimeKind::Green => Self::Green,
            SlimeKind::Yellow => Self::Yellow,
            SlimeKind::Red => Self::Red,
            SlimeKind::Blue => Self::Blue,
            SlimeKind::Purple => Self::Purple,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayArea {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropView {
    pub id: u32,
    pub kind: KindName,
    pub x: f64,
    pub y: f64,
    pub vy: f64,
    pub footprint: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultView {
    pub final_score: u32,
    pub best_streak: u32,
}

/// Feedback event (streamed to clients as it happens)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    /// `positiveHit`, `criticalHit`, `negativeHit`, `miss` or `sessionEnd`.
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<KindName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultView>,
}

/// Deterministic state hash serialized as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut buf = [0u8; 16];
        let mut v = self.0;
        for i in 0..16 {
            buf[15 - i] = HEX[(v & 0x0f) as usize];
            v >>= 4;
        }
        let s = std::str::from_utf8(&buf).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        u64::from_str_radix(s.trim(), 16)
            .map(StateHash)
            .map_err(|_| serde::de::Error::custom("invalid hex"))
    }
}

// ============== Message Parsing ==============

#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Control(ControlMessage),
    /// Well-formed JSON with an unrecognized `type`.
    Unknown(serde_json::Value),
}

/// Parse one inbound line.
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type", rename_all = "lowercase")]
    enum InboundMessage {
        Hello(HelloMessage),
        Command(CommandMessage),
        Control(ControlMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Ok(InboundMessage::Control(m)) => Ok(ParsedMessage::Control(m)),
        Err(e) => {
            let value: serde_json::Value = serde_json::from_str(json)?;
            match value.get("type").and_then(|t| t.as_str()) {
                Some("hello") | Some("command") | Some("control") | None => Err(e),
                Some(_) => Ok(ParsedMessage::Unknown(value)),
            }
        }
    }
}

/// Best-effort `seq` for error replies to lines that failed to parse.
pub fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(u8::is_ascii_digit).count();
    rest[..end].parse::<u64>().ok()
}

// ============== Builders ==============

/// Current timestamp in milliseconds.
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Hello for a client. Used by tests and example clients.
pub fn create_hello(seq: u64, name: &str, protocol_version: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "hello",
        "seq": seq,
        "ts": now_ms(),
        "client": { "name": name, "version": "0.1.0" },
        "protocol_version": protocol_version,
        "requested": { "stream_observations": true, "stream_feedback": true },
    })
}

pub fn create_welcome(
    seq: u64,
    client_id: u64,
    role: AssignedRole,
    controller_id: Option<u64>,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: "welcome".to_string(),
        seq,
        ts: now_ms(),
        protocol_version: PROTOCOL_VERSION.to_string(),
        client_id,
        role,
        controller_id,
        game_id: GAME_ID.to_string(),
        actions: vec![
            CommandAction::Start,
            CommandAction::Reset,
            CommandAction::PlayAgain,
            CommandAction::Tap,
            CommandAction::Snapshot,
        ],
    }
}

pub fn create_ack(seq: u64, applied: bool, points: Option<i32>) -> AckMessage {
    AckMessage {
        msg_type: "ack".to_string(),
        seq,
        ts: now_ms(),
        status: "ok".to_string(),
        applied,
        points,
    }
}

pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: "error".to_string(),
        seq,
        ts: now_ms(),
        code,
        message: message.to_string(),
    }
}

/// Stable 64-bit FNV-1a over the observable session state.
pub fn state_hash(snap: &GameSnapshot) -> StateHash {
    StateHash(snap.fingerprint())
}

pub fn build_observation(snap: &GameSnapshot, seq: u64) -> ObservationMessage {
    ObservationMessage {
        msg_type: "observation".to_string(),
        seq,
        ts: now_ms(),
        phase: snap.phase.into(),
        session_id: snap.session_id,
        score: snap.score,
        streak: snap.streak,
        best_streak: snap.best_streak,
        time_remaining: snap.time_remaining(),
        play_area: PlayArea {
            width: snap.play_area_width,
            height: snap.play_area_height,
        },
        drops: snap
            .drops
            .iter()
            .map(|d| DropView {
                id: d.id.0,
                kind: d.kind.into(),
                x: d.x,
                y: d.y,
                vy: d.vy,
                footprint: d.footprint,
            })
            .collect(),
        result: snap.result.map(|r| ResultView {
            final_score: r.final_score,
            best_streak: r.best_streak,
        }),
        state_hash: state_hash(snap),
    }
}

pub fn build_feedback(feedback: &Feedback, seq: u64) -> FeedbackMessage {
    let mut msg = FeedbackMessage {
        msg_type: "feedback".to_string(),
        seq,
        ts: now_ms(),
        event: feedback.kind().as_str().to_string(),
        kind: None,
        points: feedback.points(),
        x: None,
        y: None,
        result: None,
    };
    if let Some((x, y)) = feedback.position() {
        msg.x = Some(x);
        msg.y = Some(y);
    }
    match *feedback {
        Feedback::PositiveHit { kind, .. }
        | Feedback::CriticalHit { kind, .. }
        | Feedback::NegativeHit { kind, .. }
        | Feedback::Miss { kind, .. } => msg.kind = Some(kind.into()),
        Feedback::SessionEnd(r) => {
            msg.result = Some(ResultView {
                final_score: r.final_score,
                best_streak: r.best_streak,
            })
        }
    }
    msg
}
