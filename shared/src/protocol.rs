//! JSON wire contract with the relay server
//!
//! Every frame is a WebSocket text message shaped `{"event": <name>, "data": <payload>}`.
//! Roster entries are kept as raw JSON until the reconciler consumes them so a single
//! malformed entry never poisons the rest of a snapshot.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const SERVER_EVENTS: [&str; 4] = [
    "your_id",
    "player_update",
    "advance_level",
    "leaderboard_update",
];

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    #[error("malformed roster entry for peer {id}: {source}")]
    MalformedEntry {
        id: PeerId,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected event `{0}`")]
    UnknownEvent(String),
}

/// Server-assigned peer identity
///
/// The relay may hand out either strings or integers; both are normalised to their
/// textual form so they compare equal to the keys of a roster snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for PeerId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::Text(text) => text,
            StringOrNumber::Number(number) => number.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(StringOrNumber::into_string)
}

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        string_or_number(deserializer).map(PeerId)
    }
}

/// One peer's state, both as sent by this client and as relayed inside a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerState {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub score: i64,
}

/// Complete server-side view of every connected peer, keyed by identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RosterSnapshot {
    entries: Map<String, Value>,
}

impl RosterSnapshot {
    pub fn from_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = (PeerId, PeerState)>,
    {
        let entries = states
            .into_iter()
            .filter_map(|(id, state)| {
                serde_json::to_value(state)
                    .ok()
                    .map(|value| (id.0, value))
            })
            .collect();
        Self { entries }
    }

    /// Inserts a raw entry, bypassing validation
    pub fn insert_raw(&mut self, id: PeerId, value: Value) {
        self.entries.insert(id.0, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.entries.contains_key(id.as_str())
    }

    pub fn ids(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.entries.keys().map(|key| PeerId::new(key.as_str()))
    }

    /// Decodes every entry independently
    pub fn entries(
        &self,
    ) -> impl Iterator<Item = (PeerId, Result<PeerState, ProtocolError>)> + '_ {
        self.entries.iter().map(|(key, value)| {
            let id = PeerId::new(key.as_str());
            let state = PeerState::deserialize(value).map_err(|source| {
                ProtocolError::MalformedEntry {
                    id: id.clone(),
                    source,
                }
            });
            (id, state)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLeaderboardEntry")]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: i64,
}

/// Leaderboard rows name the player by `username`, `name` or `id`, in that preference
#[derive(Deserialize)]
struct RawLeaderboardEntry {
    #[serde(default)]
    username: Option<StringOrNumber>,
    #[serde(default)]
    name: Option<StringOrNumber>,
    #[serde(default)]
    id: Option<StringOrNumber>,
    score: i64,
}

impl TryFrom<RawLeaderboardEntry> for LeaderboardEntry {
    type Error = String;

    fn try_from(raw: RawLeaderboardEntry) -> Result<Self, Self::Error> {
        let name = raw
            .username
            .or(raw.name)
            .or(raw.id)
            .ok_or_else(|| "leaderboard entry has no username, name or id".to_string())?;
        Ok(Self {
            name: name.into_string(),
            score: raw.score,
        })
    }
}

/// Messages this client emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    PlayerUpdate(PeerState),
    AdvanceLevel,
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::MalformedFrame)
    }
}

/// Messages the relay server pushes to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    YourId(PeerId),
    PlayerUpdate(RosterSnapshot),
    AdvanceLevel,
    LeaderboardUpdate(Vec<LeaderboardEntry>),
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text).map_err(ProtocolError::MalformedFrame)?;

        let event = value
            .get("event")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !SERVER_EVENTS.contains(&event) {
            return Err(ProtocolError::UnknownEvent(event.to_string()));
        }

        ServerMessage::deserialize(value).map_err(ProtocolError::MalformedFrame)
    }
}
