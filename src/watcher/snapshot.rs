//! Per snapshot type contracts: where it is stored, how each field is written
//! to the store, which fields raise alerts, and how it is decoded.

use super::{
    error::DecodeError,
    model::{ContainerSnapshot, GameStateEnvelope, GameStateSnapshot, format_duration},
};
use crate::store::PersistedHash;

/// Name of a persisted field and how its value is written as text.
pub struct Field<S> {
    pub name: &'static str,
    pub encode: fn(&S) -> String,
}

/// How a watched field is compared against its stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    /// Compared as text.
    Text,
    /// The stored text is parsed as a boolean first. Unparsable stored values
    /// are skipped, never reported.
    Bool,
}

/// A field whose changes raise an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watch {
    pub field: &'static str,
    /// Subject of the alert sentence.
    pub label: &'static str,
    pub kind: WatchKind,
}

pub trait Snapshot: Sized + Send + Sync + 'static {
    /// Key of the hash holding the latest snapshot.
    const HASH_NAME: &'static str;
    /// Every persisted field, in write order.
    const FIELDS: &'static [Field<Self>];
    /// Watched fields, in evaluation order. Each names an entry of `FIELDS`.
    const WATCHED: &'static [Watch];

    /// Decodes a normalized payload.
    fn decode(payload: &[u8]) -> Result<Self, DecodeError>;

    /// Text value of the field called `name`, as it would be persisted.
    fn value_of(&self, name: &str) -> Option<String> {
        Self::FIELDS
            .iter()
            .find(|field| field.name == name)
            .map(|field| (field.encode)(self))
    }

    fn to_hash(&self) -> PersistedHash {
        Self::FIELDS
            .iter()
            .map(|field| (field.name.to_string(), (field.encode)(self)))
            .collect()
    }
}

impl Snapshot for ContainerSnapshot {
    const HASH_NAME: &'static str = "docker_info";

    const FIELDS: &'static [Field<Self>] = &[
        Field {
            name: "Command",
            encode: |s| s.command.clone(),
        },
        Field {
            name: "CreatedAt",
            encode: |s| s.created_at.clone(),
        },
        Field {
            name: "ID",
            encode: |s| s.id.clone(),
        },
        Field {
            name: "Image",
            encode: |s| s.image.clone(),
        },
        Field {
            name: "Labels",
            encode: |s| s.labels.clone(),
        },
        Field {
            name: "LocalVolumes",
            encode: |s| s.local_volumes.clone(),
        },
        Field {
            name: "Mounts",
            encode: |s| s.mounts.clone(),
        },
        Field {
            name: "Names",
            encode: |s| s.names.clone(),
        },
        Field {
            name: "Networks",
            encode: |s| s.networks.clone(),
        },
        Field {
            name: "Ports",
            encode: |s| s.ports.clone(),
        },
        Field {
            name: "RunningFor",
            encode: |s| s.running_for.clone(),
        },
        Field {
            name: "Size",
            encode: |s| s.size.clone(),
        },
        Field {
            name: "State",
            encode: |s| s.state.clone(),
        },
        Field {
            name: "Status",
            encode: |s| s.status.clone(),
        },
    ];

    const WATCHED: &'static [Watch] = &[Watch {
        field: "State",
        label: "Server state",
        kind: WatchKind::Text,
    }];

    fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(payload).map_err(DecodeError::Snapshot)
    }
}

impl Snapshot for GameStateSnapshot {
    const HASH_NAME: &'static str = "server_details";

    const FIELDS: &'static [Field<Self>] = &[
        Field {
            name: "ActiveSessionName",
            encode: |s| s.active_session_name.clone(),
        },
        Field {
            name: "TechTier",
            encode: |s| s.tech_tier.to_string(),
        },
        Field {
            name: "TotalGameDuration",
            encode: |s| format_duration(s.total_game_duration),
        },
        Field {
            name: "NumConnectedPlayers",
            encode: |s| s.num_connected_players.to_string(),
        },
        Field {
            name: "PlayerLimit",
            encode: |s| s.player_limit.to_string(),
        },
        Field {
            name: "IsGameRunning",
            encode: |s| s.is_game_running.to_string(),
        },
        Field {
            name: "IsGamePaused",
            encode: |s| s.is_game_paused.to_string(),
        },
    ];

    const WATCHED: &'static [Watch] = &[
        Watch {
            field: "ActiveSessionName",
            label: "Active session name",
            kind: WatchKind::Text,
        },
        Watch {
            field: "IsGameRunning",
            label: "Game running",
            kind: WatchKind::Bool,
        },
        Watch {
            field: "IsGamePaused",
            label: "Game paused",
            kind: WatchKind::Bool,
        },
    ];

    fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let envelope: GameStateEnvelope =
            serde_json::from_slice(payload).map_err(DecodeError::Snapshot)?;
        envelope
            .data
            .and_then(|data| data.server_game_state)
            .ok_or(DecodeError::MissingStructure("data.server_game_state"))
    }
}
