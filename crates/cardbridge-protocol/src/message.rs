//! Channel message envelopes.
//!
//! Three logical messages cross the shared directory:
//!
//! - [`StateMessage`] (`game_state`) -- bridge to controller, published on
//!   fingerprint change.
//! - [`CommandEnvelope`] (`action_command`) -- controller to bridge,
//!   deleted after read.
//! - [`ResultMessage`] (`action_result`) -- bridge to controller, exactly
//!   one per accepted command.
//!
//! Inbound and outbound `sequence_id` counters are independent and
//! monotonic. The inbound envelope keeps its `data` as raw JSON: envelope
//! decoding and action decoding fail differently (malformed envelope =
//! treat as absent; unknown action = failed result), so the split must be
//! visible to the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::action::ActionOutcome;
use crate::snapshot::TableSnapshot;

/// Wire tag of a state update message.
pub const MSG_GAME_STATE: &str = "game_state";
/// Wire tag of an inbound action command.
pub const MSG_ACTION_COMMAND: &str = "action_command";
/// Wire tag of an action result message.
pub const MSG_ACTION_RESULT: &str = "action_result";

/// Milliseconds since the Unix epoch. Saturates to 0 on a pre-epoch clock.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Outbound messages
// ---------------------------------------------------------------------------

/// A published state update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMessage {
    pub message_type: String,
    pub timestamp: u64,
    pub sequence_id: u64,
    pub data: TableSnapshot,
}

impl StateMessage {
    /// Build a state message stamped with the current time.
    pub fn new(sequence_id: u64, snapshot: TableSnapshot) -> Self {
        Self {
            message_type: MSG_GAME_STATE.to_owned(),
            timestamp: unix_millis(),
            sequence_id,
            data: snapshot,
        }
    }
}

/// A published action result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultMessage {
    pub message_type: String,
    pub timestamp: u64,
    /// Echoes the sequence id of the command this result answers.
    pub sequence_id: u64,
    pub data: ActionOutcome,
}

impl ResultMessage {
    /// Build a result message stamped with the current time.
    pub fn new(sequence_id: u64, outcome: ActionOutcome) -> Self {
        Self {
            message_type: MSG_ACTION_RESULT.to_owned(),
            timestamp: unix_millis(),
            sequence_id,
            data: outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound envelope
// ---------------------------------------------------------------------------

/// An inbound command as read off the channel, action payload still raw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(default)]
    pub timestamp: u64,
    pub sequence_id: u64,
    pub message_type: String,
    pub data: Value,
}

impl CommandEnvelope {
    /// The `action_type` tag of the raw payload, if present.
    pub fn action_type(&self) -> Option<&str> {
        self.data.get("action_type").and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
