//! Shared-directory action channel.
//!
//! The bridge and the external controller exchange JSON files in one
//! shared directory: the bridge writes `game_state.json` and
//! `action_results.json`, and reads-then-deletes `actions.json`.
//! Correctness relies on read-then-delete semantics (a consumed command
//! file cannot be read twice) and the dispatcher's in-flight guard, not on
//! locking -- there is exactly one writer per file.
//!
//! All writes are atomic: serialize to `<name>.tmp`, then rename over the
//! target, so the controller never observes a half-written file.
//!
//! Failure policy follows the bridge-wide taxonomy: a malformed or absent
//! inbound file is logged and treated as absent; an outbound write failure
//! is logged and *not* retried (state publishes reconcile on the next
//! fingerprint change, results are lost with the channel broken anyway).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use cardbridge_protocol::prelude::{
    ActionOutcome, CommandEnvelope, ResultMessage, StateMessage, TableSnapshot,
    MSG_ACTION_COMMAND,
};

use crate::BridgeError;

/// File the bridge publishes state updates to.
pub const STATE_FILE: &str = "game_state.json";
/// File the controller drops commands into; deleted after read.
pub const ACTIONS_FILE: &str = "actions.json";
/// File the bridge publishes action results to.
pub const RESULTS_FILE: &str = "action_results.json";

// ---------------------------------------------------------------------------
// ActionChannel
// ---------------------------------------------------------------------------

/// One side of the shared-directory channel.
///
/// Owns the outbound sequence counter (independent of, and unrelated to,
/// the inbound command sequence the dispatcher tracks).
pub struct ActionChannel {
    state_path: PathBuf,
    actions_path: PathBuf,
    results_path: PathBuf,
    outbound_sequence: u64,
}

impl ActionChannel {
    /// Open a channel over `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Transient`] if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            BridgeError::Transient(format!(
                "failed to create channel directory {}: {e}",
                dir.display()
            ))
        })?;

        debug!(dir = %dir.display(), "action channel opened");
        Ok(Self {
            state_path: dir.join(STATE_FILE),
            actions_path: dir.join(ACTIONS_FILE),
            results_path: dir.join(RESULTS_FILE),
            outbound_sequence: 0,
        })
    }

    /// Non-blocking read of the next inbound command.
    ///
    /// Reads and deletes `actions.json` if present. Returns `None` when the
    /// file is absent, unreadable, unparseable, or carries the wrong
    /// message type -- all logged, never raised. The file is deleted even
    /// when malformed, so a bad command cannot wedge the channel.
    pub fn poll(&mut self) -> Option<CommandEnvelope> {
        let raw = match fs::read_to_string(&self.actions_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(error = %e, "failed to read command file");
                return None;
            }
        };

        // Consume the file before parsing: read-then-delete is what makes
        // the one-reader/one-writer alternation safe.
        if let Err(e) = fs::remove_file(&self.actions_path) {
            warn!(error = %e, "failed to delete consumed command file");
        }

        let envelope: CommandEnvelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "malformed command envelope, treating as absent");
                return None;
            }
        };

        if envelope.message_type != MSG_ACTION_COMMAND {
            warn!(
                message_type = %envelope.message_type,
                "unexpected message type in command file, treating as absent"
            );
            return None;
        }

        debug!(
            sequence = envelope.sequence_id,
            action_type = envelope.action_type().unwrap_or("<missing>"),
            "command polled"
        );
        Some(envelope)
    }

    /// Publish a state update with a fresh outbound sequence number.
    ///
    /// Returns the sequence number used.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Transient`] if the write fails. The sequence number
    /// is still consumed; the controller tolerates gaps.
    pub fn publish_state(&mut self, snapshot: TableSnapshot) -> Result<u64, BridgeError> {
        let sequence = self.next_outbound();
        let message = StateMessage::new(sequence, snapshot);
        self.write_atomic(&self.state_path, &message)?;
        debug!(sequence, "state update published");
        Ok(sequence)
    }

    /// Publish the result for the command with inbound sequence id
    /// `command_sequence`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Transient`] if the write fails. Callers log and move
    /// on; results are not retried.
    pub fn publish_result(
        &mut self,
        command_sequence: u64,
        outcome: ActionOutcome,
    ) -> Result<(), BridgeError> {
        let message = ResultMessage::new(command_sequence, outcome);
        self.write_atomic(&self.results_path, &message)?;
        debug!(
            sequence = command_sequence,
            success = message.data.success,
            "action result published"
        );
        Ok(())
    }

    /// The last outbound sequence number handed out.
    pub fn outbound_sequence(&self) -> u64 {
        self.outbound_sequence
    }

    fn next_outbound(&mut self) -> u64 {
        self.outbound_sequence += 1;
        self.outbound_sequence
    }

    /// Serialize `value` to `<path>.tmp`, then rename over `path`.
    fn write_atomic<T: serde::Serialize>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), BridgeError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| BridgeError::Transient(format!("failed to serialize message: {e}")))?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| {
            BridgeError::Transient(format!("failed to write {}: {e}", tmp.display()))
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            BridgeError::Transient(format!("failed to rename into {}: {e}", path.display()))
        })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
