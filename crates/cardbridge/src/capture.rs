//! Command dispatch and deferred result capture.
//!
//! [`PendingAction`] is the bridge's one piece of cross-tick state: it
//! tracks the highest inbound sequence processed and the two-state capture
//! machine `Idle -> CaptureArmed -> Idle`.
//!
//! A command accepted on tick N has its executor run immediately, but the
//! authoritative post-command snapshot is *not* captured on tick N -- host
//! mutations triggered through intercepted functions are not guaranteed
//! visible until the host's own bookkeeping has run. Instead the partial
//! outcome is stored (`CaptureArmed`) and finished on a later tick, when a
//! fresh snapshot is attached and the completed result handed back for
//! publishing.
//!
//! There is no timeout: if ticks stop, `CaptureArmed` persists. Ticks are
//! assumed to continue.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, error, warn};

use cardbridge_protocol::prelude::{Action, ActionOutcome, CommandEnvelope};

use crate::host::{ActionExecutor, HostView};

// ---------------------------------------------------------------------------
// CaptureState
// ---------------------------------------------------------------------------

/// The deferred-capture machine.
#[derive(Debug, Clone, PartialEq)]
enum CaptureState {
    /// Nothing in flight.
    Idle,
    /// A command was accepted; its partial outcome awaits the snapshot a
    /// later tick will attach.
    CaptureArmed {
        /// Inbound sequence id of the accepted command.
        sequence: u64,
        /// Outcome so far (success/error known, `new_state` still empty).
        outcome: ActionOutcome,
    },
}

// ---------------------------------------------------------------------------
// DispatchOutcome
// ---------------------------------------------------------------------------

/// What [`PendingAction::dispatch`] did with an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Accepted: sequence advanced, executor ran, capture armed.
    Accepted,
    /// Dropped: sequence id was not beyond the highest processed.
    DroppedStale,
    /// Dropped: a command is already in flight.
    DroppedInFlight,
}

// ---------------------------------------------------------------------------
// PendingAction
// ---------------------------------------------------------------------------

/// Cross-tick command state: sequence high-water mark plus the capture
/// machine. Persists until finalized; everything else is per-tick.
#[derive(Debug)]
pub struct PendingAction {
    last_processed: u64,
    state: CaptureState,
}

impl Default for PendingAction {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingAction {
    pub fn new() -> Self {
        Self {
            last_processed: 0,
            state: CaptureState::Idle,
        }
    }

    /// Highest inbound sequence id accepted so far. Strictly increasing
    /// across accepts; ids at or below this value are dropped.
    pub fn last_processed_sequence(&self) -> u64 {
        self.last_processed
    }

    /// True while a command awaits its deferred snapshot.
    pub fn in_flight(&self) -> bool {
        matches!(self.state, CaptureState::CaptureArmed { .. })
    }

    /// Accept or drop one inbound command.
    ///
    /// Dropping is silent (debug log only): duplicates and stale retries
    /// are expected controller behavior, and at most one command may be in
    /// flight. On accept, the sequence high-water mark advances *before*
    /// execution -- even a command that fails to decode or execute
    /// consumes its sequence id, so exactly one result is produced for it.
    ///
    /// The executor runs inside a fault boundary: an `Err` or a panic
    /// becomes a failed outcome, never an unwound stack.
    pub fn dispatch(
        &mut self,
        envelope: CommandEnvelope,
        executor: &mut dyn ActionExecutor,
    ) -> DispatchOutcome {
        if envelope.sequence_id <= self.last_processed {
            debug!(
                sequence = envelope.sequence_id,
                last_processed = self.last_processed,
                "dropping stale command"
            );
            return DispatchOutcome::DroppedStale;
        }
        if self.in_flight() {
            debug!(
                sequence = envelope.sequence_id,
                "dropping command while another is in flight"
            );
            return DispatchOutcome::DroppedInFlight;
        }

        self.last_processed = envelope.sequence_id;

        let outcome = match serde_json::from_value::<Action>(envelope.data) {
            Ok(action) => Self::run_executor(&action, executor),
            Err(e) => {
                warn!(
                    sequence = envelope.sequence_id,
                    error = %e,
                    "command payload did not decode to a known action"
                );
                ActionOutcome::failed(format!("unknown or malformed action: {e}"))
            }
        };

        debug!(
            sequence = envelope.sequence_id,
            success = outcome.success,
            "command executed, capture armed"
        );
        self.state = CaptureState::CaptureArmed {
            sequence: envelope.sequence_id,
            outcome,
        };
        DispatchOutcome::Accepted
    }

    /// Service the capture machine at the top of a logical tick.
    ///
    /// If armed and a fresh snapshot is available, attaches it, clears the
    /// in-flight state and returns the completed `(sequence, outcome)` for
    /// publishing. If the snapshot provider has nothing, stays armed and
    /// tries again next tick -- a result is only ever written once its
    /// snapshot is available.
    pub fn service(&mut self, host: &dyn HostView) -> Option<(u64, ActionOutcome)> {
        if !self.in_flight() {
            return None;
        }
        let Some(snapshot) = host.snapshot() else {
            debug!("snapshot unavailable, capture stays armed");
            return None;
        };

        match std::mem::replace(&mut self.state, CaptureState::Idle) {
            CaptureState::CaptureArmed {
                sequence,
                mut outcome,
            } => {
                outcome.new_state = Some(snapshot);
                debug!(sequence, "deferred capture complete");
                Some((sequence, outcome))
            }
            CaptureState::Idle => None,
        }
    }

    fn run_executor(action: &Action, executor: &mut dyn ActionExecutor) -> ActionOutcome {
        let result = catch_unwind(AssertUnwindSafe(|| executor.execute(action)));
        match result {
            Ok(Ok(())) => ActionOutcome::ok(),
            Ok(Err(message)) => {
                warn!(action = action.kind(), %message, "executor rejected action");
                ActionOutcome::failed(message)
            }
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                error!(action = action.kind(), detail, "executor panicked");
                ActionOutcome::failed(format!("executor fault: {detail}"))
            }
        }
    }
}

/// Best-effort extraction of a panic payload message.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
