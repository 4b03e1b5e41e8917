//! Host capability traits -- the injected seam between bridge and host.
//!
//! The host application has no stable public API, so all bridge access to
//! host state goes through these traits. [`HostView`] is strictly
//! read-only and is everything most components need; [`Host`] adds the one
//! mutation surface the bridge owns (the joker rack, for the reorder
//! scheduler). Tests fake both with plain structs.

use serde_json::Value;

use cardbridge_protocol::prelude::{Action, JokerSlot, TableSnapshot};

use crate::BridgeError;

// ---------------------------------------------------------------------------
// HandleReport
// ---------------------------------------------------------------------------

/// Outcome of the coarse host-handle check that gates every hook call.
///
/// The host is uncontrolled and possibly mid-teardown when a hook fires;
/// before touching it, the wrapper asks which required handles are absent
/// or of an unexpected type. An unhealthy report makes the wrapper return
/// its sentinel without calling through.
#[derive(Debug, Clone, Default)]
pub struct HandleReport {
    /// Names of required host handles that are missing entirely.
    pub missing: Vec<&'static str>,
    /// Names of handles present but of an unexpected coarse type.
    pub wrong_type: Vec<&'static str>,
}

impl HandleReport {
    /// A report with nothing wrong.
    pub fn healthy() -> Self {
        Self::default()
    }

    /// True when no handle is missing or mistyped.
    pub fn is_healthy(&self) -> bool {
        self.missing.is_empty() && self.wrong_type.is_empty()
    }

    /// One-line description for log output.
    pub fn describe(&self) -> String {
        format!(
            "missing={:?} wrong_type={:?}",
            self.missing, self.wrong_type
        )
    }
}

// ---------------------------------------------------------------------------
// HostView / Host
// ---------------------------------------------------------------------------

/// Read-only capability over host state.
pub trait HostView {
    /// Whether the host is currently in a state where bridge work is
    /// allowed at all (not loading, not mid-animation-lock, etc.).
    fn update_allowed(&self) -> bool;

    /// Produce a fresh snapshot of host state, or `None` if one cannot be
    /// assembled right now (transient-absent; the caller skips the tick's
    /// work that needed it).
    fn snapshot(&self) -> Option<TableSnapshot>;

    /// Coarse presence/type check of the host handles hooks depend on.
    fn handles(&self) -> HandleReport;

    /// Names of the host-owned collections the emergency dump may walk.
    fn collection_names(&self) -> &'static [&'static str];

    /// Element count of a named collection, or `None` if the collection
    /// itself is unreachable.
    fn collection_len(&self, name: &str) -> Option<usize>;

    /// A JSON summary of one element. May fail (or panic, in a corrupted
    /// host) -- callers fault-bound each access individually.
    fn collection_item(&self, name: &str, index: usize) -> Result<Value, BridgeError>;
}

/// Full host capability: read access plus the joker rack mutation surface
/// used by the reorder scheduler.
pub trait Host: HostView {
    /// Mutable access to the host's ordered joker rack.
    fn jokers_mut(&mut self) -> &mut Vec<JokerSlot>;
}

// ---------------------------------------------------------------------------
// ActionExecutor
// ---------------------------------------------------------------------------

/// External collaborator that performs the host-side effect of an action.
///
/// Execution is synchronous and returns only success/failure -- the
/// authoritative post-command snapshot is deliberately captured on a later
/// tick by the deferred capture coordinator, because the host does not
/// guarantee the mutation is visible yet. Implementations may panic; the
/// dispatcher catches it and converts it to a failed result.
pub trait ActionExecutor {
    /// Perform the action. `Err` carries a message for the action result.
    fn execute(&mut self, action: &Action) -> Result<(), String>;
}
