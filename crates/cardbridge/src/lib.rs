//! Cardbridge -- control bridge between a live card-table host and an
//! external controller process.
//!
//! The bridge runs entirely on the host's single update thread. Each host
//! frame calls [`Bridge::update`](bridge::Bridge::update) with the elapsed
//! time; when enough time has accumulated, one *logical tick* runs:
//!
//! 1. Service any deferred snapshot capture (finish the previous command's
//!    result).
//! 2. Poll the shared directory for one inbound command and dispatch it.
//! 3. Publish a state update if the snapshot fingerprint changed.
//!
//! Cross-tick continuation is modeled with explicit stored state
//! ([`capture::PendingAction`]), never by blocking: the host never
//! guarantees that a mutation triggered through an intercepted function is
//! visible synchronously, so the post-command snapshot is captured on a
//! *later* tick.
//!
//! Every boundary crossing into host code is defensive. Hook wrappers
//! ([`hooks::HookRegistry`]) pre-validate host handles, record a
//! diagnostic trace, and convert any error or panic into a sentinel value.
//! No fault from this crate may escape into the host's call stack.
//!
//! # Quick Start
//!
//! ```no_run
//! use cardbridge::prelude::*;
//!
//! # struct MyHost;
//! # impl cardbridge::host::HostView for MyHost {
//! #     fn update_allowed(&self) -> bool { true }
//! #     fn snapshot(&self) -> Option<TableSnapshot> { None }
//! #     fn handles(&self) -> HandleReport { HandleReport::healthy() }
//! #     fn collection_names(&self) -> &'static [&'static str] { &[] }
//! #     fn collection_len(&self, _: &str) -> Option<usize> { None }
//! #     fn collection_item(&self, _: &str, _: usize) -> Result<serde_json::Value, BridgeError> {
//! #         Err(BridgeError::Transient("no host".to_owned()))
//! #     }
//! # }
//! # impl cardbridge::host::Host for MyHost {
//! #     fn jokers_mut(&mut self) -> &mut Vec<JokerSlot> { unimplemented!() }
//! # }
//! # struct MyExecutor;
//! # impl cardbridge::host::ActionExecutor for MyExecutor {
//! #     fn execute(&mut self, _: &Action) -> Result<(), String> { Ok(()) }
//! # }
//! let mut bridge = Bridge::new("shared", SchedulerConfig::default()).unwrap();
//! bridge.start();
//!
//! let mut host = MyHost;
//! let mut executor = MyExecutor;
//! // called by the host once per frame:
//! bridge.update(1.0 / 60.0, &mut host, &mut executor);
//! ```

#![deny(unsafe_code)]

pub mod bridge;
pub mod capture;
pub mod channel;
pub mod hooks;
pub mod host;
pub mod publish;
pub mod reorder;
pub mod tick;

/// Re-export the protocol crate for convenience.
pub use cardbridge_protocol as protocol;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by bridge operations.
///
/// One variant per failure class. The propagation policy is strict: these
/// never escape unhandled into the host process -- every public entry
/// point either returns a `Result` the caller is expected to log, or
/// converts the error to a sentinel/failed-result internally.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A resource was momentarily unavailable (snapshot provider returned
    /// nothing, channel file missing). Skip and retry next tick.
    #[error("transient: {0}")]
    Transient(String),

    /// Input failed shape validation (unparseable command file, envelope
    /// missing required fields). Logged and treated as absent.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// The external action executor returned an error or panicked. Caught
    /// and converted to a failed action result.
    #[error("executor fault: {0}")]
    ExecutorFault(String),

    /// An intercepted host function returned an error or panicked inside
    /// its fault boundary. Converted to a sentinel, never propagated.
    #[error("hook fault in '{hook}': {detail}")]
    HookFault {
        /// Name of the wrapped host function.
        hook: String,
        /// What went wrong.
        detail: String,
    },

    /// A structural mutation request (reorder permutation) failed
    /// validation. Rejected synchronously with zero partial mutation.
    #[error("validation failed: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common bridge usage.
pub mod prelude {
    pub use crate::bridge::Bridge;
    pub use crate::capture::{DispatchOutcome, PendingAction};
    pub use crate::channel::ActionChannel;
    pub use crate::hooks::{HookRegistry, HookTrace, HOOK_TRACE_CAP};
    pub use crate::host::{ActionExecutor, HandleReport, Host, HostView};
    pub use crate::publish::ChangePublisher;
    pub use crate::reorder::{ReorderScheduler, HOOK_EVALUATION_COMPLETE};
    pub use crate::tick::{BridgeScheduler, SchedulerConfig};
    pub use crate::BridgeError;

    pub use cardbridge_protocol::prelude::*;
}
