//! Top-level bridge facade.
//!
//! [`Bridge`] bundles the scheduler, the hook registry, and the reorder
//! scheduler behind one object the host embeds. It owns no host state;
//! the host and executor are passed in on every call so the bridge can sit
//! in a plain field of whatever the host keeps alive across frames.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::channel::ActionChannel;
use crate::hooks::{emergency_dump, HookFn, HookRegistry, HookTrace, RapidRepeat};
use crate::host::{ActionExecutor, Host, HostView};
use crate::reorder::ReorderScheduler;
use crate::tick::{BridgeScheduler, SchedulerConfig};
use crate::BridgeError;

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

/// The embedded control bridge.
///
/// Single-threaded by construction: everything here runs on the host's
/// update thread, driven by [`update`](Bridge::update).
pub struct Bridge {
    scheduler: BridgeScheduler,
    hooks: HookRegistry,
    reorder: ReorderScheduler,
}

impl Bridge {
    /// Open (creating if needed) the shared channel directory at `dir` and
    /// build an inactive bridge with the given schedule.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Transient`] if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>, config: SchedulerConfig) -> Result<Self, BridgeError> {
        let channel = ActionChannel::new(dir.as_ref())?;
        info!(dir = %dir.as_ref().display(), "bridge opened");
        Ok(Self {
            scheduler: BridgeScheduler::new(channel, config),
            hooks: HookRegistry::new(),
            reorder: ReorderScheduler::new(),
        })
    }

    // -- lifecycle -----------------------------------------------------------

    pub fn start(&mut self) {
        self.scheduler.start();
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_active(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Per-frame entry point; see [`BridgeScheduler::update`].
    pub fn update(
        &mut self,
        dt: f64,
        host: &mut dyn Host,
        executor: &mut dyn ActionExecutor,
    ) -> bool {
        self.scheduler.update(dt, host, executor)
    }

    pub fn tick_count(&self) -> u64 {
        self.scheduler.tick_count()
    }

    // -- hooks ---------------------------------------------------------------

    /// Wrap the named host function. No-op (returns `false`) when already
    /// wrapped.
    pub fn install_hook(&mut self, name: &str, original: HookFn) -> bool {
        self.hooks.install(name, original)
    }

    /// Invoke a wrapped host function through its fault boundary.
    pub fn invoke_hook(&mut self, name: &str, host: &mut dyn Host, args: &Value) -> Value {
        self.hooks.invoke(name, host, args)
    }

    /// The recent-call diagnostic trace.
    pub fn hook_trace(&self) -> &HookTrace {
        self.hooks.trace()
    }

    /// Advisory scan of the trace for rapid repeated calls.
    pub fn analyze_hooks(&self, window_ms: u64) -> Vec<RapidRepeat> {
        self.hooks.trace().analyze(window_ms)
    }

    /// Direct registry access, for observer wiring beyond what the facade
    /// covers.
    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    // -- reorder -------------------------------------------------------------

    /// Schedule a joker reorder for the next evaluation-complete event.
    pub fn schedule_reorder(&mut self, new_order: Vec<usize>) {
        self.reorder.schedule(&mut self.hooks, new_order);
    }

    /// Whether a reorder is waiting for its event.
    pub fn reorder_pending(&self) -> bool {
        self.reorder.pending()
    }

    // -- diagnostics ---------------------------------------------------------

    /// Best-effort dump of every host collection; see
    /// [`emergency_dump`](crate::hooks::emergency_dump).
    pub fn emergency_dump(&self, host: &dyn HostView) -> Value {
        emergency_dump(host)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
