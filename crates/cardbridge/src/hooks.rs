//! Hook safety wrappers, call trace, and emergency diagnostics.
//!
//! The bridge intercepts a handful of named host functions. The host is
//! uncontrolled and possibly corrupted, so every crossing is defensive by
//! default: before an original runs, required host handles are
//! pre-checked; the call is recorded in a bounded trace; and the original
//! executes inside a fault boundary that converts any error *or panic*
//! into a sentinel `Value::Null` instead of letting it reach the host's
//! call stack.
//!
//! Installation is keyed by name in a registry, which is what makes
//! installing the same name twice a no-op -- there is never a second
//! wrapper layer to stack.

use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use cardbridge_protocol::prelude::unix_millis;

use crate::capture::panic_message;
use crate::host::{Host, HostView};
use crate::BridgeError;

/// Capacity of the hook call trace ring.
pub const HOOK_TRACE_CAP: usize = 10;

/// How many same-name calls inside the analysis window count as "rapid".
pub const RAPID_REPEAT_THRESHOLD: usize = 3;

/// Default analysis window in milliseconds.
pub const DEFAULT_RAPID_WINDOW_MS: u64 = 250;

/// An intercepted host function, as stored in the registry.
///
/// Originals may read and mutate the host; errors are reported through
/// [`BridgeError`] and are converted to the sentinel by the wrapper.
pub type HookFn = Box<dyn FnMut(&mut dyn Host, &Value) -> Result<Value, BridgeError>>;

/// A callback run after a named hook's original completes. Used by the
/// reorder scheduler to act at one precise point in the host's event
/// sequence.
pub type ObserverFn = Box<dyn FnMut(&mut dyn Host)>;

// ---------------------------------------------------------------------------
// HookTrace
// ---------------------------------------------------------------------------

/// One recorded hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEntry {
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Fixed-capacity ring of the most recent hook invocations.
///
/// Diagnostic only: nothing reads the trace on the hot path, and
/// [`analyze`](HookTrace::analyze) is advisory -- it never blocks
/// execution.
#[derive(Debug, Default)]
pub struct HookTrace {
    entries: VecDeque<HookEntry>,
}

/// Advisory finding: the same hook fired repeatedly in a short window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RapidRepeat {
    pub name: String,
    /// How many calls landed inside the window.
    pub count: usize,
    pub window_ms: u64,
}

impl HookTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call now, evicting the oldest entry past capacity.
    pub fn record(&mut self, name: &str) {
        self.record_at(name, unix_millis());
    }

    /// Record a call with an explicit timestamp (deterministic variant).
    pub fn record_at(&mut self, name: &str, timestamp: u64) {
        self.entries.push_back(HookEntry {
            name: name.to_owned(),
            timestamp,
        });
        if self.entries.len() > HOOK_TRACE_CAP {
            self.entries.pop_front();
        }
    }

    /// The retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HookEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scan for hooks recurring rapidly within `window_ms`.
    ///
    /// A hook is flagged when at least [`RAPID_REPEAT_THRESHOLD`] of its
    /// retained calls fall within `window_ms` of its newest call. Findings
    /// are logged as warnings and returned; they never affect execution.
    pub fn analyze(&self, window_ms: u64) -> Vec<RapidRepeat> {
        let mut newest: HashMap<&str, u64> = HashMap::new();
        for entry in &self.entries {
            let slot = newest.entry(&entry.name).or_insert(entry.timestamp);
            if entry.timestamp > *slot {
                *slot = entry.timestamp;
            }
        }

        let mut findings = Vec::new();
        for (name, newest_ts) in newest {
            let count = self
                .entries
                .iter()
                .filter(|e| {
                    e.name == name && newest_ts.saturating_sub(e.timestamp) <= window_ms
                })
                .count();
            if count >= RAPID_REPEAT_THRESHOLD {
                warn!(
                    hook = name,
                    count, window_ms, "rapid repeated hook calls detected"
                );
                findings.push(RapidRepeat {
                    name: name.to_owned(),
                    count,
                    window_ms,
                });
            }
        }
        findings.sort_by(|a, b| a.name.cmp(&b.name));
        findings
    }
}

// ---------------------------------------------------------------------------
// HookRegistry
// ---------------------------------------------------------------------------

/// Registry of wrapped host functions, keyed by name.
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<String, HookFn>,
    observers: HashMap<String, ObserverFn>,
    trace: HookTrace,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a wrapper for the named host function.
    ///
    /// Idempotent: if the name is already wrapped, the existing wrapper is
    /// kept and `false` is returned. There is never more than one wrapper
    /// layer per name.
    pub fn install(&mut self, name: &str, original: HookFn) -> bool {
        if self.hooks.contains_key(name) {
            debug!(hook = name, "already wrapped, install is a no-op");
            return false;
        }
        self.hooks.insert(name.to_owned(), original);
        debug!(hook = name, "hook wrapper installed");
        true
    }

    /// Whether a wrapper is installed for `name`.
    pub fn installed(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    /// Attach an observer to run after the named hook's original. One
    /// observer per name; a second attach is a no-op and returns `false`.
    pub fn observe(&mut self, name: &str, observer: ObserverFn) -> bool {
        if self.observers.contains_key(name) {
            return false;
        }
        self.observers.insert(name.to_owned(), observer);
        debug!(hook = name, "hook observer attached");
        true
    }

    /// Whether an observer is attached to `name`.
    pub fn observed(&self, name: &str) -> bool {
        self.observers.contains_key(name)
    }

    /// Invoke the wrapped function for `name`.
    ///
    /// Per invocation: (a) pre-check host handles -- an unhealthy report
    /// logs and returns the sentinel without calling through; (b) record
    /// the call in the trace; (c) run the original inside a fault
    /// boundary, substituting the sentinel for any error or panic; then
    /// run the attached observer, also fault-bounded. The event is
    /// considered fired -- and observers run -- even when the original
    /// faulted.
    ///
    /// Never panics, never returns an error: the sentinel is `Value::Null`.
    pub fn invoke(&mut self, name: &str, host: &mut dyn Host, args: &Value) -> Value {
        let Some(hook) = self.hooks.get_mut(name) else {
            warn!(hook = name, "invoked hook with no installed wrapper");
            return Value::Null;
        };

        let report = host.handles();
        if !report.is_healthy() {
            warn!(
                hook = name,
                handles = %report.describe(),
                "handle pre-check failed, original not invoked"
            );
            return Value::Null;
        }

        self.trace.record(name);

        let value = match catch_unwind(AssertUnwindSafe(|| hook(host, args))) {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                error!(hook = name, error = %e, "hook failed, sentinel substituted");
                Value::Null
            }
            Err(payload) => {
                error!(
                    hook = name,
                    detail = panic_message(payload.as_ref()),
                    "hook panicked, sentinel substituted"
                );
                Value::Null
            }
        };

        if let Some(observer) = self.observers.get_mut(name) {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| observer(host))) {
                error!(
                    hook = name,
                    detail = panic_message(payload.as_ref()),
                    "hook observer panicked"
                );
            }
        }

        value
    }

    /// The call trace ring.
    pub fn trace(&self) -> &HookTrace {
        &self.trace
    }
}

// ---------------------------------------------------------------------------
// Emergency dump
// ---------------------------------------------------------------------------

/// Best-effort, read-only walk of every host collection.
///
/// Each element access is individually fault-bounded: a failing or
/// panicking element becomes an error entry in the report instead of
/// aborting the walk. Never fails, regardless of host corruption. Used
/// only on explicit diagnostic request.
pub fn emergency_dump(host: &dyn HostView) -> Value {
    let mut report = Map::new();

    for &name in host.collection_names() {
        let mut section = Map::new();
        match host.collection_len(name) {
            Some(len) => {
                section.insert("len".to_owned(), Value::from(len));
                // The length came from the host under inspection; never
                // pre-allocate on its word.
                let mut items = Vec::new();
                for index in 0..len {
                    let item = catch_unwind(AssertUnwindSafe(|| host.collection_item(name, index)));
                    items.push(match item {
                        Ok(Ok(value)) => value,
                        Ok(Err(e)) => serde_json::json!({"error": e.to_string()}),
                        Err(_) => serde_json::json!({"error": "panicked reading element"}),
                    });
                }
                section.insert("items".to_owned(), Value::Array(items));
            }
            None => {
                section.insert("error".to_owned(), Value::from("collection unreachable"));
            }
        }
        report.insert(name.to_owned(), Value::Object(section));
    }

    Value::Object(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
