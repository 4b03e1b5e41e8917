//! Event-triggered joker reorder scheduling.
//!
//! A joker reorder is only effect-correct at one exact point in the
//! host's internal event sequence: after hand evaluation completes, before
//! the host's own cleanup reads the rack. Reordering anywhere else yields
//! a different score next hand. So a [`ReorderScheduler`] never applies a
//! permutation directly -- `schedule` stores it and attaches an observer
//! to the `evaluate_play_complete` hook, and the *next* firing of that
//! event applies the stored permutation, then clears it. A request is
//! consumed exactly once, cleared whether or not the apply succeeded.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::hooks::HookRegistry;
use crate::host::Host;
use crate::BridgeError;

/// Name of the host's evaluation-complete event hook.
pub const HOOK_EVALUATION_COMPLETE: &str = "evaluate_play_complete";

// ---------------------------------------------------------------------------
// ReorderScheduler
// ---------------------------------------------------------------------------

/// Holds at most one pending reorder permutation and arms the
/// evaluation-complete observer that will consume it.
///
/// The pending slot is shared with the observer closure via `Rc<RefCell>`;
/// the whole bridge runs on the host's single update thread, so there is
/// no synchronization to do.
#[derive(Default)]
pub struct ReorderScheduler {
    pending: Rc<RefCell<Option<Vec<usize>>>>,
}

impl ReorderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `new_order` as the pending permutation and make sure the
    /// evaluation-complete event is wrapped and observed.
    ///
    /// Scheduling again before the event fires replaces the pending
    /// permutation. Installation is idempotent both ways: the registry
    /// keeps one wrapper and one observer per hook name. If the embedder
    /// has not wrapped the event itself, a pass-through wrapper is
    /// installed so the observer has an event to ride.
    pub fn schedule(&mut self, registry: &mut HookRegistry, new_order: Vec<usize>) {
        debug!(?new_order, "reorder scheduled for next evaluation-complete");
        *self.pending.borrow_mut() = Some(new_order);

        if !registry.installed(HOOK_EVALUATION_COMPLETE) {
            registry.install(
                HOOK_EVALUATION_COMPLETE,
                Box::new(|_host, _args| Ok(Value::Null)),
            );
        }
        if !registry.observed(HOOK_EVALUATION_COMPLETE) {
            let pending = Rc::clone(&self.pending);
            registry.observe(
                HOOK_EVALUATION_COMPLETE,
                Box::new(move |host| {
                    // Consume exactly once; cleared regardless of outcome.
                    let Some(order) = pending.borrow_mut().take() else {
                        return;
                    };
                    match apply_reorder(host, &order) {
                        Ok(()) => info!(?order, "joker reorder applied"),
                        Err(e) => warn!(error = %e, "scheduled reorder rejected"),
                    }
                }),
            );
        }
    }

    /// Whether a permutation is waiting for the event.
    pub fn pending(&self) -> bool {
        self.pending.borrow().is_some()
    }
}

// ---------------------------------------------------------------------------
// apply_reorder
// ---------------------------------------------------------------------------

/// Reorder the host's joker rack so position `i` holds the joker that was
/// at `new_order[i]`, then recompute each slot's `position` bookkeeping.
///
/// Validates before touching anything: the permutation must have exactly
/// the rack's length, every index in range, no duplicates. A rejected
/// permutation leaves the rack untouched.
///
/// # Errors
///
/// [`BridgeError::Validation`] with a descriptive message on any
/// validation failure.
pub fn apply_reorder(host: &mut dyn Host, new_order: &[usize]) -> Result<(), BridgeError> {
    let rack = host.jokers_mut();
    let len = rack.len();

    if new_order.len() != len {
        return Err(BridgeError::Validation(format!(
            "permutation has {} entries but the rack holds {len} jokers",
            new_order.len()
        )));
    }
    let mut seen = vec![false; len];
    for &index in new_order {
        if index >= len {
            return Err(BridgeError::Validation(format!(
                "permutation index {index} out of range for {len} jokers"
            )));
        }
        if seen[index] {
            return Err(BridgeError::Validation(format!(
                "permutation repeats index {index}"
            )));
        }
        seen[index] = true;
    }

    let previous = rack.clone();
    rack.clear();
    for (position, &source) in new_order.iter().enumerate() {
        let mut slot = previous[source].clone();
        slot.position = position;
        rack.push(slot);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
