//! Interval-throttled tick scheduling.
//!
//! The host calls [`BridgeScheduler::update`] once per frame with the
//! elapsed time. The scheduler accumulates it and, when a configurable
//! interval has elapsed and the host allows work, runs exactly one
//! *logical tick* in a fixed order:
//!
//! 1. Service the deferred capture (publish the previous command's
//!    completed result).
//! 2. Poll and dispatch at most one inbound command.
//! 3. Change-detection publish.
//!
//! One invocation never performs more than one logical tick's work: if the
//! host stalled for several intervals, the accumulator is reset rather
//! than replayed, so the bridge never bursts catch-up work into a single
//! frame.

use tracing::{debug, info, warn};

use crate::capture::PendingAction;
use crate::channel::ActionChannel;
use crate::host::{ActionExecutor, Host};
use crate::publish::ChangePublisher;

// ---------------------------------------------------------------------------
// SchedulerConfig
// ---------------------------------------------------------------------------

/// Configuration for the bridge scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Seconds of host time between logical ticks. Must be positive and
    /// finite.
    pub interval: f64,
}

impl Default for SchedulerConfig {
    /// Defaults to two logical ticks per second.
    fn default() -> Self {
        Self { interval: 0.5 }
    }
}

// ---------------------------------------------------------------------------
// BridgeScheduler
// ---------------------------------------------------------------------------

/// Drives the per-tick pipeline: deferred capture, command dispatch,
/// change-detection publish.
pub struct BridgeScheduler {
    config: SchedulerConfig,
    accumulator: f64,
    active: bool,
    tick_counter: u64,
    channel: ActionChannel,
    pending: PendingAction,
    publisher: ChangePublisher,
}

impl BridgeScheduler {
    /// Create a scheduler over an opened channel.
    ///
    /// The scheduler starts inactive; call [`start`](Self::start).
    ///
    /// # Panics
    ///
    /// Panics if `config.interval` is not positive and finite.
    pub fn new(channel: ActionChannel, config: SchedulerConfig) -> Self {
        assert!(
            config.interval > 0.0 && config.interval.is_finite(),
            "interval must be positive and finite, got {}",
            config.interval
        );
        Self {
            config,
            accumulator: 0.0,
            active: false,
            tick_counter: 0,
            channel,
            pending: PendingAction::new(),
            publisher: ChangePublisher::new(),
        }
    }

    /// Activate the scheduler.
    pub fn start(&mut self) {
        self.active = true;
        info!("bridge scheduler started");
    }

    /// Deactivate the scheduler. Accumulated time and in-flight state are
    /// kept; a later [`start`](Self::start) resumes where things stood.
    pub fn stop(&mut self) {
        self.active = false;
        info!("bridge scheduler stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// One per-frame invocation with `dt` seconds of elapsed host time.
    ///
    /// Returns `true` when a logical tick ran. Inactive or host-disallowed
    /// invocations do nothing and do not reset the accumulator, so a later
    /// allowed invocation is not starved. At most one logical tick runs
    /// per invocation regardless of how many intervals elapsed.
    pub fn update(
        &mut self,
        dt: f64,
        host: &mut dyn Host,
        executor: &mut dyn ActionExecutor,
    ) -> bool {
        if !self.active {
            return false;
        }
        self.accumulator += dt;
        if !host.update_allowed() {
            return false;
        }
        if self.accumulator < self.config.interval {
            return false;
        }

        // Reset, not subtract: missed intervals are dropped, never bursted.
        self.accumulator = 0.0;
        self.logical_tick(host, executor);
        true
    }

    /// Number of logical ticks performed.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    fn logical_tick(&mut self, host: &mut dyn Host, executor: &mut dyn ActionExecutor) {
        self.tick_counter += 1;
        debug!(tick = self.tick_counter, "logical tick");

        // Phase 1: finish the previous command's result if its snapshot is
        // now available.
        if let Some((sequence, outcome)) = self.pending.service(host) {
            if let Err(e) = self.channel.publish_result(sequence, outcome) {
                // Not retried: the result is gone, the periodic state
                // publish keeps the controller current.
                warn!(sequence, error = %e, "failed to write action result");
            }
        }

        // Phase 2: at most one command per tick. The dispatcher drops
        // stale sequences and anything arriving while in flight.
        if let Some(envelope) = self.channel.poll() {
            self.pending.dispatch(envelope, executor);
        }

        // Phase 3: publish on fingerprint change.
        self.publisher.publish_if_changed(host, &mut self.channel);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
