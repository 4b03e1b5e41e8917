//! Change-detection-gated state publishing.
//!
//! Every logical tick the publisher fetches a fresh snapshot, fingerprints
//! it, and publishes only when the fingerprint differs from the last one
//! successfully published. The projection behind the fingerprint is
//! deliberately lossy (see `cardbridge_protocol::fingerprint`): the
//! controller polls state, it does not need every cosmetic twitch.

use tracing::{debug, warn};

use cardbridge_protocol::prelude::Fingerprint;

use crate::channel::ActionChannel;
use crate::host::HostView;

// ---------------------------------------------------------------------------
// ChangePublisher
// ---------------------------------------------------------------------------

/// Publishes state updates when -- and only when -- the fingerprint moves.
///
/// `last_published` starts unset, so the first snapshot that can be
/// fetched is always published. It is only updated after a *successful*
/// write: a failed publish is not retried directly, but the unchanged
/// stored fingerprint means the very next tick publishes again,
/// reconciling the miss.
#[derive(Debug, Default)]
pub struct ChangePublisher {
    last_published: Option<Fingerprint>,
}

impl ChangePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one tick's worth of change detection.
    ///
    /// Returns the outbound sequence number if a state update was
    /// published. A missing snapshot skips silently (no crash, no stale
    /// republish); a write failure is logged and swallowed.
    pub fn publish_if_changed(
        &mut self,
        host: &dyn HostView,
        channel: &mut ActionChannel,
    ) -> Option<u64> {
        let Some(snapshot) = host.snapshot() else {
            debug!("snapshot unavailable, skipping publish");
            return None;
        };

        let fingerprint = Fingerprint::of(&snapshot);
        if self.last_published.as_ref() == Some(&fingerprint) {
            return None;
        }

        match channel.publish_state(snapshot) {
            Ok(sequence) => {
                self.last_published = Some(fingerprint);
                Some(sequence)
            }
            Err(e) => {
                warn!(error = %e, "state publish failed, will retry on next tick");
                None
            }
        }
    }

    /// Fingerprint of the last successfully published snapshot.
    pub fn last_published(&self) -> Option<&Fingerprint> {
        self.last_published.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
