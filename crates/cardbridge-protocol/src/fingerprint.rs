//! Change-detection fingerprint with BLAKE3 hashing.
//!
//! A [`Fingerprint`] is a deliberately lossy summary of a
//! [`TableSnapshot`]: it hashes a fixed, ordered projection of the fields
//! that indicate a meaningful change, and nothing else. Equality of
//! fingerprints is the sole change signal -- two snapshots that agree on
//! every projected field are "unchanged" even if untracked fields differ.
//!
//! The projection covers: session id, phase, ante, money, hands and
//! discards remaining, hand size, joker count, and whether the reorder
//! window is open. Collection *contents* are intentionally outside the
//! projection; only their sizes participate.

use serde::Serialize;

use crate::snapshot::{TablePhase, TableSnapshot};

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// BLAKE3 hex digest (64 lowercase hex chars) of the snapshot projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

/// The ordered field projection that is actually hashed.
///
/// Kept as a named struct (not a tuple) so the serialized form -- and
/// therefore the hash -- is stable against field reordering mistakes.
#[derive(Serialize)]
struct Projection<'a> {
    session_id: &'a str,
    phase: TablePhase,
    ante: u32,
    money: i64,
    hands_remaining: u32,
    discards_remaining: u32,
    hand_size: usize,
    joker_count: usize,
    reorder_window_open: bool,
}

impl Fingerprint {
    /// Compute the fingerprint of a snapshot.
    pub fn of(snapshot: &TableSnapshot) -> Self {
        let projection = Projection {
            session_id: &snapshot.session_id,
            phase: snapshot.phase,
            ante: snapshot.ante,
            money: snapshot.money,
            hands_remaining: snapshot.hands_remaining,
            discards_remaining: snapshot.discards_remaining,
            hand_size: snapshot.hand.len(),
            joker_count: snapshot.jokers.len(),
            reorder_window_open: snapshot.reorder_window_open,
        };

        let bytes = serde_json::to_vec(&projection)
            .expect("fingerprint projection should always be JSON-serializable");
        Fingerprint(blake3::hash(&bytes).to_hex().to_string())
    }

    /// The hex digest.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
