//! Cardbridge Protocol -- wire data model for the card-table control bridge.
//!
//! This crate defines the shared vocabulary between the in-process bridge
//! (`cardbridge`) and the external controller it talks to over a shared
//! directory: table snapshots, the action set, execution outcomes, the
//! channel message envelopes, and the change-detection fingerprint.
//!
//! Everything here is plain data. No I/O, no scheduling, no host access --
//! those live in the `cardbridge` crate.
//!
//! # Example
//!
//! ```
//! use cardbridge_protocol::prelude::*;
//!
//! let snapshot = TableSnapshot::default();
//! let fp = Fingerprint::of(&snapshot);
//! assert_eq!(fp, Fingerprint::of(&snapshot.clone()));
//! ```

#![deny(unsafe_code)]

pub mod action;
pub mod fingerprint;
pub mod message;
pub mod snapshot;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common protocol usage.
pub mod prelude {
    pub use crate::action::{Action, ActionOutcome};
    pub use crate::fingerprint::Fingerprint;
    pub use crate::message::{
        unix_millis, CommandEnvelope, ResultMessage, StateMessage, MSG_ACTION_COMMAND,
        MSG_ACTION_RESULT, MSG_GAME_STATE,
    };
    pub use crate::snapshot::{
        Blind, BlindType, Card, Consumable, Edition, Enhancement, JokerSlot, Seal, ShopItem,
        TablePhase, TableSnapshot,
    };
}
