//! Table snapshot types -- a full read-only projection of host state.
//!
//! A [`TableSnapshot`] is produced by the host-side snapshot provider once
//! per logical tick and is never mutated in place: the next tick gets a
//! fresh one. The bridge treats it as opaque except for the fingerprint
//! projection (see [`crate::fingerprint`]).
//!
//! Field names follow the JSON the external controller already speaks, so
//! every type here serializes with snake_case tags.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Phase and card attribute enums
// ---------------------------------------------------------------------------

/// The host's current table phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TablePhase {
    /// Picking cards to play or discard.
    #[default]
    HandSelection,
    /// Browsing the shop between rounds.
    Shop,
    /// Choosing the next blind.
    BlindSelection,
    /// A played hand is being scored.
    Scoring,
}

/// Card enhancement applied by game effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Enhancement {
    #[default]
    None,
    Gold,
    Steel,
    Glass,
    Wild,
    Bonus,
    Mult,
    Stone,
}

/// Card edition (visual/mechanical variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Edition {
    #[default]
    None,
    Foil,
    Holographic,
    Polychrome,
    Negative,
}

/// Card seal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Seal {
    #[default]
    None,
    Red,
    Blue,
    Gold,
    Purple,
}

/// Blind tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlindType {
    #[default]
    Small,
    Big,
    Boss,
}

// ---------------------------------------------------------------------------
// Collection element types
// ---------------------------------------------------------------------------

/// A playing card in the current hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Host-assigned stable identifier.
    pub id: String,
    pub rank: String,
    pub suit: String,
    #[serde(default)]
    pub enhancement: Enhancement,
    #[serde(default)]
    pub edition: Edition,
    #[serde(default)]
    pub seal: Seal,
}

/// One slot in the host's ordered joker rack.
///
/// `position` is position-dependent bookkeeping: it must always equal the
/// slot's index in the rack. The reorder scheduler recomputes it after
/// every structural reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JokerSlot {
    pub id: String,
    pub name: String,
    pub position: usize,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// A consumable card the player holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumable {
    pub id: String,
    pub name: String,
    pub card_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// The blind currently being played (or offered).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blind {
    pub name: String,
    pub blind_type: BlindType,
    pub requirement: i64,
    pub reward: i64,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// An item offered in the shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopItem {
    pub index: usize,
    /// `"joker"`, `"consumable"`, or `"pack"`.
    pub item_type: String,
    pub name: String,
    pub cost: i64,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// TableSnapshot
// ---------------------------------------------------------------------------

/// Complete read-only projection of host state at one instant.
///
/// Recomputed each tick by the snapshot provider; the bridge never mutates
/// one. Only the fields named by the fingerprint projection participate in
/// change detection -- the rest ride along for the controller's benefit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TableSnapshot {
    /// Identifier of the current run; stable for its whole lifetime.
    pub session_id: String,
    pub phase: TablePhase,
    pub ante: u32,
    pub money: i64,
    pub hands_remaining: u32,
    pub discards_remaining: u32,
    #[serde(default)]
    pub hand: Vec<Card>,
    #[serde(default)]
    pub jokers: Vec<JokerSlot>,
    #[serde(default)]
    pub consumables: Vec<Consumable>,
    #[serde(default)]
    pub current_blind: Option<Blind>,
    #[serde(default)]
    pub shop: Vec<ShopItem>,
    /// Action type tags the host considers legal right now.
    #[serde(default)]
    pub available_actions: Vec<String>,
    /// True only inside the post-evaluation window where a joker reorder
    /// is effect-correct.
    #[serde(default)]
    pub reorder_window_open: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
