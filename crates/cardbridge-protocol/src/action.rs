//! The controller-authored action set and execution outcomes.
//!
//! Actions arrive over the channel as JSON objects discriminated by an
//! `action_type` tag. [`Action`] mirrors that wire shape exactly
//! (`#[serde(tag = "action_type")]`), so a well-formed payload with an
//! *unknown* tag fails typed decoding -- which the bridge reports back as a
//! failed result rather than dropping the command.

use serde::{Deserialize, Serialize};

use crate::snapshot::TableSnapshot;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A single controller request. Immutable once read off the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "snake_case")]
pub enum Action {
    /// Play the selected hand cards.
    PlayHand { card_indices: Vec<usize> },
    /// Discard the selected hand cards.
    DiscardCards { card_indices: Vec<usize> },
    /// Leave the round and enter the shop.
    GoToShop,
    /// Buy the shop item at the given offer index.
    BuyItem { shop_index: usize },
    /// Sell the joker at the given rack index.
    SellJoker { joker_index: usize },
    /// Sell the consumable at the given index.
    SellConsumable { consumable_index: usize },
    /// Reorder the joker rack; `new_order[i]` is the current index of the
    /// joker that should end up in position `i`. Applied at the
    /// evaluation-complete point, not immediately.
    ReorderJokers { new_order: Vec<usize> },
    /// Choose the next blind.
    SelectBlind { blind_type: String },
    /// Pick an offer out of an opened pack.
    SelectPackOffer { pack_index: usize },
    /// Reroll the boss blind.
    RerollBoss,
    /// Reroll the shop contents.
    RerollShop,
    SortHandByRank,
    SortHandBySuit,
    /// Use the consumable with the given id.
    UseConsumable { item_id: String },
}

impl Action {
    /// The wire tag for this action, as it appears in `action_type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::PlayHand { .. } => "play_hand",
            Action::DiscardCards { .. } => "discard_cards",
            Action::GoToShop => "go_to_shop",
            Action::BuyItem { .. } => "buy_item",
            Action::SellJoker { .. } => "sell_joker",
            Action::SellConsumable { .. } => "sell_consumable",
            Action::ReorderJokers { .. } => "reorder_jokers",
            Action::SelectBlind { .. } => "select_blind",
            Action::SelectPackOffer { .. } => "select_pack_offer",
            Action::RerollBoss => "reroll_boss",
            Action::RerollShop => "reroll_shop",
            Action::SortHandByRank => "sort_hand_by_rank",
            Action::SortHandBySuit => "sort_hand_by_suit",
            Action::UseConsumable { .. } => "use_consumable",
        }
    }
}

// ---------------------------------------------------------------------------
// ActionOutcome
// ---------------------------------------------------------------------------

/// Result of executing one accepted action. Exactly one of these is
/// produced per accepted command; `new_state` is attached a tick later by
/// the deferred capture coordinator, once the host's own bookkeeping has
/// made the mutation visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub new_state: Option<TableSnapshot>,
}

impl ActionOutcome {
    /// A successful outcome, snapshot still pending.
    pub fn ok() -> Self {
        Self {
            success: true,
            error_message: None,
            new_state: None,
        }
    }

    /// A failed outcome with a descriptive message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            new_state: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
