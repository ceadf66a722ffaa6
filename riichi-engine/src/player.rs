//! Immutable per-seat, per-round player snapshot.

use serde::{Deserialize, Serialize};

use crate::meld::Meld;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardEntry {
    pub tile_id: u8,
    pub is_tsumogiri: bool,
    pub is_riichi_discard: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MahjongPlayer {
    pub seat: u8,
    pub score: i32,
    pub hand: Vec<u8>,
    pub melds: Vec<Meld>,
    pub discards: Vec<DiscardEntry>,
    pub is_riichi: bool,
    pub is_daburi: bool,
    pub is_ippatsu: bool,
    pub is_temporary_furiten: bool,
    pub is_riichi_furiten: bool,
    /// Set once any call (chi/pon/kan) takes a tile from this seat's
    /// discard pile. Tracked independently of `discards` itself, since a
    /// called tile is popped off the visible pile entirely (§4.2) and would
    /// otherwise leave no trace for the nagashi mangan check.
    pub discard_was_called: bool,
}

impl MahjongPlayer {
    pub fn new(seat: u8, score: i32, hand: Vec<u8>) -> Self {
        Self {
            seat,
            score,
            hand,
            melds: Vec::new(),
            discards: Vec::new(),
            is_riichi: false,
            is_daburi: false,
            is_ippatsu: false,
            is_temporary_furiten: false,
            is_riichi_furiten: false,
            discard_was_called: false,
        }
    }

    /// Total hand-size weight: concealed tiles plus 3 per meld (kan
    /// included, per the invariant in §8), plus the held draw if any.
    pub fn tile_count(&self, holding_draw: bool) -> usize {
        self.hand.len() + self.melds.iter().map(|m| m.hand_size_weight() as usize).sum::<usize>()
            + holding_draw as usize
    }

    pub fn is_furiten(&self) -> bool {
        self.is_temporary_furiten || self.is_riichi_furiten
    }

    pub fn has_open_melds(&self) -> bool {
        self.melds.iter().any(|m| m.kind.is_open())
    }

    pub fn concealed_count(&self, kind_34: u8) -> u8 {
        self.hand.iter().filter(|&&t| t / 4 == kind_34).count() as u8
    }
}
