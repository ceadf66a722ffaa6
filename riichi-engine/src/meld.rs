//! Immutable meld records.

use serde::{Deserialize, Serialize};

use crate::tiles::tile_to_34;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeldKind {
    Chi,
    Pon,
    OpenKan,
    ClosedKan,
    AddedKan,
}

impl MeldKind {
    pub fn is_open(self) -> bool {
        !matches!(self, MeldKind::ClosedKan)
    }

    pub fn is_kan(self) -> bool {
        matches!(self, MeldKind::OpenKan | MeldKind::ClosedKan | MeldKind::AddedKan)
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            MeldKind::Chi => "chi",
            MeldKind::Pon => "pon",
            MeldKind::OpenKan => "open_kan",
            MeldKind::ClosedKan => "closed_kan",
            MeldKind::AddedKan => "added_kan",
        }
    }
}

/// A called or self-declared meld. `source_seat` is the discarder for
/// chi/pon/open-kan, the caller's own seat for closed-kan, and the
/// original discarder of the pon being upgraded for added-kan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meld {
    pub kind: MeldKind,
    pub tiles: Vec<u8>,
    pub caller_seat: u8,
    pub source_seat: u8,
    pub called_tile: u8,
}

impl Meld {
    pub fn new(kind: MeldKind, tiles: Vec<u8>, caller_seat: u8, source_seat: u8, called_tile: u8) -> Self {
        debug_assert!(
            tiles.len() == 3 || tiles.len() == 4,
            "meld must have 3 or 4 tiles, got {}",
            tiles.len()
        );
        Self {
            kind,
            tiles,
            caller_seat,
            source_seat,
            called_tile,
        }
    }

    /// Hand-size contribution of this meld (always 3, kan included: the
    /// fourth tile is a bonus draw, not extra hand weight).
    pub fn hand_size_weight(&self) -> u8 {
        3
    }

    pub fn kind_34(&self) -> u8 {
        tile_to_34(self.called_tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kan_variants_report_open_correctly() {
        assert!(MeldKind::OpenKan.is_open());
        assert!(!MeldKind::ClosedKan.is_open());
        assert!(MeldKind::AddedKan.is_open());
        assert!(MeldKind::OpenKan.is_kan());
        assert!(!MeldKind::Pon.is_kan());
    }

    #[test]
    fn kan_hand_size_weight_is_three_not_four() {
        let meld = Meld::new(MeldKind::ClosedKan, vec![0, 1, 2, 3], 0, 0, 0);
        assert_eq!(meld.hand_size_weight(), 3);
    }
}
