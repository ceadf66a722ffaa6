//! Rule-tunable settings for a single game. Kept distinct from the server's
//! ambient process configuration (listen address, secrets, directories),
//! which lives in `riichi-server::settings`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KanDoraTiming {
    Immediate,
    AfterDiscard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameLength {
    EastOnly,
    Hanchan,
    WestEnchousen,
}

impl GameLength {
    pub fn unique_dealer_threshold(self) -> u32 {
        match self {
            GameLength::EastOnly => 4,
            GameLength::Hanchan => 8,
            GameLength::WestEnchousen => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    pub initial_score: i32,
    pub double_ron_limit: u8, // 2 or 3 simultaneous ron winners permitted
    pub max_kans_per_round: u32,
    pub min_players_for_kan_abort: u32,
    pub four_winds_discard_count: u32,
    pub kan_dora_timing: KanDoraTiming,
    pub game_length: GameLength,
    pub dealer_renchan_override_score: Option<i32>,
    pub base_turn_seconds: f64,
    pub initial_bank_seconds: f64,
    pub max_bank_seconds: f64,
    pub round_bonus_seconds: f64,
    pub meld_decision_seconds: f64,
    pub round_advance_seconds: f64,
    pub reconnect_grace_seconds: f64,
}

pub const MAX_AI_PLAYERS: u8 = 3;

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            initial_score: 25_000,
            double_ron_limit: 2,
            max_kans_per_round: 4,
            min_players_for_kan_abort: 2,
            four_winds_discard_count: 4,
            kan_dora_timing: KanDoraTiming::AfterDiscard,
            game_length: GameLength::Hanchan,
            dealer_renchan_override_score: None,
            base_turn_seconds: 5.0,
            initial_bank_seconds: 20.0,
            max_bank_seconds: 60.0,
            round_bonus_seconds: 10.0,
            meld_decision_seconds: 5.0,
            round_advance_seconds: 15.0,
            reconnect_grace_seconds: 30.0,
        }
    }
}
