//! Seat assignment for a new game (§4.4 "Matchmaker"). Both which seats go
//! to humans and the order in which the supplied names fill them come from
//! a single RNG sample, so an all-human game still gets seat randomisation.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::ports::StandardWallBuilder;
use crate::settings::MAX_AI_PLAYERS;

pub const NUM_PLAYERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatOccupant {
    Human { name: String },
    Ai { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatConfig {
    pub seat: u8,
    pub occupant: SeatOccupant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchmakerError {
    TooManyPlayers(usize),
    EmptyName,
    DuplicateName(String),
    NameCollidesWithAi(String),
}

fn ai_player_name(n: usize) -> String {
    format!("Tsumogiri {n}")
}

/// Builds four `SeatConfig`s from `player_names` (length 1..=4) using
/// `seed` to pick both which seats are human and the order names fill
/// them; vacant seats are assigned AI players named `"Tsumogiri N"`.
pub fn fill_seats(player_names: &[String], seed: &[u8]) -> Result<[SeatConfig; NUM_PLAYERS], MatchmakerError> {
    if player_names.is_empty() || player_names.len() > NUM_PLAYERS {
        return Err(MatchmakerError::TooManyPlayers(player_names.len()));
    }
    let mut seen = std::collections::HashSet::new();
    for name in player_names {
        if name.trim().is_empty() {
            return Err(MatchmakerError::EmptyName);
        }
        if !seen.insert(name.clone()) {
            return Err(MatchmakerError::DuplicateName(name.clone()));
        }
        if name.starts_with("Tsumogiri ") {
            return Err(MatchmakerError::NameCollidesWithAi(name.clone()));
        }
    }

    let mut rng = ChaCha8Rng::from_seed(StandardWallBuilder::fold_seed(seed));
    let mut seat_order: Vec<u8> = (0u8..NUM_PLAYERS as u8).collect();
    seat_order.shuffle(&mut rng);
    let human_seats: Vec<u8> = seat_order.into_iter().take(player_names.len()).collect();

    let mut occupants: [Option<SeatOccupant>; NUM_PLAYERS] = Default::default();
    for (name, &seat) in player_names.iter().zip(human_seats.iter()) {
        occupants[seat as usize] = Some(SeatOccupant::Human { name: name.clone() });
    }

    let mut ai_number = 1usize;
    for occupant in occupants.iter_mut() {
        if occupant.is_none() {
            *occupant = Some(SeatOccupant::Ai { name: ai_player_name(ai_number) });
            ai_number += 1;
        }
    }

    debug_assert!((ai_number - 1) <= MAX_AI_PLAYERS as usize);

    Ok(std::array::from_fn(|seat| SeatConfig {
        seat: seat as u8,
        occupant: occupants[seat].take().expect("every seat filled above"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_seat_exactly_once() {
        let names = vec!["Alice".to_string()];
        let configs = fill_seats(&names, b"seed-a").unwrap();
        assert_eq!(configs.len(), 4);
        let human_count = configs
            .iter()
            .filter(|c| matches!(c.occupant, SeatOccupant::Human { .. }))
            .count();
        assert_eq!(human_count, 1);
    }

    #[test]
    fn is_deterministic_for_the_same_seed() {
        let names = vec!["Alice".to_string(), "Bob".to_string()];
        let a = fill_seats(&names, b"fixed-seed").unwrap();
        let b = fill_seats(&names, b"fixed-seed").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn all_human_game_still_randomises_seat_order() {
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()];
        let configs = fill_seats(&names, b"all-human-seed").unwrap();
        assert!(configs.iter().all(|c| matches!(c.occupant, SeatOccupant::Human { .. })));
    }

    #[test]
    fn rejects_name_colliding_with_generated_ai_names() {
        let names = vec!["Tsumogiri 1".to_string()];
        assert_eq!(
            fill_seats(&names, b"seed"),
            Err(MatchmakerError::NameCollidesWithAi("Tsumogiri 1".to_string()))
        );
    }

    #[test]
    fn rejects_duplicate_names() {
        let names = vec!["Alice".to_string(), "Alice".to_string()];
        assert_eq!(
            fill_seats(&names, b"seed"),
            Err(MatchmakerError::DuplicateName("Alice".to_string()))
        );
    }
}
