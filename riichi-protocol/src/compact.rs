//! Compact integer packings for the two highest-frequency events on the
//! wire. Folding `(seat, tile_id[, flags])` into one integer keeps replay
//! logs and broadcast frames small without giving up exactness.

use crate::error::ProtocolError;

const NUM_TILES: u32 = 136;
const SEAT_TILE_SPACE: u32 = 4 * NUM_TILES; // 544
const MAX_DRAW: u32 = SEAT_TILE_SPACE - 1; // 543
const MAX_DISCARD: u32 = 4 * SEAT_TILE_SPACE - 1; // 2175

/// `d = seat * 136 + tile_id`, range `[0, 543]`.
pub fn encode_draw(seat: u8, tile_id: u8) -> Result<u32, ProtocolError> {
    if seat > 3 {
        return Err(ProtocolError::InvalidSeat(seat));
    }
    if tile_id > 135 {
        return Err(ProtocolError::InvalidTileId(tile_id));
    }
    Ok(seat as u32 * NUM_TILES + tile_id as u32)
}

/// Inverse of [`encode_draw`].
pub fn decode_draw(d: u32) -> Result<(u8, u8), ProtocolError> {
    if d > MAX_DRAW {
        return Err(ProtocolError::CompactIntOutOfRange(d));
    }
    let seat = (d / NUM_TILES) as u8;
    let tile_id = (d % NUM_TILES) as u8;
    Ok((seat, tile_id))
}

/// `flag = (riichi << 1) | tsumogiri; d = flag * 544 + seat * 136 + tile_id`,
/// range `[0, 2175]`.
pub fn encode_discard(
    seat: u8,
    tile_id: u8,
    is_tsumogiri: bool,
    is_riichi: bool,
) -> Result<u32, ProtocolError> {
    if seat > 3 {
        return Err(ProtocolError::InvalidSeat(seat));
    }
    if tile_id > 135 {
        return Err(ProtocolError::InvalidTileId(tile_id));
    }
    let flag = ((is_riichi as u32) << 1) | (is_tsumogiri as u32);
    Ok(flag * SEAT_TILE_SPACE + seat as u32 * NUM_TILES + tile_id as u32)
}

/// Inverse of [`encode_discard`]. Returns `(seat, tile_id, is_tsumogiri, is_riichi)`.
pub fn decode_discard(d: u32) -> Result<(u8, u8, bool, bool), ProtocolError> {
    if d > MAX_DISCARD {
        return Err(ProtocolError::CompactIntOutOfRange(d));
    }
    let flag = d / SEAT_TILE_SPACE;
    let remainder = d % SEAT_TILE_SPACE;
    let seat = (remainder / NUM_TILES) as u8;
    let tile_id = (remainder % NUM_TILES) as u8;
    let is_tsumogiri = flag & 0b01 != 0;
    let is_riichi = flag & 0b10 != 0;
    Ok((seat, tile_id, is_tsumogiri, is_riichi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_round_trips_full_range() {
        for seat in 0u8..4 {
            for tile_id in 0u8..136 {
                let encoded = encode_draw(seat, tile_id).unwrap();
                assert_eq!(decode_draw(encoded).unwrap(), (seat, tile_id));
            }
        }
        assert_eq!(encode_draw(3, 135).unwrap(), MAX_DRAW);
    }

    #[test]
    fn discard_round_trips_full_range() {
        for seat in 0u8..4 {
            for tsumogiri in [false, true] {
                for riichi in [false, true] {
                    let tile_id = 17u8;
                    let encoded = encode_discard(seat, tile_id, tsumogiri, riichi).unwrap();
                    assert_eq!(
                        decode_discard(encoded).unwrap(),
                        (seat, tile_id, tsumogiri, riichi)
                    );
                }
            }
        }
        assert_eq!(
            encode_discard(3, 135, true, true).unwrap(),
            MAX_DISCARD
        );
    }

    #[test]
    fn rejects_seat_and_tile_out_of_range() {
        assert!(matches!(
            encode_draw(4, 0),
            Err(ProtocolError::InvalidSeat(4))
        ));
        assert!(matches!(
            encode_draw(0, 136),
            Err(ProtocolError::InvalidTileId(136))
        ));
        assert!(matches!(
            decode_draw(MAX_DRAW + 1),
            Err(ProtocolError::CompactIntOutOfRange(_))
        ));
    }
}
