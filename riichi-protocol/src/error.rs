use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("seat {0} is out of range 0..=3")]
    InvalidSeat(u8),

    #[error("tile id {0} is out of range 0..=135")]
    InvalidTileId(u8),

    #[error("compact integer {0} is out of the valid range")]
    CompactIntOutOfRange(u32),

    #[error("frame exceeds maximum size of {max} bytes (got {actual})")]
    FrameTooLarge { max: usize, actual: usize },

    #[error("string exceeds maximum length of {max} bytes")]
    StringTooLarge { max: usize },

    #[error("binary payload exceeds maximum length of {max} bytes")]
    BinaryTooLarge { max: usize },

    #[error("array exceeds maximum length of {max} elements")]
    ArrayTooLarge { max: usize },

    #[error("map exceeds maximum length of {max} entries")]
    MapTooLarge { max: usize },

    #[error("top-level payload must be a map")]
    TopLevelNotMap,

    #[error("msgpack decode failed: {0}")]
    Decode(String),

    #[error("msgpack encode failed: {0}")]
    Encode(String),
}
