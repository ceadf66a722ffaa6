//! Msgpack framing with the same strict size limits the distilled source
//! enforces before handing a decoded value to application code. The limits
//! exist so a single malformed or hostile frame cannot allocate unbounded
//! memory while being unpacked.

use crate::error::ProtocolError;
use crate::messages::ClientFrame;
use rmpv::Value;
use serde::Serialize;

pub const MAX_BUFFER_LEN: usize = 256 * 1024;
pub const MAX_STR_LEN: usize = 64 * 1024;
pub const MAX_BIN_LEN: usize = 64 * 1024;
pub const MAX_ARRAY_LEN: usize = 1024;
pub const MAX_MAP_LEN: usize = 256;
pub const MAX_EXT_LEN: usize = 1024;

/// Serializes `value` to msgpack and rejects the result if it exceeds
/// [`MAX_BUFFER_LEN`]. Callers should prefer struct/map-shaped payloads so
/// the frame decodes as a top-level map on the other end.
pub fn encode_frame<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    let bytes = rmp_serde::to_vec_named(value).map_err(|e| ProtocolError::Encode(e.to_string()))?;
    if bytes.len() > MAX_BUFFER_LEN {
        return Err(ProtocolError::FrameTooLarge {
            max: MAX_BUFFER_LEN,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Decodes a raw frame into a generic [`Value`], enforcing size limits on
/// the outer buffer and on every string/binary/array/map/ext nested inside
/// it, and requiring the top-level shape to be a map.
pub fn decode_frame(bytes: &[u8]) -> Result<Value, ProtocolError> {
    if bytes.len() > MAX_BUFFER_LEN {
        return Err(ProtocolError::FrameTooLarge {
            max: MAX_BUFFER_LEN,
            actual: bytes.len(),
        });
    }
    let value: Value =
        rmpv::decode::read_value(&mut &bytes[..]).map_err(|e| ProtocolError::Decode(e.to_string()))?;

    if !matches!(value, Value::Map(_)) {
        return Err(ProtocolError::TopLevelNotMap);
    }
    check_limits(&value)?;
    Ok(value)
}

fn check_limits(value: &Value) -> Result<(), ProtocolError> {
    match value {
        Value::String(s) => {
            let len = s.as_bytes().len();
            if len > MAX_STR_LEN {
                return Err(ProtocolError::StringTooLarge { max: MAX_STR_LEN });
            }
        }
        Value::Binary(b) => {
            if b.len() > MAX_BIN_LEN {
                return Err(ProtocolError::BinaryTooLarge { max: MAX_BIN_LEN });
            }
        }
        Value::Ext(_, data) => {
            if data.len() > MAX_EXT_LEN {
                return Err(ProtocolError::BinaryTooLarge { max: MAX_EXT_LEN });
            }
        }
        Value::Array(items) => {
            if items.len() > MAX_ARRAY_LEN {
                return Err(ProtocolError::ArrayTooLarge { max: MAX_ARRAY_LEN });
            }
            for item in items {
                check_limits(item)?;
            }
        }
        Value::Map(entries) => {
            if entries.len() > MAX_MAP_LEN {
                return Err(ProtocolError::MapTooLarge { max: MAX_MAP_LEN });
            }
            for (k, v) in entries {
                check_limits(k)?;
                check_limits(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Decodes and size-checks a raw client frame, then shapes it into
/// [`ClientFrame`]. Kept separate from [`decode_frame`] so callers that
/// only need the size-limit enforcement (e.g. inspecting `t` before
/// committing to a full decode) aren't forced through the typed path.
pub fn decode_client_frame(bytes: &[u8]) -> Result<ClientFrame, ProtocolError> {
    let value = decode_frame(bytes)?;
    rmpv::ext::from_value(value).map_err(|e| ProtocolError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Ping {
        t: u8,
        nonce: u32,
    }

    #[test]
    fn encodes_and_decodes_a_map_payload() {
        let frame = encode_frame(&Ping { t: 5, nonce: 42 }).unwrap();
        let value = decode_frame(&frame).unwrap();
        assert!(matches!(value, Value::Map(_)));
    }

    #[test]
    fn rejects_non_map_top_level() {
        let bytes = rmp_serde::to_vec(&vec![1, 2, 3]).unwrap();
        assert!(matches!(
            decode_frame(&bytes),
            Err(ProtocolError::TopLevelNotMap)
        ));
    }

    #[test]
    fn rejects_oversize_string() {
        #[derive(Serialize)]
        struct Big {
            s: String,
        }
        let big = Big {
            s: "a".repeat(MAX_STR_LEN + 1),
        };
        let bytes = rmp_serde::to_vec_named(&big).unwrap();
        assert!(matches!(
            decode_frame(&bytes),
            Err(ProtocolError::StringTooLarge { .. }) | Err(ProtocolError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn rejects_oversize_array() {
        #[derive(Serialize)]
        struct Big {
            items: Vec<u8>,
        }
        let big = Big {
            items: vec![0u8; MAX_ARRAY_LEN + 1],
        };
        let bytes = rmp_serde::to_vec_named(&big).unwrap();
        assert!(matches!(
            decode_frame(&bytes),
            Err(ProtocolError::ArrayTooLarge { .. })
        ));
    }
}
