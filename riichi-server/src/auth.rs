//! Admission ticket verification: `base64url(payload).base64url(sig)` where
//! `payload` is a JSON object and `sig` is an HMAC-SHA256 over the payload's
//! base64url bytes, keyed with the server's shared ticket secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const TICKET_TTL_SECONDS: u64 = 86_400;

#[derive(Debug, Deserialize, Clone)]
pub struct TicketPayload {
    pub user_id: String,
    pub username: String,
    pub room_id: String,
    pub issued_at: u64,
    pub expires_at: u64,
}

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("malformed ticket: expected exactly one '.' separator")]
    Malformed,
    #[error("invalid base64 encoding")]
    InvalidEncoding,
    #[error("invalid payload json")]
    InvalidPayload,
    #[error("signature does not match")]
    BadSignature,
    #[error("ticket expired")]
    Expired,
}

/// Verifies `ticket` against `secret`, returning the decoded payload only if
/// the signature checks out (constant-time) and `now` is within
/// `[issued_at, expires_at]`.
pub fn verify_ticket(ticket: &str, secret: &[u8], now: u64) -> Result<TicketPayload, TicketError> {
    let (payload_b64, sig_b64) = ticket.split_once('.').ok_or(TicketError::Malformed)?;
    if payload_b64.contains('.') || sig_b64.contains('.') {
        return Err(TicketError::Malformed);
    }

    let payload_bytes = URL_SAFE_NO_PAD.decode(payload_b64).map_err(|_| TicketError::InvalidEncoding)?;
    let sig_bytes = URL_SAFE_NO_PAD.decode(sig_b64).map_err(|_| TicketError::InvalidEncoding)?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts a key of any length");
    mac.update(payload_b64.as_bytes());
    // `verify_slice` is constant-time; never compare signatures byte-by-byte directly.
    mac.verify_slice(&sig_bytes).map_err(|_| TicketError::BadSignature)?;

    let payload: TicketPayload = serde_json::from_slice(&payload_bytes).map_err(|_| TicketError::InvalidPayload)?;
    if now < payload.issued_at || now > payload.expires_at {
        return Err(TicketError::Expired);
    }
    Ok(payload)
}
