//! Slack request signature verification.
//!
//! Slack signs every webhook with
//! `X-Slack-Signature: v0=hex(HMAC-SHA256(signing_secret, "v0:{timestamp}:{body}"))`
//! and sends the timestamp in `X-Slack-Request-Timestamp`.

use axum::http::HeaderMap;
use ring::hmac;

use relay_common::error::AppError;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Requests older than this are treated as replays.
pub const MAX_AGE_SECS: i64 = 60 * 5;

/// Compute the `v0=` signature for a request body.
pub fn sign(signing_secret: &str, timestamp: &str, body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, signing_secret.as_bytes());
    let tag = hmac::sign(&key, &base_string(timestamp, body));
    format!("v0={}", hex::encode(tag.as_ref()))
}

/// Verify the signature headers of an inbound request against `now` (unix seconds).
pub fn verify_request(
    signing_secret: &str,
    headers: &HeaderMap,
    body: &[u8],
    now: i64,
) -> Result<(), AppError> {
    let timestamp = header(headers, TIMESTAMP_HEADER)?;
    let signature = header(headers, SIGNATURE_HEADER)?;

    let sent_at: i64 = timestamp
        .parse()
        .map_err(|_| AppError::Auth("Invalid request timestamp".to_string()))?;
    // Out-of-range timestamps overflow the subtraction and are rejected too.
    match now.checked_sub(sent_at).map(i64::unsigned_abs) {
        Some(age) if age <= MAX_AGE_SECS.unsigned_abs() => {}
        _ => return Err(AppError::Auth("Request timestamp too old".to_string())),
    }

    let tag = signature
        .strip_prefix("v0=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
        .ok_or_else(|| AppError::Auth("Malformed request signature".to_string()))?;

    let key = hmac::Key::new(hmac::HMAC_SHA256, signing_secret.as_bytes());
    hmac::verify(&key, &base_string(timestamp, body), &tag)
        .map_err(|_| AppError::Auth("Request signature mismatch".to_string()))
}

fn base_string(timestamp: &str, body: &[u8]) -> Vec<u8> {
    let mut base = Vec::with_capacity(timestamp.len() + body.len() + 4);
    base.extend_from_slice(b"v0:");
    base.extend_from_slice(timestamp.as_bytes());
    base.push(b':');
    base.extend_from_slice(body);
    base
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Auth(format!("Missing {} header", name)))
}
