use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

pub const SLACK_SIGNATURE_MAX_SKEW_SECONDS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Reasons a Slack request signature is rejected.
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("invalid slack request timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("slack request timestamp {timestamp} is outside the {max_skew_seconds}s window")]
    StaleTimestamp { timestamp: u64, max_skew_seconds: u64 },
    #[error("slack signature must use v0=<hex> format")]
    MalformedSignature,
    #[error("slack signature verification failed")]
    Mismatch,
}

/// Checks `signature` against `v0:{timestamp}:{body}` signed with `secret`.
pub fn verify_slack_signature(
    secret: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
    now_unix: u64,
    max_skew_seconds: u64,
) -> Result<(), SignatureError> {
    let timestamp = timestamp
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(SignatureError::MissingHeader("x-slack-request-timestamp"))?;
    let signature = signature
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(SignatureError::MissingHeader("x-slack-signature"))?;

    let timestamp_seconds = timestamp
        .parse::<u64>()
        .map_err(|_| SignatureError::InvalidTimestamp(timestamp.to_string()))?;
    if now_unix.abs_diff(timestamp_seconds) > max_skew_seconds {
        return Err(SignatureError::StaleTimestamp {
            timestamp: timestamp_seconds,
            max_skew_seconds,
        });
    }

    let digest_hex = signature
        .strip_prefix("v0=")
        .ok_or(SignatureError::MalformedSignature)?;
    let signature_bytes = decode_hex(digest_hex)?;

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    mac.verify_slice(&signature_bytes)
        .map_err(|_| SignatureError::Mismatch)
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, SignatureError> {
    if raw.is_empty() || raw.len() % 2 != 0 {
        return Err(SignatureError::MalformedSignature);
    }
    let mut bytes = Vec::with_capacity(raw.len() / 2);
    let mut index = 0usize;
    while index < raw.len() {
        let next = index.saturating_add(2);
        let chunk = raw
            .get(index..next)
            .ok_or(SignatureError::MalformedSignature)?;
        let byte =
            u8::from_str_radix(chunk, 16).map_err(|_| SignatureError::MalformedSignature)?;
        bytes.push(byte);
        index = next;
    }
    Ok(bytes)
}

#[cfg(test)]
pub(crate) fn sign_for_test(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac");
    mac.update(format!("v0:{timestamp}:").as_bytes());
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    let hex = digest
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    format!("v0={hex}")
}
