#![no_main]

use libfuzzer_sys::fuzz_target;
use sgi_gateway::{verify_slack_signature, SLACK_SIGNATURE_MAX_SKEW_SECONDS};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let mut parts = raw.splitn(3, '\n');
    let timestamp = parts.next();
    let signature = parts.next();
    let body = parts.next().unwrap_or_default();
    let now = timestamp
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or_default();

    let result = verify_slack_signature(
        "fuzz-signing-secret",
        timestamp,
        signature,
        body.as_bytes(),
        now,
        SLACK_SIGNATURE_MAX_SKEW_SECONDS,
    );
    if result.is_ok() {
        assert!(signature.is_some_and(|value| value.trim().starts_with("v0=")));
    }
});
