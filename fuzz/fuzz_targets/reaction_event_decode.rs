#![no_main]

use libfuzzer_sys::fuzz_target;
use sgi_middleware::ReactionEvent;

fuzz_target!(|data: &[u8]| {
    let Ok(event) = serde_json::from_slice::<ReactionEvent>(data) else {
        return;
    };

    let key = event.processing_key();
    assert!(key.starts_with(event.channel_id()));
    assert!(key.ends_with(event.timestamp()));
    let encoded = serde_json::to_string(&event).expect("event re-encodes");
    let decoded = serde_json::from_str::<ReactionEvent>(&encoded).expect("event decodes");
    assert_eq!(decoded.processing_key(), key);
});
