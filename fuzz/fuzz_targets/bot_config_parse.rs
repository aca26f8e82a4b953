#![no_main]

use libfuzzer_sys::fuzz_target;
use sgi_config::parse_bot_config;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let Ok(config) = parse_bot_config(&raw) else {
        return;
    };

    assert!(!config.github_user.is_empty());
    assert!(!config.success_reaction.is_empty());
    assert!(!config.rules.is_empty());
    let mut seen_unrestricted = false;
    for rule in &config.rules {
        assert!(!rule.github_repository.contains('/'));
        if rule.is_channel_restricted() {
            assert!(!seen_unrestricted, "restricted rule after unrestricted rule");
        } else {
            seen_unrestricted = true;
        }
    }
});
