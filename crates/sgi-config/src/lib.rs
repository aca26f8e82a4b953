//! Bot configuration for slack-github-issues.
//!
//! Loads the JSON rule file, validates it and hands out an ordered
//! [`RuleSet`] that the middleware scans first-match-wins.

pub mod bot_config;
pub mod match_rule;

pub use bot_config::{
    load_bot_config, parse_bot_config, BotConfig, DEFAULT_CONFIG_PATH, DEFAULT_TIMEOUT_MS,
};
pub use match_rule::{MatchRule, RuleSet};
