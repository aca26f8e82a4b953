//! Slack Web API client for slack-github-issues.
//!
//! Covers the calls the reaction pipeline makes (`reactions.get`,
//! `reactions.add`, `chat.postMessage`) plus the `team.info` and
//! `conversations.list` lookups that populate the [`SlackDirectory`] cache.

pub mod slack_api_client;
pub mod slack_directory;

pub use slack_api_client::{SlackApiClient, SlackPostedMessage, DEFAULT_SLACK_API_BASE};
pub use slack_directory::SlackDirectory;
