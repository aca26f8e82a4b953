//! Slack Events API gateway for slack-github-issues.
//!
//! Receives signed event callbacks over HTTP, answers Slack's URL
//! verification handshake, and hands `reaction_added` events to the
//! middleware on a background task so Slack gets its acknowledgement
//! immediately.

pub mod channel_responder;
pub mod events_server;
pub mod slack_signature;

pub use channel_responder::SlackChannelResponder;
pub use events_server::{
    build_events_router, run_events_server, serve_events, spawn_directory_refresh,
    EventsServerConfig, EventsServerState, HEALTHZ_ENDPOINT, SLACK_EVENTS_ENDPOINT,
};
pub use slack_signature::{verify_slack_signature, SignatureError, SLACK_SIGNATURE_MAX_SKEW_SECONDS};
