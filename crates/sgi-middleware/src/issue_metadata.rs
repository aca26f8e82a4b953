use anyhow::Result;
use serde::Serialize;
use sgi_core::{format_rfc1123_utc, parse_slack_timestamp_seconds};

use crate::reaction_event::ReactionPayload;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Fields used to file one issue.
///
/// The body is only the permalink; message text and author never leave Slack.
pub struct IssueMetadata {
    pub channel_name: String,
    pub timestamp_seconds: i64,
    pub permalink_url: String,
    pub title: String,
    pub body: String,
}

pub fn build_issue_metadata(
    payload: &ReactionPayload,
    channel_name: &str,
) -> Result<IssueMetadata> {
    let timestamp_seconds = parse_slack_timestamp_seconds(&payload.timestamp)?;
    let date = format_rfc1123_utc(timestamp_seconds)?;
    Ok(IssueMetadata {
        channel_name: channel_name.to_string(),
        timestamp_seconds,
        permalink_url: payload.permalink.clone(),
        title: format!("Update from #{channel_name} at {date}"),
        body: payload.permalink.clone(),
    })
}
