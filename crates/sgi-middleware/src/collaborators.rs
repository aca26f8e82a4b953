//! Seams between the middleware and the outside world.

use anyhow::Result;
use async_trait::async_trait;

use crate::issue_metadata::IssueMetadata;
use crate::reaction_event::ReactionPayload;

#[async_trait]
/// Slack operations the middleware depends on.
pub trait SlackGateway: Send + Sync {
    async fn get_reactions(&self, channel_id: &str, timestamp: &str) -> Result<ReactionPayload>;

    async fn add_reaction(
        &self,
        channel_id: &str,
        timestamp: &str,
        reaction_name: &str,
    ) -> Result<()>;

    /// Maps a channel ID to its name without suspending.
    fn resolve_channel_name(&self, channel_id: &str) -> Result<String>;

    /// Workspace subdomain used to build message permalinks.
    fn resolve_team_domain(&self) -> Result<String>;
}

#[async_trait]
/// Issue filing backend.
pub trait IssueTracker: Send + Sync {
    /// Files a new issue in `repository` and returns its URL.
    async fn file_issue(&self, metadata: &IssueMetadata, repository: &str) -> Result<String>;

    /// Account that owns every repository issues are filed in.
    fn owner(&self) -> &str;
}

#[async_trait]
/// Sends outcome text back to whoever triggered the event.
pub trait Responder: Send + Sync {
    async fn reply(&self, text: &str) -> Result<()>;
}

/// Log sink keyed by message ID.
pub trait MessageLog: Send + Sync {
    fn info(&self, msg_id: Option<&str>, message: &str);
    fn error(&self, msg_id: Option<&str>, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
/// [`MessageLog`] that writes through `tracing`.
pub struct TracingMessageLog;

impl TracingMessageLog {
    pub fn render(msg_id: Option<&str>, message: &str) -> String {
        match msg_id {
            Some(msg_id) => format!("{msg_id}: {message}"),
            None => message.to_string(),
        }
    }
}

impl MessageLog for TracingMessageLog {
    fn info(&self, msg_id: Option<&str>, message: &str) {
        tracing::info!("{}", Self::render(msg_id, message));
    }

    fn error(&self, msg_id: Option<&str>, message: &str) {
        tracing::error!("{}", Self::render(msg_id, message));
    }
}
