use anyhow::Result;
use async_trait::async_trait;
use sgi_middleware::Responder;
use sgi_slack::SlackApiClient;

/// Replies in the reacted message's channel, addressed to the reacting user.
pub struct SlackChannelResponder {
    client: SlackApiClient,
    channel_id: String,
    user_id: String,
}

impl SlackChannelResponder {
    pub fn new(client: SlackApiClient, channel_id: &str, user_id: &str) -> Self {
        Self {
            client,
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    pub fn render_reply(&self, text: &str) -> String {
        if self.user_id.trim().is_empty() {
            text.to_string()
        } else {
            format!("<@{}> {}", self.user_id, text)
        }
    }
}

#[async_trait]
impl Responder for SlackChannelResponder {
    async fn reply(&self, text: &str) -> Result<()> {
        self.client
            .post_message(&self.channel_id, &self.render_reply(text))
            .await?;
        Ok(())
    }
}
